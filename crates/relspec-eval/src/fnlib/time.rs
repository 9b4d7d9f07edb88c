//! `now`.

use relspec_types::{Context, DynEvaluator, EvalResult, Evaluation, ReferenceId, Value};

use crate::func::{invoker, Descriptor, DynInvoker, PositionalArgs};

pub(super) struct Now;

impl<R: ReferenceId> Descriptor<R> for Now {
    fn description(&self) -> &str {
        "returns the current time in UTC"
    }

    fn positional_invoker(
        &self,
        _evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(0, false)?;
        Ok(invoker(|ctx: &Context| Ok(Evaluation::new(Value::Time(ctx.now())))))
    }
}
