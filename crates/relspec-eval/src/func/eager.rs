//! Eager evaluation of function arguments.

use relspec_types::{
    Context, DynEvaluator, EvalResult, Evaluation, ReferenceId, ReferenceLog, Value, DEPTH_FULL,
};

use super::args::{KeywordArgs, PositionalArgs};
use super::{invoker, Descriptor, DynDescriptor, DynInvoker};

/// Wraps a descriptor so every argument is evaluated before the body runs.
///
/// The references found this way are merged as unused, so a caller sees
/// everything a call could depend on even when the body short-circuits.
/// Failures of the pre-evaluation are left for the body to report.
pub struct EagerEvaluationDescriptor<R: ReferenceId> {
    inner: DynDescriptor<R>,
}

impl<R: ReferenceId> EagerEvaluationDescriptor<R> {
    pub fn new(inner: DynDescriptor<R>) -> Self {
        Self { inner }
    }
}

impl<R: ReferenceId> Descriptor<R> for EagerEvaluationDescriptor<R> {
    fn description(&self) -> &str {
        self.inner.description()
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        let container = args.to_value();
        let inner = self.inner.positional_invoker(evaluator.clone(), args)?;
        Ok(eager(evaluator, container, inner))
    }

    fn keyword_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: KeywordArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        let container = args.to_value();
        let inner = self.inner.keyword_invoker(evaluator.clone(), args)?;
        Ok(eager(evaluator, container, inner))
    }
}

fn eager<R: ReferenceId>(
    evaluator: DynEvaluator<R>,
    container: Value<R>,
    inner: DynInvoker<R>,
) -> DynInvoker<R> {
    invoker(move |ctx: &Context| {
        let observed = match evaluator.evaluate(ctx, &container, DEPTH_FULL) {
            Ok(pre) => pre.metadata.references,
            Err(e) if e.is_canceled() => return Err(e),
            Err(_) => ReferenceLog::new(),
        };
        let mut result: Evaluation<R> = inner.invoke(ctx)?;
        result.metadata.references.merge_unused(&observed);
        Ok(result)
    })
}
