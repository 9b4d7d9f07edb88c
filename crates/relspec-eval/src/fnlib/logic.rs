//! `coalesce`, `equals`, `notEquals` and `exists`.

use relspec_types::{
    Annotation, Context, DynEvaluator, EvalResult, Evaluation, Metadata, ReferenceId,
    ReferenceLog, Value, DEPTH_FULL,
};

use crate::func::{
    evaluated_positional, invoker, unresolved_positional, Descriptor, DynInvoker, PositionalArgs,
};

// ── coalesce ─────────────────────────────────────────────────────────────────

pub(super) struct Coalesce;

impl<R: ReferenceId> Descriptor<R> for Coalesce {
    fn description(&self) -> &str {
        "returns the first argument that is resolved and not null"
    }

    /// Arguments are evaluated in order and only until one qualifies. The
    /// references of skipped arguments are kept as unused.
    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        Ok(invoker(move |ctx: &Context| {
            let mut skipped = ReferenceLog::new();
            for arg in args.iter() {
                let result = evaluator
                    .evaluate(ctx, &arg.value, DEPTH_FULL)
                    .map_err(|e| e.for_positional_arg(arg.index))?;
                if result.ok() && !result.value.is_null() {
                    let mut metadata = Metadata::default();
                    metadata.merge_references(&skipped);
                    let value = result.value.clone();
                    metadata.add_step(result, vec![Annotation::positional_argument(arg.index)]);
                    return Ok(Evaluation { metadata, value });
                }
                skipped.merge_unused(result.references());
            }
            Ok(Evaluation::with_references(Value::Null, skipped))
        }))
    }
}

// ── equals / notEquals ───────────────────────────────────────────────────────

/// Deep equality without numeric coercion.
pub(super) struct Equals {
    pub(super) negate: bool,
}

impl<R: ReferenceId> Descriptor<R> for Equals {
    fn description(&self) -> &str {
        if self.negate {
            "returns true if its two arguments differ"
        } else {
            "returns true if its two arguments are deeply equal"
        }
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(2, false)?;
        let negate = self.negate;
        Ok(evaluated_positional(evaluator, args, move |_ctx: &Context, values: Vec<Value<R>>| {
            let equal = values[0].strict_eq(&values[1]);
            Ok(Evaluation::new(Value::Bool(equal != negate)))
        }))
    }
}

// ── exists ───────────────────────────────────────────────────────────────────

pub(super) struct Exists;

impl<R: ReferenceId> Descriptor<R> for Exists {
    fn description(&self) -> &str {
        "returns true if its argument resolves to a value other than null"
    }

    /// A traversal that finds nothing is `false` with an empty reference
    /// log. Any other failure propagates.
    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(1, false)?;
        Ok(invoker(move |ctx: &Context| {
            let Some(arg) = args.get(0) else {
                return Ok(Evaluation::new(Value::Bool(false)));
            };
            match evaluator.evaluate(ctx, &arg.value, DEPTH_FULL) {
                Ok(result) if result.ok() => {
                    let exists = !result.value.is_null();
                    Ok(Evaluation::with_references(
                        Value::Bool(exists),
                        result.metadata.references,
                    ))
                }
                Ok(result) => {
                    let mut metadata = Metadata::default();
                    let value = result.value.clone();
                    metadata.add_step(result, vec![Annotation::positional_argument(0)]);
                    Ok(unresolved_positional(vec![value], metadata))
                }
                Err(e) if e.is_not_exists() => Ok(Evaluation::new(Value::Bool(false))),
                Err(e) => Err(e.for_positional_arg(0)),
            }
        }))
    }
}
