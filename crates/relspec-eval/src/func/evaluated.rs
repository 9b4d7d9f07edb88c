//! Invokers that fully evaluate their arguments before running a body.

use relspec_types::{
    Annotation, Context, DynEvaluator, EvalResult, Evaluation, Map, Metadata, ReferenceId, Value,
    DEPTH_FULL,
};

use super::args::{KeywordArgs, PositionalArgs};
use super::{invoker, DynInvoker};

/// Evaluate every positional argument, then run `body` on the values.
///
/// If any argument is unresolved, the body is skipped and the invocation
/// yields the partially evaluated argument list with its references.
pub fn evaluated_positional<R, F>(
    evaluator: DynEvaluator<R>,
    args: PositionalArgs<R>,
    body: F,
) -> DynInvoker<R>
where
    R: ReferenceId,
    F: Fn(&Context, Vec<Value<R>>) -> EvalResult<Evaluation<R>> + 'static,
{
    invoker(move |ctx: &Context| {
        let mut metadata = Metadata::default();
        let mut values = Vec::with_capacity(args.len());
        for arg in args.iter() {
            let result = evaluator
                .evaluate(ctx, &arg.value, DEPTH_FULL)
                .map_err(|e| e.for_positional_arg(arg.index))?;
            values.push(result.value.clone());
            metadata.add_step(result, vec![Annotation::positional_argument(arg.index)]);
        }
        if !metadata.references.ok() {
            return Ok(unresolved_positional(values, metadata));
        }
        Ok(prepend(metadata, body(ctx, values)?))
    })
}

/// Evaluate every keyword argument, then run `body` on the values.
pub fn evaluated_keyword<R, F>(
    evaluator: DynEvaluator<R>,
    args: KeywordArgs<R>,
    body: F,
) -> DynInvoker<R>
where
    R: ReferenceId,
    F: Fn(&Context, Map<R>) -> EvalResult<Evaluation<R>> + 'static,
{
    invoker(move |ctx: &Context| {
        let mut metadata = Metadata::default();
        let mut values = Map::new();
        for arg in args.iter() {
            let result = evaluator
                .evaluate(ctx, &arg.value, DEPTH_FULL)
                .map_err(|e| e.for_keyword_arg(arg.name.clone()))?;
            values.insert(arg.name.clone(), result.value.clone());
            metadata.add_step(result, vec![Annotation::keyword_argument(&arg.name)]);
        }
        if !metadata.references.ok() {
            return Ok(unresolved_keyword(values, metadata));
        }
        Ok(prepend(metadata, body(ctx, values)?))
    })
}

/// The placeholder result of an invocation whose positional arguments are
/// not all available.
pub fn unresolved_positional<R: ReferenceId>(
    values: Vec<Value<R>>,
    metadata: Metadata<R>,
) -> Evaluation<R> {
    Evaluation {
        metadata,
        value: Value::List(values),
    }
}

/// The keyword counterpart of [`unresolved_positional`].
pub fn unresolved_keyword<R: ReferenceId>(values: Map<R>, metadata: Metadata<R>) -> Evaluation<R> {
    Evaluation {
        metadata,
        value: Value::Map(values),
    }
}

/// Put the argument steps in front of the body's own.
fn prepend<R: ReferenceId>(mut args: Metadata<R>, mut result: Evaluation<R>) -> Evaluation<R> {
    result.metadata.merge_references(&args.references);
    args.steps.append(&mut result.metadata.steps);
    result.metadata.steps = args.steps;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::expandable::StaticExpandable;
    use relspec_types::{Reference, ReferenceLog};
    use std::rc::Rc;

    fn pending(id: &str) -> Value<String> {
        let log: ReferenceLog<String> = [Reference::observed(id.to_string())].into_iter().collect();
        Value::Expandable(Rc::new(StaticExpandable::new(Evaluation::with_references(
            Value::from(format!("<{id}>")),
            log,
        ))))
    }

    fn sum(_ctx: &Context, values: Vec<Value<String>>) -> EvalResult<Evaluation<String>> {
        let total = values.iter().filter_map(|v| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        });
        Ok(Evaluation::new(Value::Int(total.sum())))
    }

    #[test]
    fn test_body_runs_when_resolved() {
        let evaluator = Engine::<String>::default().to_dyn();
        let args = PositionalArgs::new(vec![Value::Int(1), Value::Int(2)]);
        let result = evaluated_positional(evaluator, args, sum)
            .invoke(&Context::new())
            .unwrap();
        assert_eq!(result.value, Value::Int(3));
        assert_eq!(result.metadata.steps.len(), 2);
    }

    #[test]
    fn test_unresolved_argument_skips_body() {
        let evaluator = Engine::<String>::default().to_dyn();
        let args = PositionalArgs::new(vec![Value::Int(1), pending("x")]);
        let result = evaluated_positional(evaluator, args, sum)
            .invoke(&Context::new())
            .unwrap();
        assert!(!result.ok());
        assert_eq!(
            result.value,
            Value::List(vec![Value::Int(1), Value::from("<x>")])
        );
        assert!(result.references().get(&"x".to_string()).is_some());
    }
}
