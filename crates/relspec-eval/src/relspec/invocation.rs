//! `{"$fn.<name>": args}` invocations.

use relspec_types::{Context, DynEvaluator, EvalResult, Evaluation, Map, Metadata, ReferenceId, Value};

use crate::func::{call, Arguments, KeywordArgs, Library, PositionalArgs};
use crate::pathlang::settle;

pub const FUNCTION_PREFIX: &str = "$fn.";

/// The invocation key, function name and argument of `map`, if it is an
/// invocation.
pub(super) fn invocation<R: ReferenceId>(map: &Map<R>) -> Option<(&str, &str, &Value<R>)> {
    if map.len() != 1 {
        return None;
    }
    let (key, args) = map.iter().next()?;
    let name = key.strip_prefix(FUNCTION_PREFIX)?;
    Some((key.as_str(), name, args))
}

/// Invoke `name` with `args`.
///
/// The argument is evaluated one level to choose the call shape: a list is
/// positional, a map keyword, anything else a single positional argument.
/// An unresolved invocation evaluates to the invocation mapping again, with
/// whatever the function managed to evaluate substituted in.
pub(super) fn resolve_invocation<R: ReferenceId>(
    ctx: &Context,
    library: &Library<R>,
    key: &str,
    name: &str,
    args: &Value<R>,
    depth: i32,
    next: &DynEvaluator<R>,
) -> EvalResult<Evaluation<R>> {
    let shape = next.evaluate(ctx, args, 1).map_err(|e| e.at_path(key))?;
    let resolved_shape = shape.ok();
    let arguments = if !resolved_shape {
        Arguments::Positional(PositionalArgs::new(vec![args.clone()]))
    } else {
        match &shape.value {
            Value::List(items) => Arguments::Positional(PositionalArgs::new(items.clone())),
            Value::Map(map) => Arguments::Keyword(KeywordArgs::new(map.clone())),
            other => Arguments::Positional(PositionalArgs::new(vec![other.clone()])),
        }
    };
    let keyword = matches!(arguments, Arguments::Keyword(_));

    let mut metadata = Metadata::default();
    metadata.add_step(shape, Vec::new());
    let result = call(ctx, library, next, name, arguments)?;
    if !result.ok() {
        let partial = match (&result.value, resolved_shape, keyword) {
            (Value::List(items), false, _) if items.len() == 1 => items[0].clone(),
            (Value::List(_), true, false) | (Value::Map(_), true, true) => result.value.clone(),
            _ => args.clone(),
        };
        metadata.annotation = result.metadata.annotation.clone();
        metadata.add_step(result, Vec::new());
        return Ok(Evaluation {
            metadata,
            value: Value::map([(key, partial)]),
        });
    }

    let settled = settle(ctx, next, result, depth)?;
    let value = settled.value.clone();
    metadata.annotation = settled.metadata.annotation.clone();
    metadata.add_step(settled, Vec::new());
    Ok(Evaluation { metadata, value })
}
