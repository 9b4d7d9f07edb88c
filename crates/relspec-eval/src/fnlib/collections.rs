//! `append` and `merge`.

use relspec_types::{
    Context, DynEvaluator, EvalError, EvalResult, Evaluation, Map, ReferenceId, Value,
};

use super::{map_arg, string_arg};
use crate::func::{
    evaluated_keyword, evaluated_positional, Descriptor, DynInvoker, KeywordArgs, PositionalArgs,
};

// ── append ───────────────────────────────────────────────────────────────────

pub(super) struct Append;

impl<R: ReferenceId> Descriptor<R> for Append {
    fn description(&self) -> &str {
        "returns a new list with the remaining arguments added to the end of the first"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(2, true)?;
        Ok(evaluated_positional(evaluator, args, append))
    }
}

fn append<R: ReferenceId>(_ctx: &Context, values: Vec<Value<R>>) -> EvalResult<Evaluation<R>> {
    let mut values = values.into_iter();
    let mut out = match values.next() {
        Some(Value::List(items)) => items,
        Some(other) => {
            return Err(
                EvalError::unexpected_type(&["list"], other.type_name()).for_positional_arg(0)
            )
        }
        None => Vec::new(),
    };
    out.extend(values);
    Ok(Evaluation::new(Value::List(out)))
}

// ── merge ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeMode {
    Deep,
    Shallow,
}

impl MergeMode {
    fn parse(s: &str) -> EvalResult<Self> {
        match s {
            "deep" => Ok(MergeMode::Deep),
            "shallow" => Ok(MergeMode::Shallow),
            other => Err(EvalError::InvalidValue {
                value: other.to_string(),
                wanted: vec!["deep".to_string(), "shallow".to_string()],
            }),
        }
    }
}

pub(super) struct Merge;

impl<R: ReferenceId> Descriptor<R> for Merge {
    fn description(&self) -> &str {
        "combines maps from left to right, later keys winning"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        Ok(evaluated_positional(evaluator, args, |_ctx: &Context, values: Vec<Value<R>>| {
            let mut out = Map::new();
            for (i, value) in values.iter().enumerate() {
                if value.is_null() {
                    continue;
                }
                let map = map_arg(value).map_err(|e| e.for_positional_arg(i))?;
                merge_into(&mut out, map, MergeMode::Deep);
            }
            Ok(Evaluation::new(Value::Map(out)))
        }))
    }

    fn keyword_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: KeywordArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_names(&["objects", "mode"])?;
        args.require("objects")?;
        Ok(evaluated_keyword(evaluator, args, |_ctx: &Context, values: Map<R>| {
            let mode = match values.get("mode") {
                None | Some(Value::Null) => MergeMode::Deep,
                Some(value) => string_arg(value)
                    .and_then(MergeMode::parse)
                    .map_err(|e| e.for_keyword_arg("mode"))?,
            };
            let objects: &[Value<R>] = match values.get("objects") {
                Some(Value::List(items)) => items.as_slice(),
                Some(Value::Null) | None => &[],
                Some(other) => {
                    return Err(EvalError::unexpected_type(&["list"], other.type_name())
                        .for_keyword_arg("objects"))
                }
            };
            let mut out = Map::new();
            for (i, value) in objects.iter().enumerate() {
                if value.is_null() {
                    continue;
                }
                let map = map_arg(value)
                    .map_err(|e| e.at_path(i.to_string()).for_keyword_arg("objects"))?;
                merge_into(&mut out, map, mode);
            }
            Ok(Evaluation::new(Value::Map(out)))
        }))
    }
}

/// Merge `src` into `dst`. In deep mode, maps present on both sides are
/// merged recursively; everything else is replaced.
fn merge_into<R: ReferenceId>(dst: &mut Map<R>, src: &Map<R>, mode: MergeMode) {
    for (key, value) in src {
        match (mode, dst.get_mut(key), value) {
            (MergeMode::Deep, Some(Value::Map(existing)), Value::Map(incoming)) => {
                merge_into(existing, incoming, mode);
            }
            _ => {
                dst.insert(key.clone(), value.clone());
            }
        }
    }
}
