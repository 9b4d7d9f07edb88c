//! `concat`, `toString`, `jsonMarshal` and `jsonUnmarshal`.

use relspec_types::{Context, DynEvaluator, EvalError, EvalResult, Evaluation, ReferenceId, Value};

use crate::func::{evaluated_positional, Descriptor, DynInvoker, PositionalArgs};

pub(super) struct Concat;

impl<R: ReferenceId> Descriptor<R> for Concat {
    fn description(&self) -> &str {
        "joins the string forms of its arguments"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        Ok(evaluated_positional(evaluator, args, |_ctx: &Context, values: Vec<Value<R>>| {
            let mut out = String::new();
            for (i, value) in values.iter().enumerate() {
                let s = value
                    .to_template_string()
                    .map_err(|e| e.for_positional_arg(i))?;
                out.push_str(&s);
            }
            Ok(Evaluation::new(Value::String(out)))
        }))
    }
}

pub(super) struct Stringify;

impl<R: ReferenceId> Descriptor<R> for Stringify {
    fn description(&self) -> &str {
        "converts a scalar to its string form"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(1, false)?;
        Ok(evaluated_positional(evaluator, args, |_ctx: &Context, values: Vec<Value<R>>| {
            let s = values[0]
                .to_template_string()
                .map_err(|e| e.for_positional_arg(0))?;
            Ok(Evaluation::new(Value::String(s)))
        }))
    }
}

pub(super) struct JsonMarshal;

impl<R: ReferenceId> Descriptor<R> for JsonMarshal {
    fn description(&self) -> &str {
        "encodes its argument as JSON text"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(1, false)?;
        Ok(evaluated_positional(evaluator, args, |_ctx: &Context, values: Vec<Value<R>>| {
            let json = values[0].to_json().map_err(|e| e.for_positional_arg(0))?;
            let text = serde_json::to_string(&json).map_err(EvalError::from)?;
            Ok(Evaluation::new(Value::String(text)))
        }))
    }
}

pub(super) struct JsonUnmarshal;

impl<R: ReferenceId> Descriptor<R> for JsonUnmarshal {
    fn description(&self) -> &str {
        "parses JSON text into a value"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(1, false)?;
        Ok(evaluated_positional(evaluator, args, |_ctx: &Context, values: Vec<Value<R>>| {
            let text = match &values[0] {
                Value::String(s) => s.as_bytes(),
                Value::Bytes(b) => b.as_slice(),
                other => {
                    return Err(EvalError::unexpected_type(&["string", "bytes"], other.type_name())
                        .for_positional_arg(0))
                }
            };
            let json: serde_json::Value = serde_json::from_slice(text)
                .map_err(|e| EvalError::from(e).for_positional_arg(0))?;
            Ok(Evaluation::new(Value::from(json)))
        }))
    }
}
