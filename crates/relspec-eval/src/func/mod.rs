//! Function machinery.
//!
//! A [`Descriptor`] turns unevaluated arguments into an [`Invoker`]; the
//! invoker computes the result when the caller asks for it. Functions are
//! looked up by name in a [`Library`] and dispatched with [`call`].

mod args;
mod eager;
mod evaluated;
mod library;

pub use args::{Arguments, KeywordArg, KeywordArgs, PositionalArg, PositionalArgs};
pub use eager::EagerEvaluationDescriptor;
pub use evaluated::{
    evaluated_keyword, evaluated_positional, unresolved_keyword, unresolved_positional,
};
pub use library::Library;

use std::rc::{Rc, Weak};

use relspec_types::{
    Annotation, Context, DynEvaluator, EvalError, EvalResult, Evaluation, ReferenceId, Value,
};
use tracing::debug;

// ══════════════════════════════════════════════════════════════════════════════
// Invokers
// ══════════════════════════════════════════════════════════════════════════════

/// Computes a function's result.
pub trait Invoker<R: ReferenceId> {
    fn invoke(&self, ctx: &Context) -> EvalResult<Evaluation<R>>;
}

pub type DynInvoker<R> = Box<dyn Invoker<R>>;

impl<R, F> Invoker<R> for F
where
    R: ReferenceId,
    F: Fn(&Context) -> EvalResult<Evaluation<R>>,
{
    fn invoke(&self, ctx: &Context) -> EvalResult<Evaluation<R>> {
        self(ctx)
    }
}

/// Yields the same value on every invocation.
#[derive(Debug, Clone)]
pub struct StaticInvoker<R: ReferenceId>(pub Value<R>);

impl<R: ReferenceId> Invoker<R> for StaticInvoker<R> {
    fn invoke(&self, _ctx: &Context) -> EvalResult<Evaluation<R>> {
        Ok(Evaluation::new(self.0.clone()))
    }
}

/// Box a closure as an invoker.
pub fn invoker<R, F>(f: F) -> DynInvoker<R>
where
    R: ReferenceId,
    F: Fn(&Context) -> EvalResult<Evaluation<R>> + 'static,
{
    Box::new(f)
}

// ══════════════════════════════════════════════════════════════════════════════
// Descriptors
// ══════════════════════════════════════════════════════════════════════════════

/// A callable function.
///
/// Each constructor receives the evaluator the function should use for its
/// arguments. A function that only takes one argument shape leaves the
/// other constructor at its default, which rejects the call.
pub trait Descriptor<R: ReferenceId> {
    /// One line describing what the function does.
    fn description(&self) -> &str;

    fn positional_invoker(
        &self,
        _evaluator: DynEvaluator<R>,
        _args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        Err(EvalError::PositionalArgsNotAccepted)
    }

    fn keyword_invoker(
        &self,
        _evaluator: DynEvaluator<R>,
        _args: KeywordArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        Err(EvalError::KeywordArgsNotAccepted)
    }

    /// A copy of this function that calls back into `scope`, for functions
    /// that evaluate expressions of their own. Most functions return `None`.
    fn bind_library(&self, _scope: &Weak<Library<R>>, _eager: bool) -> Option<DynDescriptor<R>> {
        None
    }
}

pub type DynDescriptor<R> = Rc<dyn Descriptor<R>>;

// ── Dispatch ─────────────────────────────────────────────────────────────────

/// Look up `name` and invoke it with `args`.
///
/// Every failure, including an unknown name, is wrapped once as
/// [`EvalError::Invocation`]. An unresolved result is returned as is; its
/// value is the partially evaluated argument container.
pub fn call<R: ReferenceId>(
    ctx: &Context,
    library: &Library<R>,
    evaluator: &DynEvaluator<R>,
    name: &str,
    args: Arguments<R>,
) -> EvalResult<Evaluation<R>> {
    ctx.check()?;
    let descriptor = library.get(name).ok_or_else(|| {
        EvalError::FunctionNotFound {
            name: name.to_string(),
        }
        .in_invocation(name)
    })?;
    debug!(function = name, shape = args.shape(), "invoking function");
    let invoker = match args {
        Arguments::Positional(args) => descriptor.positional_invoker(Rc::clone(evaluator), args),
        Arguments::Keyword(args) => descriptor.keyword_invoker(Rc::clone(evaluator), args),
    }
    .map_err(|e| e.in_invocation(name))?;
    let result = invoker.invoke(ctx).map_err(|e| e.in_invocation(name))?;
    if !result.ok() {
        debug!(function = name, "invocation is unresolved");
    }
    Ok(result.with_annotation(Annotation::invocation(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    struct Answer;

    impl Descriptor<String> for Answer {
        fn description(&self) -> &str {
            "returns 42"
        }

        fn positional_invoker(
            &self,
            _evaluator: DynEvaluator<String>,
            args: PositionalArgs<String>,
        ) -> EvalResult<DynInvoker<String>> {
            args.check_arity(0, false)?;
            Ok(Box::new(StaticInvoker(Value::Int(42))))
        }
    }

    fn library() -> Library<String> {
        let mut library = Library::new();
        library.register("answer", Rc::new(Answer));
        library
    }

    #[test]
    fn test_call_static() {
        let evaluator = Engine::<String>::default().to_dyn();
        let result = call(
            &Context::new(),
            &library(),
            &evaluator,
            "answer",
            Arguments::Positional(PositionalArgs::new(vec![])),
        )
        .unwrap();
        assert_eq!(result.value, Value::Int(42));
        assert_eq!(
            result.metadata.annotation.map(|a| a.name),
            Some("invocation".to_string())
        );
    }

    #[test]
    fn test_call_rejects_keyword_shape() {
        let evaluator = Engine::<String>::default().to_dyn();
        let err = call(
            &Context::new(),
            &library(),
            &evaluator,
            "answer",
            Arguments::Keyword(KeywordArgs::new(Default::default())),
        )
        .unwrap_err();
        assert!(matches!(err.root_cause(), EvalError::KeywordArgsNotAccepted));
        assert!(matches!(err, EvalError::Invocation { ref name, .. } if name == "answer"));
    }

    #[test]
    fn test_call_unknown_function() {
        let evaluator = Engine::<String>::default().to_dyn();
        let err = call(
            &Context::new(),
            &library(),
            &evaluator,
            "missing",
            Arguments::Positional(PositionalArgs::new(vec![])),
        )
        .unwrap_err();
        assert!(matches!(err.root_cause(), EvalError::FunctionNotFound { .. }));
    }

    #[test]
    fn test_closure_invoker() {
        let inv: DynInvoker<String> = invoker(|ctx: &Context| {
            ctx.check()?;
            Ok(Evaluation::new(Value::from("ok")))
        });
        assert_eq!(inv.invoke(&Context::new()).unwrap().value, Value::from("ok"));
    }
}
