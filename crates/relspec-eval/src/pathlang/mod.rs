//! The path expression language.
//!
//! Expressions select from a root value (`foo.bar[0]`, `$.x`), combine
//! values with operators, call library functions and pipe results into
//! further expressions (`jsonUnmarshal(s) |> x.y`). Templates embed
//! expressions in text as `${…}`.
//!
//! Parsing lives in `relspec-parser`; this module evaluates the AST against
//! a root through a caller-supplied evaluator.

mod eval;
mod template;

pub use template::PathTemplate;

pub(crate) use eval::settle;

use std::rc::Rc;

use relspec_types::ast::Expr;
use relspec_types::{
    Annotation, Context, DynEvaluator, EvalError, EvalResult, Evaluation, ParseErrors,
    ReferenceId, Value, DEPTH_FULL,
};

use crate::func::Library;

use eval::Scope;

/// Evaluation settings for path expressions.
pub struct PathLanguage<R: ReferenceId> {
    library: Rc<Library<R>>,
    eager: bool,
}

impl<R: ReferenceId> Clone for PathLanguage<R> {
    fn clone(&self) -> Self {
        Self {
            library: Rc::clone(&self.library),
            eager: self.eager,
        }
    }
}

impl<R: ReferenceId> Default for PathLanguage<R> {
    fn default() -> Self {
        Self::new(Rc::new(Library::standard()))
    }
}

impl<R: ReferenceId> PathLanguage<R> {
    pub fn new(library: Rc<Library<R>>) -> Self {
        Self {
            library,
            eager: false,
        }
    }

    /// Evaluate both sides of `&&`/`||` even when one decides the outcome.
    pub fn with_eager_evaluation(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    pub fn library(&self) -> &Library<R> {
        &self.library
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Evaluate `expr` against `root`, walking the result to `depth`.
    pub fn evaluate(
        &self,
        ctx: &Context,
        expr: &Expr,
        root: &Value<R>,
        evaluator: &DynEvaluator<R>,
        depth: i32,
    ) -> EvalResult<Evaluation<R>> {
        Scope {
            language: self,
            ctx,
            evaluator,
            root,
        }
        .eval(expr, depth)
    }

    /// Evaluate `expr` one level deep.
    pub fn eval_shallow(
        &self,
        ctx: &Context,
        expr: &Expr,
        root: &Value<R>,
        evaluator: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        self.evaluate(ctx, expr, root, evaluator, 1)
    }

    /// Evaluate `expr` until only scalars remain.
    pub fn eval_full(
        &self,
        ctx: &Context,
        expr: &Expr,
        root: &Value<R>,
        evaluator: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        self.evaluate(ctx, expr, root, evaluator, DEPTH_FULL)
    }

    /// Parse and fully evaluate an expression.
    pub fn evaluate_source(
        &self,
        ctx: &Context,
        source: &str,
        root: &Value<R>,
        evaluator: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        let expr = parse_expression(source)?;
        Ok(self
            .eval_full(ctx, &expr, root, evaluator)?
            .with_annotation(Annotation::expression("path", source)))
    }

    pub fn evaluate_template(
        &self,
        ctx: &Context,
        template: &PathTemplate,
        root: &Value<R>,
        evaluator: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        template.evaluate(&Scope {
            language: self,
            ctx,
            evaluator,
            root,
        })
    }
}

/// Parse a path expression.
pub fn parse_expression(source: &str) -> EvalResult<Expr> {
    relspec_parser::parse_expression(source).map_err(parse_error)
}

fn parse_error(errors: ParseErrors) -> EvalError {
    EvalError::Parse {
        language: "path".to_string(),
        message: errors.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use serde_json::json;

    fn eval(source: &str, root: serde_json::Value) -> EvalResult<Value<String>> {
        let evaluator = Engine::<String>::default().to_dyn();
        PathLanguage::default()
            .evaluate_source(&Context::new(), source, &Value::from(root), &evaluator)
            .map(|r| r.value)
    }

    #[test]
    fn test_variables_and_selection() {
        let root = json!({"a": {"b": [10, 20, 30]}, "k": "b"});
        assert_eq!(eval("a.b.1", root.clone()).unwrap(), Value::Int(20));
        assert_eq!(eval("a[k][2]", root.clone()).unwrap(), Value::Int(30));
        assert_eq!(eval("$.a.'b'.0", root).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_selection_errors() {
        let root = json!({"a": [1], "s": "x"});
        assert!(matches!(eval("b", root.clone()), Err(EvalError::UnknownKey { .. })));
        assert!(matches!(
            eval("a.3", root.clone()),
            Err(EvalError::IndexOutOfBounds { index: 3, len: 1 })
        ));
        assert!(matches!(
            eval("a['x']", root.clone()),
            Err(EvalError::UnexpectedStringIndex { .. })
        ));
        assert!(matches!(
            eval("a[true]", root.clone()),
            Err(EvalError::UnexpectedIndexType { .. })
        ));
        assert!(matches!(eval("s.x", root), Err(EvalError::UnsupportedValueType { .. })));
    }

    #[test]
    fn test_operators() {
        let root = json!({"n": 7});
        assert_eq!(eval("n * 2 + 1", root.clone()).unwrap(), Value::Int(15));
        assert_eq!(eval("n % 4 == 3", root.clone()).unwrap(), Value::Bool(true));
        assert_eq!(eval("'a' + n", root.clone()).unwrap(), Value::from("a7"));
        assert_eq!(eval("n << 2 | 1", root.clone()).unwrap(), Value::Int(29));
        assert_eq!(eval("'abc' =~ '^a'", root.clone()).unwrap(), Value::Bool(true));
        assert_eq!(eval("'abc' !~ 'z'", root.clone()).unwrap(), Value::Bool(true));
        assert_eq!(eval("!(n > 3) || n <= 7", root).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_bad_regex() {
        assert!(matches!(eval("'a' =~ '('", json!({})), Err(EvalError::Regex { .. })));
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            eval("[1, 'two', {'k': null}]", json!({})).unwrap(),
            Value::from(json!([1, "two", {"k": null}]))
        );
    }

    #[test]
    fn test_pipe_rebinds_root() {
        assert_eq!(
            eval(r#"jsonUnmarshal('{"x":{"y":"z"}}') |> x.y"#, json!({})).unwrap(),
            Value::from("z")
        );
    }

    #[test]
    fn test_parse_error_names_language() {
        let err = eval("a.", json!({})).unwrap_err();
        assert!(matches!(err, EvalError::Parse { ref language, .. } if language == "path"));
    }

    #[test]
    fn test_template_keeps_sole_type() {
        let evaluator = Engine::<String>::default().to_dyn();
        let root = Value::from(json!({"n": 3, "s": "x"}));
        let lang = PathLanguage::<String>::default();
        let ctx = Context::new();

        let sole = PathTemplate::parse("${n}").unwrap();
        let result = lang.evaluate_template(&ctx, &sole, &root, &evaluator).unwrap();
        assert_eq!(result.value, Value::Int(3));

        let mixed = PathTemplate::parse("${s}-${n}").unwrap();
        let result = lang.evaluate_template(&ctx, &mixed, &root, &evaluator).unwrap();
        assert_eq!(result.value, Value::from("x-3"));
    }
}
