//! JSONPath over documents with reserved forms.
//!
//! [`EvaluatingVisitor`] evaluates every value one level deep before the
//! JSONPath engine indexes into it, and fully before it is returned, so
//! typed references and invocations resolve as traversal proceeds.

use std::cell::RefCell;

use relspec_jsonpath::{JsonPath, JsonPathError, JsonPathResult, JsonPathTemplate, VariableVisitor};
use relspec_types::{
    Annotation, Context, DynEvaluator, EvalResult, Evaluation, ReferenceId, ReferenceLog, Value,
    DEPTH_FULL,
};

/// Traverses through an evaluator and records what it touched.
pub struct EvaluatingVisitor<'a, R: ReferenceId> {
    ctx: &'a Context,
    evaluator: &'a DynEvaluator<R>,
    references: RefCell<ReferenceLog<R>>,
}

impl<'a, R: ReferenceId> EvaluatingVisitor<'a, R> {
    pub fn new(ctx: &'a Context, evaluator: &'a DynEvaluator<R>) -> Self {
        Self {
            ctx,
            evaluator,
            references: RefCell::new(ReferenceLog::new()),
        }
    }

    /// Everything observed so far.
    pub fn into_references(self) -> ReferenceLog<R> {
        self.references.into_inner()
    }

    fn evaluate(&self, value: &Value<R>, depth: i32) -> JsonPathResult<Value<R>> {
        let result = self.evaluator.evaluate(self.ctx, value, depth)?;
        self.references.borrow_mut().merge(result.references());
        if !result.ok() {
            return Err(JsonPathError::Unresolved);
        }
        Ok(result.value)
    }
}

impl<R: ReferenceId> VariableVisitor<R> for EvaluatingVisitor<'_, R> {
    fn resolve(&self, value: &Value<R>) -> JsonPathResult<Value<R>> {
        self.evaluate(value, 1)
    }

    fn visit_value(&self, value: Value<R>) -> JsonPathResult<Value<R>> {
        self.evaluate(&value, DEPTH_FULL)
    }
}

/// Evaluate `path` against `root`.
///
/// A traversal blocked by unresolved references yields `null` with the
/// references that blocked it.
pub fn evaluate_jsonpath<R: ReferenceId>(
    ctx: &Context,
    evaluator: &DynEvaluator<R>,
    path: &JsonPath,
    root: &Value<R>,
) -> EvalResult<Evaluation<R>> {
    let visitor = EvaluatingVisitor::new(ctx, evaluator);
    let result = path.evaluate_with(root, &visitor);
    let references = visitor.into_references();
    let value = match result {
        Ok(value) => value,
        Err(JsonPathError::Unresolved) => Value::Null,
        Err(e) => return Err(e.into()),
    };
    Ok(Evaluation::with_references(value, references)
        .with_annotation(Annotation::expression("jsonpath", path.source())))
}

/// Render `template` against `root`.
///
/// A template blocked by unresolved references renders as its own text.
pub fn render_jsonpath_template<R: ReferenceId>(
    ctx: &Context,
    evaluator: &DynEvaluator<R>,
    template: &JsonPathTemplate,
    root: &Value<R>,
) -> EvalResult<Evaluation<R>> {
    let visitor = EvaluatingVisitor::new(ctx, evaluator);
    let result = template.render_with(root, &visitor);
    let references = visitor.into_references();
    let text = match result {
        Ok(text) => text,
        Err(JsonPathError::Unresolved) => template.source().to_string(),
        Err(e) => return Err(e.into()),
    };
    Ok(Evaluation::with_references(Value::String(text), references)
        .with_annotation(Annotation::expression("jsonpath-template", template.source())))
}
