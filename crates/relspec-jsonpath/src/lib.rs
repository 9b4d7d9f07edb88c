//! JSONPath over relspec values.
//!
//! Two surfaces share one expression language:
//!
//! - [`JsonPath`]: `$.store.book[?(@.price < 10)].title` and friends.
//! - [`JsonPathTemplate`]: kubectl-style text with `{…}` actions and
//!   `{range …}…{end}` loops.
//!
//! Evaluation goes through a [`VariableVisitor`], which decides how each
//! value is prepared before it is traversed.

pub mod ast;
mod error;
mod eval;
mod lexer;
mod options;
mod parser;
mod template;
mod visitor;

pub use error::{JsonPathError, JsonPathResult};
pub use options::JsonPathOptions;
pub use parser::MAX_NESTING;
pub use template::{format_value, JsonPathTemplate};
pub use visitor::{
    children, select_child, select_range, DefaultVariableVisitor, PathKey, PathValue,
    VariableVisitor,
};

use relspec_types::{ReferenceId, Value};

use crate::ast::Expr;
use crate::eval::Evaluator;

/// A parsed JSONPath expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    source: String,
    expr: Expr,
    options: JsonPathOptions,
}

impl JsonPath {
    pub fn parse(source: &str) -> JsonPathResult<Self> {
        Self::parse_with(source, JsonPathOptions::default())
    }

    pub fn parse_with(source: &str, options: JsonPathOptions) -> JsonPathResult<Self> {
        let expr = parser::parse(source, &options)?;
        Ok(Self {
            source: source.to_string(),
            expr,
            options,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn options(&self) -> &JsonPathOptions {
        &self.options
    }

    /// Evaluate against plain values.
    pub fn evaluate<R: ReferenceId>(&self, root: &Value<R>) -> JsonPathResult<Value<R>> {
        self.evaluate_with(root, &DefaultVariableVisitor)
    }

    /// Evaluate, traversing through `visitor`.
    ///
    /// Multi-match paths produce a list; single-match paths produce the
    /// value itself, or `null` when missing keys were pruned.
    pub fn evaluate_with<R, V>(&self, root: &Value<R>, visitor: &V) -> JsonPathResult<Value<R>>
    where
        R: ReferenceId,
        V: VariableVisitor<R> + ?Sized,
    {
        Evaluator::new(visitor, root, &self.options).eval(&self.expr, root)
    }
}

/// Parse and evaluate in one step.
pub fn query<R: ReferenceId>(source: &str, root: &Value<R>) -> JsonPathResult<Value<R>> {
    JsonPath::parse(source)?.evaluate(root)
}
