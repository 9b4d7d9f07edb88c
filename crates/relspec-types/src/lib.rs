//! Shared types for the relspec evaluator.
//!
//! This crate defines the document value model, reference logs, evaluation
//! results and metadata, the `Expandable`/`Evaluator` traits, the execution
//! context, the shared error types, and the path-language AST.

mod context;
mod error;
mod evaluation;
mod reference;
mod span;
mod value;
pub mod ast;
pub mod ops;

pub use context::{CancelHandle, Clock, Context, FixedClock, SystemClock};
pub use error::{EvalError, EvalResult, ParseError, ParseErrors, ReferenceError, MAX_ERRORS};
pub use evaluation::{
    next_depth, Annotation, DynEvaluator, DynExpandable, Evaluation, Evaluator, Expandable,
    Metadata, Step, DEPTH_FULL,
};
pub use reference::{Reference, ReferenceId, ReferenceLog};
pub use span::{SourceText, Span};
pub use value::{format_float, format_time, Map, Value};
