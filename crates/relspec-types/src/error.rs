//! Error types shared by every evaluation stage.
//!
//! Parse failures are collected as [`ParseError`]s (with spans, so callers can
//! point at the offending fragment); everything that happens while walking a
//! document surfaces as an [`EvalError`].

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Maximum number of parse errors reported before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// An error produced by a caller-supplied resolver and carried in a
/// [`Reference`](crate::Reference).
pub type ReferenceError = Arc<dyn std::error::Error + Send + Sync>;

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

// ══════════════════════════════════════════════════════════════════════════════
// Parse errors
// ══════════════════════════════════════════════════════════════════════════════

/// A structured parse error for the path expression and template languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Source location.
    pub span: Span,
    /// The source line containing the error.
    pub source_line: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span, source_line: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse errors collected by the lexer and parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseErrors {
    pub errors: Vec<ParseError>,
    pub total_errors: usize,
}

impl ParseErrors {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the [`MAX_ERRORS`] limit.
    pub fn push_error(&mut self, error: ParseError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append every error from `other`.
    pub fn extend(&mut self, other: ParseErrors) {
        for error in other.errors {
            self.push_error(error);
        }
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        if self.total_errors > self.errors.len() {
            write!(f, " (and {} more)", self.total_errors - self.errors.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ══════════════════════════════════════════════════════════════════════════════
// Evaluation errors
// ══════════════════════════════════════════════════════════════════════════════

/// Everything that can go wrong while evaluating a document.
///
/// Unresolvable references are never errors: they are recorded in the
/// reference log of an otherwise successful evaluation.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    // ── Driver ───────────────────────────────────────────────────────────

    /// A value that is neither JSON-compatible nor an expandable.
    #[error("unsupported value of type {type_name}")]
    UnsupportedValue { type_name: String },

    /// An error raised while evaluating a child of a list or map.
    #[error("{path}: {cause}")]
    PathEvaluation { path: String, cause: Box<EvalError> },

    // ── Functions ────────────────────────────────────────────────────────

    /// A function lookup or invocation failed.
    #[error("invocation of function {name:?} failed: {cause}")]
    Invocation { name: String, cause: Box<EvalError> },

    #[error("function {name:?} not found")]
    FunctionNotFound { name: String },

    #[error("argument {name:?} not found")]
    ArgNotFound { name: String },

    #[error("function does not accept positional arguments")]
    PositionalArgsNotAccepted,

    #[error("function does not accept keyword arguments")]
    KeywordArgsNotAccepted,

    /// Wraps a failure attributed to a positional argument. `arg` is zero-based.
    #[error("argument {}: {cause}", one_based(.arg))]
    PositionalArg { arg: usize, cause: Box<EvalError> },

    #[error("argument {arg:?}: {cause}")]
    KeywordArg { arg: String, cause: Box<EvalError> },

    #[error("{}", arity_message(.wanted, .variadic, .got))]
    Arity {
        wanted: usize,
        variadic: bool,
        got: usize,
    },

    #[error("unexpected type {got} (wanted {})", .wanted.join(" or "))]
    UnexpectedType { wanted: Vec<String>, got: String },

    #[error("conversion to {to:?} is not supported")]
    ConvertTypeNotSupported { to: String },

    #[error("invalid value {value:?} (wanted {})", .wanted.join(" or "))]
    InvalidValue { value: String, wanted: Vec<String> },

    #[error("integer division by zero")]
    DivisionByZero,

    // ── Traversal ("not-exists") ─────────────────────────────────────────

    #[error("unknown key {key:?}")]
    UnknownKey { key: String },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("cannot traverse into a value of type {type_name}")]
    UnsupportedValueType { type_name: String },

    #[error("unexpected string index {index:?} for a list")]
    UnexpectedStringIndex { index: String },

    #[error("unexpected index of type {type_name}")]
    UnexpectedIndexType { type_name: String },

    #[error("unexpected key of type {type_name}")]
    UnexpectedKeyType { type_name: String },

    // ── Tagged forms ─────────────────────────────────────────────────────

    #[error("could not resolve mapping of type {type_name:?}: {cause}")]
    InvalidType { type_name: String, cause: Box<EvalError> },

    #[error("could not decode data with encoding {encoding:?}: {cause}")]
    InvalidEncoding { encoding: String, cause: Box<EvalError> },

    #[error("unknown encoding {encoding:?}")]
    UnknownEncoding { encoding: String },

    #[error("decoding failed: {message}")]
    Decode { message: String },

    // ── Languages ────────────────────────────────────────────────────────

    #[error("{language} parse error: {message}")]
    Parse { language: String, message: String },

    #[error("{language} evaluation error: {message}")]
    Query { language: String, message: String },

    #[error("JSON error: {message}")]
    Json { message: String },

    #[error("invalid regular expression: {message}")]
    Regex { message: String },

    /// A failure reported by a caller-supplied collaborator.
    #[error("{0}")]
    External(ReferenceError),

    // ── Cancellation ─────────────────────────────────────────────────────

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

fn one_based(arg: &usize) -> usize {
    arg + 1
}

fn arity_message(wanted: &usize, variadic: &bool, got: &usize) -> String {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    if *variadic {
        format!(
            "wanted at least {wanted} argument{}, got {got}",
            plural(*wanted)
        )
    } else {
        format!("wanted {wanted} argument{}, got {got}", plural(*wanted))
    }
}

impl EvalError {
    /// Wrap `self` as the cause of an error at `path` below the current value.
    pub fn at_path(self, path: impl Into<String>) -> Self {
        Self::PathEvaluation {
            path: path.into(),
            cause: Box::new(self),
        }
    }

    /// Attribute `self` to the positional argument at `arg` (zero-based).
    pub fn for_positional_arg(self, arg: usize) -> Self {
        Self::PositionalArg {
            arg,
            cause: Box::new(self),
        }
    }

    /// Attribute `self` to the keyword argument `arg`.
    pub fn for_keyword_arg(self, arg: impl Into<String>) -> Self {
        Self::KeywordArg {
            arg: arg.into(),
            cause: Box::new(self),
        }
    }

    /// Wrap `self` as the failure of invoking function `name`.
    pub fn in_invocation(self, name: impl Into<String>) -> Self {
        Self::Invocation {
            name: name.into(),
            cause: Box::new(self),
        }
    }

    /// Build an [`EvalError::UnexpectedType`] from the wanted type names.
    pub fn unexpected_type(wanted: &[&str], got: impl Into<String>) -> Self {
        Self::UnexpectedType {
            wanted: wanted.iter().map(|w| w.to_string()).collect(),
            got: got.into(),
        }
    }

    /// The wrapped error, if this is a wrapping variant.
    pub fn cause(&self) -> Option<&EvalError> {
        match self {
            Self::PathEvaluation { cause, .. }
            | Self::Invocation { cause, .. }
            | Self::PositionalArg { cause, .. }
            | Self::KeywordArg { cause, .. }
            | Self::InvalidType { cause, .. }
            | Self::InvalidEncoding { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// The innermost error of the wrapping chain.
    pub fn root_cause(&self) -> &EvalError {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    /// Returns `true` if the chain contains an error meaning "nothing is here":
    /// a missing map key, an out-of-bounds index, or a value that cannot be
    /// used as a container.
    pub fn is_not_exists(&self) -> bool {
        match self {
            Self::UnknownKey { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::UnsupportedValueType { .. }
            | Self::UnexpectedStringIndex { .. }
            | Self::UnexpectedIndexType { .. }
            | Self::UnexpectedKeyType { .. } => true,
            // Not-exists inside a resolver or decoder is a broken document, not absence.
            Self::InvalidType { .. } | Self::InvalidEncoding { .. } => false,
            other => other.cause().is_some_and(EvalError::is_not_exists),
        }
    }

    /// Returns `true` if the chain ends in a cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Canceled | Self::DeadlineExceeded
        )
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}
