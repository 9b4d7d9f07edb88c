//! JSONPath error taxonomy.

use relspec_types::EvalError;
use thiserror::Error;

/// Result alias for JSONPath operations.
pub type JsonPathResult<T> = Result<T, JsonPathError>;

/// Everything that can go wrong parsing or evaluating a JSONPath.
#[derive(Debug, Clone, Error)]
pub enum JsonPathError {
    // ── Parsing ──────────────────────────────────────────────────────────

    #[error("unexpected separator {separator:?} at position {position}")]
    UnexpectedSeparator { separator: String, position: usize },

    #[error("mixed separators {first:?} and {second:?} in brackets at position {position}")]
    MixedSeparator {
        first: String,
        second: String,
        position: usize,
    },

    #[error("parse error at position {position}: {message}")]
    Parse { message: String, position: usize },

    // ── Selection ────────────────────────────────────────────────────────

    /// An index outside the selected list.
    #[error("index {index} out of bounds for length {len}")]
    IndexParse { index: i64, len: usize },

    /// A key missing from the selected map.
    #[error("unknown key {key:?}")]
    KeyParse { key: String },

    /// A selector applied to a value it cannot traverse.
    #[error("cannot select {selector} from a value of type {type_name}")]
    PathResolution { selector: String, type_name: String },

    /// The visitor met a value it does not know how to traverse.
    #[error("unknown variable type {type_name}")]
    UnknownVariableType { type_name: String },

    /// A script selector produced something other than a key or an index.
    #[error("script selector must produce a string or an integer, got {type_name}")]
    VarSelectorType { type_name: String },

    /// An operator in a filter or script was applied to unsuitable operands.
    #[error("operator {op}: {message}")]
    Operator { op: String, message: String },

    /// A traversed value depends on references that are not yet available.
    #[error("value depends on unresolved references")]
    Unresolved,

    /// A failure reported by the variable visitor's evaluator.
    #[error(transparent)]
    Visitor(#[from] EvalError),
}

impl JsonPathError {
    /// Whether this error escapes selectors that otherwise drop errors.
    pub fn propagates(&self) -> bool {
        match self {
            Self::UnknownVariableType { .. }
            | Self::VarSelectorType { .. }
            | Self::MixedSeparator { .. }
            | Self::UnexpectedSeparator { .. }
            | Self::Parse { .. }
            | Self::Unresolved => true,
            Self::Visitor(err) => !err.is_not_exists(),
            _ => false,
        }
    }

    /// A missing key or an out-of-bounds index.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::KeyParse { .. } | Self::IndexParse { .. } => true,
            Self::Visitor(err) => err.is_not_exists(),
            _ => false,
        }
    }

    pub(crate) fn parse(message: impl Into<String>, position: usize) -> Self {
        Self::Parse {
            message: message.into(),
            position,
        }
    }
}

impl From<JsonPathError> for EvalError {
    fn from(err: JsonPathError) -> Self {
        match err {
            JsonPathError::Visitor(err) => err,
            JsonPathError::KeyParse { key } => EvalError::UnknownKey { key },
            JsonPathError::IndexParse { index, len } => EvalError::IndexOutOfBounds { index, len },
            JsonPathError::PathResolution { type_name, .. } => {
                EvalError::UnsupportedValueType { type_name }
            }
            err @ (JsonPathError::UnexpectedSeparator { .. }
            | JsonPathError::MixedSeparator { .. }
            | JsonPathError::Parse { .. }) => EvalError::Parse {
                language: "jsonpath".to_string(),
                message: err.to_string(),
            },
            err => EvalError::Query {
                language: "jsonpath".to_string(),
                message: err.to_string(),
            },
        }
    }
}
