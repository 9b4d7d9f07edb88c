//! JSONPath language options.

/// Tunes how JSONPath expressions are parsed and evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonPathOptions {
    /// Unknown keys and out-of-bounds indices prune the result set instead
    /// of failing.
    pub missing_keys_allowed: bool,
    /// Enables `#n` placeholder selectors and `{#n: expr}` object output.
    pub placeholders: bool,
    /// Allows paths without a leading `$`, such as `a.b` or `.a.b`.
    pub initial_path: bool,
}

impl JsonPathOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_keys_allowed(mut self) -> Self {
        self.missing_keys_allowed = true;
        self
    }

    pub fn with_placeholders(mut self) -> Self {
        self.placeholders = true;
        self
    }

    pub fn with_initial_path(mut self) -> Self {
        self.initial_path = true;
        self
    }
}
