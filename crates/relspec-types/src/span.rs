use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// All line/column values are 1-based for human-readable error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_col) = (self.start_line, self.start_col)
            .min((other.start_line, other.start_col));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::new(start_line, start_col, end_line, end_col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Holds expression or template text for error reporting.
///
/// Expressions embedded in documents are usually a single line, but templates
/// taken from YAML block scalars can span several.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        if idx >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_across_lines() {
        let a = Span::new(1, 5, 1, 9);
        let b = Span::new(2, 1, 2, 3);
        assert_eq!(a.merge(b), Span::new(1, 5, 2, 3));
        assert_eq!(b.merge(a), Span::new(1, 5, 2, 3));
    }

    #[test]
    fn test_span_merge_same_line() {
        let a = Span::new(1, 5, 1, 9);
        let b = Span::new(1, 2, 1, 6);
        assert_eq!(a.merge(b), Span::new(1, 2, 1, 9));
    }

    #[test]
    fn test_source_text_lines() {
        let src = SourceText::new("a.b\r\n${c}\nlast");
        assert_eq!(src.line_count(), 3);
        assert_eq!(src.line(1), Some("a.b"));
        assert_eq!(src.line(2), Some("${c}"));
        assert_eq!(src.line(3), Some("last"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.line(4), None);
    }
}
