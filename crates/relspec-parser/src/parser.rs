//! Core parser infrastructure: token cursor, error reporting, helpers.

use relspec_lexer::token::{Token, TokenKind};
use relspec_types::ast::{Expr, Ident, Template};
use relspec_types::{ParseError, ParseErrors, SourceText, Span, MAX_ERRORS};

/// Maximum nesting depth of expressions.
pub const MAX_EXPR_DEPTH: u32 = 64;

/// The path-expression parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and attempts recovery when possible.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source text for error context.
    source_text: &'src SourceText,
    /// Collected errors.
    errors: ParseErrors,
    /// Current expression nesting depth.
    pub(crate) expr_depth: u32,
}

/// Result of parsing.
pub struct ParseResult<T> {
    pub node: Option<T>,
    pub errors: ParseErrors,
}

impl<T> ParseResult<T> {
    /// The parsed node, or every collected error.
    pub fn into_result(self) -> Result<T, ParseErrors> {
        match self.node {
            Some(node) if !self.errors.has_errors() => Ok(node),
            _ => Err(self.errors),
        }
    }
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source text.
    pub fn new(tokens: Vec<Token>, source_text: &'src SourceText) -> Self {
        Self {
            tokens,
            pos: 0,
            source_text,
            errors: ParseErrors::empty(),
            expr_depth: 0,
        }
    }

    /// Parse a complete expression; the whole token stream must be consumed.
    pub fn parse(mut self) -> ParseResult<Expr> {
        let node = self.parse_expression();
        if node.is_some() && !self.at_end() {
            self.error_at_current(format!(
                "unexpected '{}' after expression",
                self.peek_kind()
            ));
        }
        ParseResult {
            node,
            errors: self.errors,
        }
    }

    /// Parse a template token stream.
    pub fn parse_template(mut self) -> ParseResult<Template> {
        let node = self.parse_template_parts();
        ParseResult {
            node: Some(node),
            errors: self.errors,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should end with Eof")
        })
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        let idx = self.pos + n;
        self.tokens
            .get(idx)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(format!(
                "expected '{}', got '{}'",
                expected,
                self.peek_kind()
            ));
            None
        }
    }

    /// Expect an identifier token.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(format!(
                    "expected identifier, got '{}'",
                    self.peek_kind()
                ));
                None
            }
        }
    }

    /// Eat an optional trailing comma.
    pub(crate) fn eat_comma(&mut self) -> bool {
        self.eat(&TokenKind::Comma)
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(message, span);
    }

    /// Report an error with a fix suggestion at the current token position.
    pub(crate) fn error_at_current_with_suggestion(
        &mut self,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        let span = self.current_span();
        let source_line = self.source_line(span);
        self.errors.push_error(
            ParseError::new(message, span, source_line).with_suggestion(suggestion),
        );
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, message: impl Into<String>, span: Span) {
        let source_line = self.source_line(span);
        self.errors
            .push_error(ParseError::new(message, span, source_line));
    }

    fn source_line(&self, span: Span) -> String {
        self.source_text
            .line(span.start_line)
            .unwrap_or("")
            .to_string()
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until the end of the current template fragment.
    /// Used after an error to resume with the next fragment.
    pub(crate) fn synchronize_fragment(&mut self) {
        while !self.at_end() {
            if self.eat(&TokenKind::InterpolationEnd) {
                return;
            }
            self.advance();
        }
    }
}
