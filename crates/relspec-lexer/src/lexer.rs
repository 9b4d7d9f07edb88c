//! Core path-expression lexer: converts source text to a token stream.
//!
//! Features:
//! - Literals: integers, decimals with exponents, `'…'`/`"…"` strings with
//!   escapes, `` `…` `` raw strings, `true`/`false`/`null`
//! - Identifiers may contain dashes after the first character (`my-key`)
//! - After a `.` only an integer is scanned, so `a.0.1` is two index steps
//! - Template mode: literal text with `${expr}` fragments via a mode stack
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use relspec_types::{ParseError, ParseErrors, SourceText, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Lexer mode: scanning an expression, template text, or a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Plain expression scanning.
    Normal,
    /// Template text, scanned until `${` or end of input.
    Text,
    /// Inside a `${...}` fragment. The `u32` tracks the brace depth so we know
    /// when the fragment's closing `}` is reached.
    Interpolation { brace_depth: u32 },
}

/// The path-expression lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`relspec_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source text for error reporting.
    source_text: &'src SourceText,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in characters).
    col: u32,
    /// Collected errors.
    errors: ParseErrors,
    /// Mode stack for templates.
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for fragments).
    pending: Vec<Token>,
    /// The previous token was a `.`.
    after_dot: bool,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: ParseErrors,
}

impl<'src> Lexer<'src> {
    /// Create a lexer for a standalone expression.
    pub fn new(source_text: &'src SourceText) -> Self {
        Self::with_mode(source_text, Mode::Normal)
    }

    /// Create a lexer for a template: text with `${expr}` fragments.
    pub fn template(source_text: &'src SourceText) -> Self {
        Self::with_mode(source_text, Mode::Text)
    }

    fn with_mode(source_text: &'src SourceText, mode: Mode) -> Self {
        Self {
            source: source_text.source.as_bytes(),
            source_text,
            pos: 0,
            line: 1,
            col: 1,
            errors: ParseErrors::empty(),
            mode_stack: vec![mode],
            pending: Vec::new(),
            after_dot: false,
        }
    }

    /// Lex the entire source into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= MAX_ERRORS {
                break;
            }

            let token = match self.pending.pop() {
                Some(pending) => pending,
                None => match self.current_mode() {
                    Mode::Text => self.scan_text(),
                    Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
                },
            };

            self.after_dot = token.kind == TokenKind::Dot;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        // Ensure token stream always ends with Eof
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if ch & 0xC0 != 0x80 {
            // UTF-8 continuation bytes do not start a new column
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn text_from(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn source_line_at(&self, line: u32) -> String {
        self.source_text.line(line).unwrap_or("").to_string()
    }

    fn emit_error(&mut self, message: impl Into<String>, span: Span) {
        let source_line = self.source_line_at(span.start_line);
        self.errors
            .push_error(ParseError::new(message, span, source_line));
    }

    fn emit_error_with_suggestion(
        &mut self,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let source_line = self.source_line_at(span.start_line);
        let err = ParseError::new(message, span, source_line).with_suggestion(suggestion);
        self.errors.push_error(err);
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Template text
    // ─────────────────────────────────────────────────────────────

    /// Scan literal text up to the next `${` or the end of input.
    fn scan_text(&mut self) -> Token {
        let start = self.pos;
        let start_line = self.line;
        let start_col = self.col;

        loop {
            match self.peek() {
                None => {
                    if self.pos > start {
                        return Token::new(
                            TokenKind::Text(self.text_from(start)),
                            self.span_from(start_line, start_col),
                        );
                    }
                    return Token::new(TokenKind::Eof, self.current_span());
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    let text = self.text_from(start);
                    let text_span = self.span_from(start_line, start_col);
                    let (open_line, open_col) = (self.line, self.col);
                    self.advance(); // consume '$'
                    self.advance(); // consume '{'
                    let open = Token::new(
                        TokenKind::InterpolationStart,
                        self.span_from(open_line, open_col),
                    );
                    self.push_mode(Mode::Interpolation { brace_depth: 0 });
                    if text.is_empty() {
                        return open;
                    }
                    // Queue InterpolationStart so it appears after the text
                    self.pending.push(open);
                    return Token::new(TokenKind::Text(text), text_span);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Expression scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token of an expression.
    fn scan_normal(&mut self) -> Token {
        self.skip_whitespace();

        // If we've hit the error cap, stop immediately
        if self.errors.total_errors >= MAX_ERRORS {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        if self.at_end() {
            if matches!(self.current_mode(), Mode::Interpolation { .. }) {
                self.emit_error_with_suggestion(
                    "Unterminated template expression",
                    self.current_span(),
                    "Close the expression with '}'",
                );
            }
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        let kind = match ch {
            // ── Number literal ──
            b'0'..=b'9' => return self.scan_number(start, start_line, start_col),

            // ── Identifiers & keywords ──
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                return self.scan_identifier(start, start_line, start_col)
            }

            // ── String literals ──
            b'\'' | b'"' => return self.scan_string(ch, start_line, start_col),
            b'`' => return self.scan_raw_string(start_line, start_col),

            b'$' => TokenKind::Dollar,

            // ── Operators ──
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'~' => TokenKind::Tilde,
            b'^' => TokenKind::Caret,
            b'*' => self.pick(b'*', TokenKind::StarStar, TokenKind::Star),
            b'&' => self.pick(b'&', TokenKind::AmpAmp, TokenKind::Amp),
            b'|' => match self.peek() {
                Some(b'|') => {
                    self.advance();
                    TokenKind::PipePipe
                }
                Some(b'>') => {
                    self.advance();
                    TokenKind::PipeGreater
                }
                _ => TokenKind::Pipe,
            },
            b'<' => match self.peek() {
                Some(b'<') => {
                    self.advance();
                    TokenKind::Shl
                }
                Some(b'=') => {
                    self.advance();
                    TokenKind::LessEq
                }
                _ => TokenKind::Less,
            },
            b'>' => match self.peek() {
                Some(b'>') => {
                    self.advance();
                    TokenKind::Shr
                }
                Some(b'=') => {
                    self.advance();
                    TokenKind::GreaterEq
                }
                _ => TokenKind::Greater,
            },
            b'!' => match self.peek() {
                Some(b'=') => {
                    self.advance();
                    TokenKind::BangEq
                }
                Some(b'~') => {
                    self.advance();
                    TokenKind::BangTilde
                }
                _ => TokenKind::Bang,
            },
            b'=' => match self.peek() {
                Some(b'=') => {
                    self.advance();
                    TokenKind::EqEq
                }
                Some(b'~') => {
                    self.advance();
                    TokenKind::EqTilde
                }
                _ => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error_with_suggestion(
                        "Unexpected character '='",
                        span,
                        "Use '==' for equality or '=~' for a regular expression match",
                    );
                    return self.scan_normal();
                }
            },

            // ── Punctuation ──
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'{' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }

            b'}' => match self.current_mode() {
                Mode::Interpolation { brace_depth: 0 } => {
                    // This `}` ends the fragment: back to template text
                    self.pop_mode();
                    TokenKind::InterpolationEnd
                }
                Mode::Interpolation { .. } => {
                    if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut()
                    {
                        *brace_depth -= 1;
                    }
                    TokenKind::RBrace
                }
                _ => TokenKind::RBrace,
            },

            _ => {
                // Skip the rest of a multi-byte character
                while self.peek().is_some_and(|b| b & 0xC0 == 0x80) {
                    self.advance();
                }
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    format!("Unexpected character '{}'", self.text_from(start)),
                    span,
                );
                // Error recovery: skip the character and try again
                return self.scan_normal();
            }
        };

        Token::new(kind, self.span_from(start_line, start_col))
    }

    /// Consume `next` if it follows, choosing between a two- and one-byte token.
    fn pick(&mut self, next: u8, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        // We already consumed the first digit
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }

        let mut is_float = false;
        if !self.after_dot {
            if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
                self.advance(); // consume '.'
                while let Some(b'0'..=b'9') = self.peek() {
                    self.advance();
                }
                is_float = true;
            }
            let has_exponent = matches!(self.peek(), Some(b'e' | b'E'))
                && match self.peek_at(1) {
                    Some(b'0'..=b'9') => true,
                    Some(b'+' | b'-') => matches!(self.peek_at(2), Some(b'0'..=b'9')),
                    _ => false,
                };
            if has_exponent {
                self.advance(); // consume 'e'
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.advance();
                }
                while let Some(b'0'..=b'9') = self.peek() {
                    self.advance();
                }
                is_float = true;
            }
        }

        let span = self.span_from(start_line, start_col);
        let text = self.text_from(start);
        let kind = if is_float {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                // Too large for an integer
                Err(_) => TokenKind::Float(text.parse().unwrap_or(f64::INFINITY)),
            }
        };

        Token::new(kind, span)
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: usize, start_line: u32, start_col: u32) -> Token {
        // First character was already consumed (letter or `_`)
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'-' {
                self.advance();
            } else {
                break;
            }
        }

        let span = self.span_from(start_line, start_col);
        let text = self.text_from(start);
        let kind = TokenKind::from_keyword(&text).unwrap_or(TokenKind::Identifier(text));

        Token::new(kind, span)
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string starting after the opening `quote`.
    fn scan_string(&mut self, quote: u8, start_line: u32, start_col: u32) -> Token {
        let mut buf: Vec<u8> = Vec::new();

        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error_with_suggestion(
                        "Unterminated string literal",
                        span,
                        format!("Close the string with {}", quote as char),
                    );
                    break;
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => self.scan_escape_sequence(&mut buf),
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }

        Token::new(
            TokenKind::String(String::from_utf8_lossy(&buf).into_owned()),
            self.span_from(start_line, start_col),
        )
    }

    /// Scan a backtick string: no escapes are processed.
    fn scan_raw_string(&mut self, start_line: u32, start_col: u32) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch != b'`') {
            self.advance();
        }
        let text = self.text_from(start);
        if self.advance().is_none() {
            let span = self.span_from(start_line, start_col);
            self.emit_error_with_suggestion(
                "Unterminated raw string literal",
                span,
                "Close the string with `",
            );
        }
        Token::new(TokenKind::String(text), self.span_from(start_line, start_col))
    }

    /// Scan an escape sequence at the `\`, appending the unescaped bytes.
    fn scan_escape_sequence(&mut self, buf: &mut Vec<u8>) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // consume the '\'

        let escaped = match self.advance() {
            Some(b'\\') => '\\',
            Some(b'\'') => '\'',
            Some(b'"') => '"',
            Some(b'/') => '/',
            Some(b'n') => '\n',
            Some(b't') => '\t',
            Some(b'r') => '\r',
            Some(b'b') => '\u{8}',
            Some(b'f') => '\u{c}',
            Some(b'u') => match self.scan_unicode_escape() {
                Some(ch) => ch,
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error_with_suggestion(
                        "Invalid unicode escape",
                        span,
                        "Use exactly four hex digits, as in \\u00e9",
                    );
                    return;
                }
            },
            Some(ch) => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(format!("Invalid escape sequence '\\{}'", ch as char), span);
                ch as char // error recovery: emit the char as-is
            }
            None => {
                let span = self.span_from(start_line, start_col);
                self.emit_error("Unexpected end of input in escape sequence", span);
                return;
            }
        };

        let mut encoded = [0u8; 4];
        buf.extend_from_slice(escaped.encode_utf8(&mut encoded).as_bytes());
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = (self.peek()? as char).to_digit(16)?;
            self.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code)
    }
}
