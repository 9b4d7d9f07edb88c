//! Token types for the path expression lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the path expression
//! language and its `${…}` template dialect, and [`Token`], which pairs a
//! kind with a source [`Span`].

use relspec_types::Span;
use std::fmt;

/// Reserved words. Everything else that looks like a name is an identifier.
pub const ALL_KEYWORDS: &[&str] = &["true", "false", "null"];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind of the path expression language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Integer literal: `42`
    Int(i64),
    /// Decimal literal: `3.14`, `1e9`
    Float(f64),
    /// Quoted string: `'a'`, `"a"`, `` `a` ``
    String(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    // ── Names ────────────────────────────────────────────────

    /// A name: `foo`, `my-key`, `_x`
    Identifier(String),
    /// `$`
    Dollar,

    // ── Templates ────────────────────────────────────────────

    /// Literal template text between fragments.
    Text(String),
    /// The `${` that opens a template fragment.
    InterpolationStart,
    /// The `}` that closes a template fragment.
    InterpolationEnd,

    // ── Operators ────────────────────────────────────────────

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `~`
    Tilde,
    /// `^`
    Caret,
    /// `&`
    Amp,
    /// `&&`
    AmpAmp,
    /// `|`
    Pipe,
    /// `||`
    PipePipe,
    /// `|>`
    PipeGreater,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `!`
    Bang,
    /// `!=`
    BangEq,
    /// `!~`
    BangTilde,
    /// `==`
    EqEq,
    /// `=~`
    EqTilde,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,

    // ── Punctuation ──────────────────────────────────────────

    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // ── Special ──────────────────────────────────────────────

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a reserved word.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        match s {
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }

    /// Returns `true` for tokens that start a binary operator.
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::StarStar
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Caret
                | TokenKind::Amp
                | TokenKind::AmpAmp
                | TokenKind::Pipe
                | TokenKind::PipePipe
                | TokenKind::PipeGreater
                | TokenKind::Shl
                | TokenKind::Shr
                | TokenKind::BangEq
                | TokenKind::BangTilde
                | TokenKind::EqEq
                | TokenKind::EqTilde
                | TokenKind::Less
                | TokenKind::LessEq
                | TokenKind::Greater
                | TokenKind::GreaterEq
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Literals
            TokenKind::Int(n) => write!(f, "{n}"),
            TokenKind::Float(n) => write!(f, "{n}"),
            TokenKind::String(s) => write!(f, "{s:?}"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Null => f.write_str("null"),
            // Names
            TokenKind::Identifier(s) => f.write_str(s),
            TokenKind::Dollar => f.write_str("$"),
            // Templates
            TokenKind::Text(_) => f.write_str("template text"),
            TokenKind::InterpolationStart => f.write_str("${"),
            TokenKind::InterpolationEnd => f.write_str("end of template expression"),
            // Operators
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::StarStar => f.write_str("**"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::Tilde => f.write_str("~"),
            TokenKind::Caret => f.write_str("^"),
            TokenKind::Amp => f.write_str("&"),
            TokenKind::AmpAmp => f.write_str("&&"),
            TokenKind::Pipe => f.write_str("|"),
            TokenKind::PipePipe => f.write_str("||"),
            TokenKind::PipeGreater => f.write_str("|>"),
            TokenKind::Shl => f.write_str("<<"),
            TokenKind::Shr => f.write_str(">>"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::BangTilde => f.write_str("!~"),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::EqTilde => f.write_str("=~"),
            TokenKind::Less => f.write_str("<"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::GreaterEq => f.write_str(">="),
            // Punctuation
            TokenKind::Dot => f.write_str("."),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            // Special
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all() {
        for kw in ALL_KEYWORDS {
            assert!(TokenKind::from_keyword(kw).is_some(), "{kw} not recognised");
        }
    }

    #[test]
    fn test_keyword_case_sensitivity() {
        assert_eq!(TokenKind::from_keyword("True"), None);
        assert_eq!(TokenKind::from_keyword("NULL"), None);
    }

    #[test]
    fn test_display_roundtrip_keywords() {
        for kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw).unwrap();
            assert_eq!(kind.to_string(), *kw);
        }
    }

    #[test]
    fn test_display_operators() {
        assert_eq!(TokenKind::PipeGreater.to_string(), "|>");
        assert_eq!(TokenKind::BangTilde.to_string(), "!~");
        assert_eq!(TokenKind::StarStar.to_string(), "**");
    }

    #[test]
    fn test_is_binary_operator() {
        assert!(TokenKind::AmpAmp.is_binary_operator());
        assert!(!TokenKind::Bang.is_binary_operator());
        assert!(!TokenKind::Dot.is_binary_operator());
    }
}
