//! JSONPath tokenizer.
//!
//! Positions are byte offsets into the source. Unlike the path-expression
//! lexer this one stops at the first error: JSONPath expressions are short
//! and one precise message beats a recovered cascade.

use crate::error::{JsonPathError, JsonPathResult};

/// A JSONPath token with its byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Dollar,
    At,
    Dot,
    DotDot,
    Star,
    Question,
    /// `#n`
    Hash(u32),
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    Null,

    // ── Operators ──
    EqEq,
    BangEq,
    EqTilde,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AmpAmp,
    PipePipe,
    Bang,
    Plus,
    Minus,
    Slash,
    Percent,

    // ── Delimiters ──
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,

    Eof,
}

impl TokenKind {
    /// Source-like rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Dollar => "'$'".into(),
            TokenKind::At => "'@'".into(),
            TokenKind::Dot => "'.'".into(),
            TokenKind::DotDot => "'..'".into(),
            TokenKind::Star => "'*'".into(),
            TokenKind::Question => "'?'".into(),
            TokenKind::Hash(n) => format!("'#{n}'"),
            TokenKind::Name(name) => format!("'{name}'"),
            TokenKind::Int(n) => format!("'{n}'"),
            TokenKind::Float(n) => format!("'{n}'"),
            TokenKind::Str(s) => format!("{s:?}"),
            TokenKind::True => "'true'".into(),
            TokenKind::False => "'false'".into(),
            TokenKind::Null => "'null'".into(),
            TokenKind::EqEq => "'=='".into(),
            TokenKind::BangEq => "'!='".into(),
            TokenKind::EqTilde => "'=~'".into(),
            TokenKind::Less => "'<'".into(),
            TokenKind::LessEq => "'<='".into(),
            TokenKind::Greater => "'>'".into(),
            TokenKind::GreaterEq => "'>='".into(),
            TokenKind::AmpAmp => "'&&'".into(),
            TokenKind::PipePipe => "'||'".into(),
            TokenKind::Bang => "'!'".into(),
            TokenKind::Plus => "'+'".into(),
            TokenKind::Minus => "'-'".into(),
            TokenKind::Slash => "'/'".into(),
            TokenKind::Percent => "'%'".into(),
            TokenKind::LBracket => "'['".into(),
            TokenKind::RBracket => "']'".into(),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::LBrace => "'{'".into(),
            TokenKind::RBrace => "'}'".into(),
            TokenKind::Comma => "','".into(),
            TokenKind::Colon => "':'".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole source, ending with [`TokenKind::Eof`].
    pub fn lex(mut self) -> JsonPathResult<Vec<Token>> {
        while let Some(c) = self.peek() {
            let start = self.offset();
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            let kind = match c {
                '$' => self.single(TokenKind::Dollar),
                '@' => self.single(TokenKind::At),
                '*' => self.single(TokenKind::Star),
                '?' => self.single(TokenKind::Question),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ',' => self.single(TokenKind::Comma),
                ':' => self.single(TokenKind::Colon),
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                '/' => self.single(TokenKind::Slash),
                '%' => self.single(TokenKind::Percent),
                '.' => {
                    if self.peek_at(1) == Some('.') {
                        self.pos += 2;
                        TokenKind::DotDot
                    } else {
                        self.single(TokenKind::Dot)
                    }
                }
                '=' => match self.peek_at(1) {
                    Some('=') => self.double(TokenKind::EqEq),
                    Some('~') => self.double(TokenKind::EqTilde),
                    _ => return Err(JsonPathError::parse("unexpected character '='", start)),
                },
                '!' => {
                    if self.peek_at(1) == Some('=') {
                        self.double(TokenKind::BangEq)
                    } else {
                        self.single(TokenKind::Bang)
                    }
                }
                '<' => {
                    if self.peek_at(1) == Some('=') {
                        self.double(TokenKind::LessEq)
                    } else {
                        self.single(TokenKind::Less)
                    }
                }
                '>' => {
                    if self.peek_at(1) == Some('=') {
                        self.double(TokenKind::GreaterEq)
                    } else {
                        self.single(TokenKind::Greater)
                    }
                }
                '&' if self.peek_at(1) == Some('&') => self.double(TokenKind::AmpAmp),
                '|' if self.peek_at(1) == Some('|') => self.double(TokenKind::PipePipe),
                '#' => self.placeholder()?,
                '\'' | '"' => self.string(c)?,
                c if c.is_ascii_digit() => self.number()?,
                c if is_name_start(c) => self.name(),
                c => {
                    return Err(JsonPathError::parse(
                        format!("unexpected character '{c}'"),
                        start,
                    ))
                }
            };
            self.tokens.push(Token {
                kind,
                position: start,
            });
        }
        let end = self.source.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            position: end,
        });
        Ok(self.tokens)
    }

    // ── Cursor ──

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 2;
        kind
    }

    fn after_dot(&self) -> bool {
        matches!(
            self.tokens.last(),
            Some(Token {
                kind: TokenKind::Dot | TokenKind::DotDot,
                ..
            })
        )
    }

    // ── Scanners ──

    fn placeholder(&mut self) -> JsonPathResult<TokenKind> {
        let start = self.offset();
        self.pos += 1;
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(JsonPathError::parse("expected digits after '#'", start));
        }
        digits
            .parse::<u32>()
            .map(TokenKind::Hash)
            .map_err(|_| JsonPathError::parse(format!("invalid placeholder '#{digits}'"), start))
    }

    fn number(&mut self) -> JsonPathResult<TokenKind> {
        let start = self.offset();
        let mut text = self.take_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        // `.0.1` after a dot is two selectors, not a float.
        if !self.after_dot()
            && self.peek() == Some('.')
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            is_float = true;
        }
        if !self.after_dot() && matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.peek() {
                        text.push(c);
                    }
                    self.pos += 1;
                }
                text.push_str(&self.take_while(|c| c.is_ascii_digit()));
                is_float = true;
            }
        }
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| JsonPathError::parse(format!("invalid number '{text}'"), start))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| JsonPathError::parse(format!("integer '{text}' is too large"), start))
        }
    }

    fn name(&mut self) -> TokenKind {
        let name = self.take_while(is_name_continue);
        match name.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Name(name),
        }
    }

    fn string(&mut self, quote: char) -> JsonPathResult<TokenKind> {
        let start = self.offset();
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(JsonPathError::parse("unterminated string literal", start));
            };
            self.pos += 1;
            match c {
                c if c == quote => return Ok(TokenKind::Str(value)),
                '\\' => {
                    let escape_at = self.offset();
                    let Some(escaped) = self.peek() else {
                        return Err(JsonPathError::parse("unterminated string literal", start));
                    };
                    self.pos += 1;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' | '\'' | '"' | '/' => value.push(escaped),
                        'u' => value.push(self.unicode_escape(escape_at)?),
                        other => {
                            return Err(JsonPathError::parse(
                                format!("unknown escape sequence '\\{other}'"),
                                escape_at,
                            ))
                        }
                    }
                }
                c => value.push(c),
            }
        }
    }

    fn unicode_escape(&mut self, at: usize) -> JsonPathResult<char> {
        let mut hex = String::new();
        for _ in 0..4 {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.pos += 1;
                }
                _ => return Err(JsonPathError::parse("invalid unicode escape", at)),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| JsonPathError::parse("invalid unicode escape", at))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.pos += 1;
        }
        out
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_path_tokens() {
        assert_eq!(
            kinds("$.a..b[*]"),
            vec![
                TokenKind::Dollar,
                TokenKind::Dot,
                TokenKind::Name("a".into()),
                TokenKind::DotDot,
                TokenKind::Name("b".into()),
                TokenKind::LBracket,
                TokenKind::Star,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dotted_integers_stay_separate() {
        assert_eq!(
            kinds("$.0.1"),
            vec![
                TokenKind::Dollar,
                TokenKind::Dot,
                TokenKind::Int(0),
                TokenKind::Dot,
                TokenKind::Int(1),
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("1.5")[0], TokenKind::Float(1.5));
    }

    #[test]
    fn test_placeholder_and_strings() {
        assert_eq!(kinds("#12")[0], TokenKind::Hash(12));
        assert_eq!(kinds(r#"'it\'s'"#)[0], TokenKind::Str("it's".into()));
        assert_eq!(kinds(r#""A""#)[0], TokenKind::Str("A".into()));
    }

    #[test]
    fn test_errors_carry_position() {
        let err = Lexer::new("$.a = 1").lex().unwrap_err();
        assert!(matches!(err, JsonPathError::Parse { position: 4, .. }));
        assert!(Lexer::new("'open").lex().is_err());
    }
}
