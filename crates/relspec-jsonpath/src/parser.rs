//! JSONPath parser.
//!
//! Precedence (lowest to highest):
//!   1. `||`
//!   2. `&&`
//!   3. `==` `!=` `=~`
//!   4. `<` `<=` `>` `>=`
//!   5. `+` `-`
//!   6. `*` `/` `%`
//!   7. `!` `-` (prefix)
//!   8. paths, literals, `( … )`, placeholder objects

use crate::ast::{BinOp, Expr, Key, Literal, ObjectKey, Path, Root, Selector, UnaryOp};
use crate::error::{JsonPathError, JsonPathResult};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::options::JsonPathOptions;

/// Maximum nesting of parentheses, filters and objects.
pub const MAX_NESTING: usize = 64;

/// Parse a complete JSONPath expression.
pub fn parse(source: &str, options: &JsonPathOptions) -> JsonPathResult<Expr> {
    parse_with(source, options, options.initial_path)
}

/// Parse an expression; `implicit_paths` admits paths without `$` or `@`.
pub(crate) fn parse_with(
    source: &str,
    options: &JsonPathOptions,
    implicit_paths: bool,
) -> JsonPathResult<Expr> {
    let tokens = Lexer::new(source).lex()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        options,
        implicit_paths,
        depth: 0,
    };
    let expr = parser.parse_expr()?;
    let tok = parser.peek();
    if tok.kind != TokenKind::Eof {
        return Err(JsonPathError::parse(
            format!("unexpected {} after expression", tok.kind.describe()),
            tok.position,
        ));
    }
    Ok(expr)
}

struct Parser<'o> {
    tokens: Vec<Token>,
    pos: usize,
    options: &'o JsonPathOptions,
    implicit_paths: bool,
    depth: usize,
}

impl Parser<'_> {
    // ── Cursor ──

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> JsonPathResult<Token> {
        if self.peek_kind() == &kind {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(JsonPathError::parse(
                format!("expected {}, got {}", kind.describe(), tok.kind.describe()),
                tok.position,
            ))
        }
    }

    fn enter(&mut self) -> JsonPathResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(JsonPathError::parse(
                format!("maximum nesting depth is {MAX_NESTING}"),
                self.peek().position,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ── Expressions ──

    fn parse_expr(&mut self) -> JsonPathResult<Expr> {
        self.enter()?;
        let expr = self.parse_or();
        self.leave();
        expr
    }

    fn parse_or(&mut self) -> JsonPathResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> JsonPathResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            left = binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> JsonPathResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                TokenKind::EqTilde => BinOp::Match,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
    }

    fn parse_comparison(&mut self) -> JsonPathResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> JsonPathResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> JsonPathResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> JsonPathResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_primary(&mut self) -> JsonPathResult<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Dollar => {
                self.advance();
                self.parse_path(Root::Document).map(Expr::Path)
            }
            TokenKind::At => {
                self.advance();
                self.parse_path(Root::Current).map(Expr::Path)
            }
            TokenKind::Dot | TokenKind::DotDot | TokenKind::LBracket if self.implicit_paths => {
                self.parse_path(Root::Implicit).map(Expr::Path)
            }
            TokenKind::Name(name) if self.implicit_paths => {
                self.advance();
                let mut path = Path {
                    root: Root::Implicit,
                    selectors: vec![Selector::Child(Key::Name(name))],
                };
                self.parse_selectors(&mut path)?;
                Ok(Expr::Path(path))
            }
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Int(n)))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBrace if self.options.placeholders => self.parse_object(),
            TokenKind::Hash(_) => Err(self.placeholders_disabled(tok.position)),
            other => Err(JsonPathError::parse(
                format!("expected expression, got {}", other.describe()),
                tok.position,
            )),
        }
    }

    /// `{ key: expr, … }` where keys are `#n`, names or strings.
    fn parse_object(&mut self) -> JsonPathResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        self.enter()?;
        let mut entries = Vec::new();
        if !self.eat(&TokenKind::RBrace) {
            loop {
                let tok = self.advance();
                let key = match tok.kind {
                    TokenKind::Hash(n) => ObjectKey::Placeholder(n),
                    TokenKind::Name(name) | TokenKind::Str(name) => ObjectKey::Literal(name),
                    other => {
                        return Err(JsonPathError::parse(
                            format!("expected object key, got {}", other.describe()),
                            tok.position,
                        ))
                    }
                };
                self.expect(TokenKind::Colon)?;
                let value = if self.peek_kind() == &TokenKind::LBrace {
                    self.parse_object()?
                } else {
                    self.parse_expr()?
                };
                entries.push((key, value));
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::RBrace)?;
                break;
            }
        }
        self.leave();
        Ok(Expr::Object(entries))
    }

    // ── Paths ──

    fn parse_path(&mut self, root: Root) -> JsonPathResult<Path> {
        let mut path = Path {
            root,
            selectors: Vec::new(),
        };
        self.parse_selectors(&mut path)?;
        Ok(path)
    }

    fn parse_selectors(&mut self, path: &mut Path) -> JsonPathResult<()> {
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let dot = self.advance();
                    let selector = self.parse_dot_member(".", dot.position)?;
                    path.selectors.push(selector);
                }
                TokenKind::DotDot => {
                    let dots = self.advance();
                    path.selectors.push(Selector::RecursiveDescent);
                    if self.peek_kind() == &TokenKind::LBracket {
                        continue;
                    }
                    let selector = self.parse_dot_member("..", dots.position)?;
                    path.selectors.push(selector);
                }
                TokenKind::LBracket => {
                    let selector = self.parse_bracket()?;
                    path.selectors.push(selector);
                }
                _ => return Ok(()),
            }
        }
    }

    /// The selector after `.` or `..`.
    fn parse_dot_member(&mut self, separator: &str, position: usize) -> JsonPathResult<Selector> {
        let tok = self.peek().clone();
        let selector = match tok.kind {
            TokenKind::Name(name) | TokenKind::Str(name) => Selector::Child(Key::Name(name)),
            TokenKind::Int(n) => Selector::Child(Key::Name(n.to_string())),
            TokenKind::True => Selector::Child(Key::Name("true".into())),
            TokenKind::False => Selector::Child(Key::Name("false".into())),
            TokenKind::Null => Selector::Child(Key::Name("null".into())),
            TokenKind::Star => Selector::Wildcard,
            TokenKind::Hash(n) => {
                if !self.options.placeholders {
                    return Err(self.placeholders_disabled(tok.position));
                }
                Selector::Placeholder(n)
            }
            _ => {
                return Err(JsonPathError::UnexpectedSeparator {
                    separator: separator.to_string(),
                    position,
                })
            }
        };
        self.advance();
        Ok(selector)
    }

    fn parse_bracket(&mut self) -> JsonPathResult<Selector> {
        let open = self.expect(TokenKind::LBracket)?;
        let tok = self.peek().clone();
        let selector = match tok.kind {
            TokenKind::Star => {
                self.advance();
                Selector::Wildcard
            }
            TokenKind::Question => {
                self.advance();
                let expr = if self.eat(&TokenKind::LParen) {
                    let expr = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    expr
                } else {
                    self.parse_expr()?
                };
                Selector::Filter(Box::new(expr))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Selector::Script(Box::new(expr))
            }
            TokenKind::Hash(n) => {
                if !self.options.placeholders {
                    return Err(self.placeholders_disabled(tok.position));
                }
                self.advance();
                Selector::Placeholder(n)
            }
            _ => return self.parse_subscript(open.position),
        };
        self.expect(TokenKind::RBracket)?;
        Ok(selector)
    }

    /// Keys, unions and ranges: `[0]`, `['a','b']`, `[1:-1:2]`.
    fn parse_subscript(&mut self, open: usize) -> JsonPathResult<Selector> {
        let mut separator: Option<&'static str> = None;
        let mut keys = Vec::new();
        let mut bounds = Vec::new();
        let mut current = self.parse_key()?;
        loop {
            let tok = self.advance();
            match tok.kind {
                TokenKind::Comma => {
                    self.check_separator(&mut separator, ",", tok.position)?;
                    let key = current.take().ok_or_else(|| unexpected(",", tok.position))?;
                    keys.push(key);
                    current = self.parse_key()?;
                    if current.is_none() {
                        return Err(unexpected(",", tok.position));
                    }
                }
                TokenKind::Colon => {
                    self.check_separator(&mut separator, ":", tok.position)?;
                    bounds.push(range_bound(current.take(), tok.position)?);
                    if bounds.len() > 2 {
                        return Err(unexpected(":", tok.position));
                    }
                    current = self.parse_key()?;
                }
                TokenKind::RBracket => break,
                other => {
                    return Err(JsonPathError::parse(
                        format!("expected ',', ':' or ']', got {}", other.describe()),
                        tok.position,
                    ))
                }
            }
        }
        match separator {
            None => current
                .map(Selector::Child)
                .ok_or_else(|| JsonPathError::parse("empty brackets", open)),
            Some(",") => {
                keys.extend(current);
                Ok(Selector::Union(keys))
            }
            _ => {
                bounds.push(range_bound(current, open)?);
                Ok(Selector::Range {
                    start: bounds[0],
                    end: bounds.get(1).copied().flatten(),
                    step: bounds.get(2).copied().flatten(),
                })
            }
        }
    }

    fn check_separator(
        &self,
        seen: &mut Option<&'static str>,
        separator: &'static str,
        position: usize,
    ) -> JsonPathResult<()> {
        match *seen {
            Some(first) if first != separator => Err(JsonPathError::MixedSeparator {
                first: first.to_string(),
                second: separator.to_string(),
                position,
            }),
            _ => {
                *seen = Some(separator);
                Ok(())
            }
        }
    }

    /// A key inside brackets, or `None` if the next token cannot start one.
    fn parse_key(&mut self) -> JsonPathResult<Option<Key>> {
        let tok = self.peek().clone();
        let key = match tok.kind {
            TokenKind::Int(n) => Key::Index(n),
            TokenKind::Minus => {
                self.advance();
                let next = self.advance();
                return match next.kind {
                    TokenKind::Int(n) => Ok(Some(Key::Index(-n))),
                    other => Err(JsonPathError::parse(
                        format!("expected integer after '-', got {}", other.describe()),
                        next.position,
                    )),
                };
            }
            TokenKind::Str(s) | TokenKind::Name(s) => Key::Name(s),
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(key))
    }

    fn placeholders_disabled(&self, position: usize) -> JsonPathError {
        JsonPathError::parse("placeholders are not enabled", position)
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn unexpected(separator: &str, position: usize) -> JsonPathError {
    JsonPathError::UnexpectedSeparator {
        separator: separator.to_string(),
        position,
    }
}

fn range_bound(key: Option<Key>, position: usize) -> JsonPathResult<Option<i64>> {
    match key {
        None => Ok(None),
        Some(Key::Index(n)) => Ok(Some(n)),
        Some(Key::Name(name)) => Err(JsonPathError::parse(
            format!("range bound must be an integer, got {name:?}"),
            position,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(source: &str) -> Path {
        match parse(source, &JsonPathOptions::default()) {
            Ok(Expr::Path(path)) => path,
            other => panic!("expected a path for {source:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_child_selectors() {
        let p = path("$.a['b'][0]");
        assert_eq!(p.root, Root::Document);
        assert_eq!(
            p.selectors,
            vec![
                Selector::Child(Key::Name("a".into())),
                Selector::Child(Key::Name("b".into())),
                Selector::Child(Key::Index(0)),
            ]
        );
        assert!(!p.is_multi());
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            path("$[1:-1:2]").selectors,
            vec![Selector::Range {
                start: Some(1),
                end: Some(-1),
                step: Some(2)
            }]
        );
        assert_eq!(
            path("$[::-1]").selectors,
            vec![Selector::Range {
                start: None,
                end: None,
                step: Some(-1)
            }]
        );
        assert_eq!(
            path("$[:2]").selectors,
            vec![Selector::Range {
                start: None,
                end: Some(2),
                step: None
            }]
        );
    }

    #[test]
    fn test_recursive_descent() {
        assert_eq!(
            path("$..name").selectors,
            vec![
                Selector::RecursiveDescent,
                Selector::Child(Key::Name("name".into()))
            ]
        );
        assert_eq!(
            path("$..[0]").selectors,
            vec![Selector::RecursiveDescent, Selector::Child(Key::Index(0))]
        );
    }

    #[test]
    fn test_separator_errors() {
        let opts = JsonPathOptions::default();
        assert!(matches!(
            parse("$[1:2,3]", &opts),
            Err(JsonPathError::MixedSeparator { .. })
        ));
        assert!(matches!(
            parse("$[1,]", &opts),
            Err(JsonPathError::UnexpectedSeparator { .. })
        ));
        assert!(matches!(
            parse("$.a.", &opts),
            Err(JsonPathError::UnexpectedSeparator { .. })
        ));
        assert!(matches!(
            parse("$[0:1:2:3]", &opts),
            Err(JsonPathError::UnexpectedSeparator { .. })
        ));
    }

    #[test]
    fn test_placeholders_require_option() {
        assert!(parse("$[#0]", &JsonPathOptions::default()).is_err());
        let opts = JsonPathOptions::new().with_placeholders();
        match parse("{#0: $[#0].name}", &opts) {
            Ok(Expr::Object(entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].0, ObjectKey::Placeholder(0));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_path() {
        let opts = JsonPathOptions::new().with_initial_path();
        match parse("a.b", &opts) {
            Ok(Expr::Path(p)) => {
                assert_eq!(p.root, Root::Implicit);
                assert_eq!(p.selectors.len(), 2);
            }
            other => panic!("expected path, got {other:?}"),
        }
        assert!(parse("a.b", &JsonPathOptions::default()).is_err());
    }

    #[test]
    fn test_filter_precedence() {
        let expr = parse("$[?(@.a > 1 && @.b == 'x' || !@.c)]", &JsonPathOptions::default());
        let Ok(Expr::Path(p)) = expr else {
            panic!("expected path");
        };
        match &p.selectors[0] {
            Selector::Filter(filter) => {
                assert!(matches!(**filter, Expr::Binary { op: BinOp::Or, .. }));
            }
            other => panic!("expected filter, got {other:?}"),
        }
    }
}
