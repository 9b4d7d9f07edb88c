//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 12. `|>` (pipe)
//! 11. `||`
//! 10. `&&`
//!  9. `==`, `!=`, `=~`, `!~`
//!  8. `<`, `<=`, `>`, `>=`
//!  7. `|`
//!  6. `^`
//!  5. `&`
//!  4. `<<`, `>>`
//!  3. `+`, `-`
//!  2. `*`, `/`, `%`
//!  1. `**` (right-associative)
//!  0. unary `-`, `~`, `!`; postfix `.name`, `.0`, `.'quoted'`, `[expr]`

use relspec_lexer::token::TokenKind;
use relspec_types::ast::*;

use crate::parser::{Parser, MAX_EXPR_DEPTH};

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            self.error_at_current(format!(
                "maximum expression nesting depth is {MAX_EXPR_DEPTH}"
            ));
            self.expr_depth -= 1;
            return None;
        }
        let result = self.parse_pipe();
        self.expr_depth -= 1;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `PipeExpr = OrExpr { "|>" OrExpr }`
    fn parse_pipe(&mut self) -> Option<Expr> {
        let mut left = self.parse_or()?;
        while self.eat(&TokenKind::PipeGreater) {
            let right = self.parse_or()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Pipe {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// `OrExpr = AndExpr { "||" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = binary(left, BinOp::Or, right);
        }
        Some(left)
    }

    /// `AndExpr = EqualityExpr { "&&" EqualityExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            left = binary(left, BinOp::And, right);
        }
        Some(left)
    }

    /// `EqualityExpr = OrderingExpr { ("==" | "!=" | "=~" | "!~") OrderingExpr }`
    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_ordering()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                TokenKind::EqTilde => BinOp::Match,
                TokenKind::BangTilde => BinOp::NotMatch,
                _ => break,
            };
            self.advance();
            let right = self.parse_ordering()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `OrderingExpr = BitOrExpr { ("<" | "<=" | ">" | ">=") BitOrExpr }`
    fn parse_ordering(&mut self) -> Option<Expr> {
        let mut left = self.parse_bit_or()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_bit_or()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `BitOrExpr = BitXorExpr { "|" BitXorExpr }`
    fn parse_bit_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_bit_xor()?;
        while self.eat(&TokenKind::Pipe) {
            let right = self.parse_bit_xor()?;
            left = binary(left, BinOp::BitOr, right);
        }
        Some(left)
    }

    /// `BitXorExpr = BitAndExpr { "^" BitAndExpr }`
    fn parse_bit_xor(&mut self) -> Option<Expr> {
        let mut left = self.parse_bit_and()?;
        while self.eat(&TokenKind::Caret) {
            let right = self.parse_bit_and()?;
            left = binary(left, BinOp::BitXor, right);
        }
        Some(left)
    }

    /// `BitAndExpr = ShiftExpr { "&" ShiftExpr }`
    fn parse_bit_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_shift()?;
        while self.eat(&TokenKind::Amp) {
            let right = self.parse_shift()?;
            left = binary(left, BinOp::BitAnd, right);
        }
        Some(left)
    }

    /// `ShiftExpr = AddExpr { ("<<" | ">>") AddExpr }`
    fn parse_shift(&mut self) -> Option<Expr> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_add()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `MulExpr = PowExpr { ("*" | "/" | "%") PowExpr }`
    fn parse_mul(&mut self) -> Option<Expr> {
        let mut left = self.parse_pow()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_pow()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `PowExpr = UnaryExpr [ "**" PowExpr ]`
    fn parse_pow(&mut self) -> Option<Expr> {
        let base = self.parse_unary()?;
        if self.eat(&TokenKind::StarStar) {
            let exponent = self.parse_pow()?;
            return Some(binary(base, BinOp::Pow, exponent));
        }
        Some(base)
    }

    /// `UnaryExpr = ( "-" | "~" | "!" ) UnaryExpr | PostfixExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `PostfixExpr = PrimaryExpr { "." Member | "[" Expr "]" }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let selector = match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance(); // eat `.`
                    Selector::Literal(self.expect_member()?)
                }
                TokenKind::LBracket => {
                    self.advance(); // eat `[`
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    Selector::Expr(Box::new(index))
                }
                _ => break,
            };
            let span = expr.span.merge(self.previous_span());
            expr = Expr::new(
                ExprKind::Select {
                    object: Box::new(expr),
                    selector,
                },
                span,
            );
        }
        Some(expr)
    }

    /// The literal key after a `.`: a name, an integer, or a quoted string.
    fn expect_member(&mut self) -> Option<String> {
        let member = match self.peek_kind().clone() {
            TokenKind::Identifier(name) => name,
            TokenKind::Int(n) => n.to_string(),
            TokenKind::String(s) => s,
            TokenKind::True => "true".to_string(),
            TokenKind::False => "false".to_string(),
            TokenKind::Null => "null".to_string(),
            TokenKind::Eof | TokenKind::InterpolationEnd => {
                self.error_at_current_with_suggestion(
                    "expected selector after '.'",
                    "Remove the trailing '.' or add a key",
                );
                return None;
            }
            other => {
                self.error_at_current(format!("expected selector after '.', got '{other}'"));
                return None;
            }
        };
        self.advance();
        Some(member)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a primary expression.
    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(n) => ExprKind::Float(n),
            TokenKind::String(s) => ExprKind::String(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Dollar => ExprKind::Root,

            // ── Collections ─────────────────────────────────────────────
            TokenKind::LBracket => return self.parse_list_literal(),
            TokenKind::LBrace => return self.parse_map_literal(),

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => {
                self.advance(); // eat `(`
                let mut inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                inner.span = start.merge(self.previous_span());
                return Some(inner);
            }

            // ── Variable or function call ───────────────────────────────
            TokenKind::Identifier(_) => {
                if *self.look_ahead(1) == TokenKind::LParen {
                    return self.parse_call();
                }
                let ident = self.expect_identifier()?;
                return Some(Expr::new(ExprKind::Variable(ident.name), ident.span));
            }

            _ => {
                self.error_at_current(format!("expected expression, got '{}'", self.peek_kind()));
                return None;
            }
        };
        self.advance();
        Some(Expr::new(kind, start))
    }

    /// `[expr, ...]`
    fn parse_list_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LBracket)?;
        let mut items = Vec::new();
        while !self.check_exact(&TokenKind::RBracket) {
            items.push(self.parse_expression()?);
            if !self.eat_comma() {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::List(items), span))
    }

    /// `{key: expr, ...}` where a bare name key is taken literally.
    fn parse_map_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            let key = match self.peek_kind().clone() {
                TokenKind::Identifier(name) if *self.look_ahead(1) == TokenKind::Colon => {
                    let span = self.advance().span;
                    Expr::new(ExprKind::String(name), span)
                }
                _ => self.parse_expression()?,
            };
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if !self.eat_comma() {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Map(entries), span))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Call Parsing
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `name(args...)`.
    ///
    /// The argument list is keyword-style when it opens with `identifier :`
    /// and positional otherwise.
    fn parse_call(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        let keyword = matches!(self.peek_kind(), TokenKind::Identifier(_))
            && *self.look_ahead(1) == TokenKind::Colon;
        let args = if keyword {
            CallArgs::Keyword(self.parse_keyword_args()?)
        } else {
            CallArgs::Positional(self.parse_positional_args()?)
        };
        self.expect(&TokenKind::RParen)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Call { name, args }, span))
    }

    fn parse_positional_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if !self.eat_comma() {
                break;
            }
        }
        Some(args)
    }

    fn parse_keyword_args(&mut self) -> Option<Vec<(Ident, Expr)>> {
        let mut args: Vec<(Ident, Expr)> = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            if *self.look_ahead(1) != TokenKind::Colon {
                self.error_at_current_with_suggestion(
                    "expected keyword argument",
                    "A call takes either all positional or all keyword arguments",
                );
                return None;
            }
            let key = self.expect_identifier()?;
            if args.iter().any(|(k, _)| k.name == key.name) {
                self.error_at(format!("duplicate keyword argument '{}'", key.name), key.span);
            }
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            args.push((key, value));
            if !self.eat_comma() {
                break;
            }
        }
        Some(args)
    }
}
