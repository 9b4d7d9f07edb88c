//! AST node types for the path expression language and its templates.
//!
//! Every node carries a [`Span`] for error reporting.
//! Map literals keep source order; evaluation builds a sorted map.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// `42`
    Int(i64),
    /// `3.14`
    Float(f64),
    /// `'text'`, `"text"`, `` `raw` ``
    String(String),
    /// `[expr, ...]`
    List(Vec<Expr>),
    /// `{key: expr, ...}`
    Map(Vec<(Expr, Expr)>),

    // ── Selection ──
    /// `$`
    Root,
    /// `name`: a key of the root binding
    Variable(String),
    /// `expr.name`, `expr.0`, `expr.'quoted'`, `expr[expr]`
    Select {
        object: Box<Expr>,
        selector: Selector,
    },

    // ── Calls ──
    /// `name(args...)`
    Call { name: Ident, args: CallArgs },

    // ── Operators ──
    /// `-x`, `~x`, `!x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `a + b`, `a && b`, `a =~ b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `left |> right`: evaluate `right` with `left` as its root
    Pipe { left: Box<Expr>, right: Box<Expr> },
}

/// How a selection step picks its key.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// `.name`, `.0`, `.'quoted'`
    Literal(String),
    /// `[expr]`
    Expr(Box<Expr>),
}

/// Arguments of a call. A call is either all positional or all keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    Positional(Vec<Expr>),
    Keyword(Vec<(Ident, Expr)>),
}

impl CallArgs {
    pub fn len(&self) -> usize {
        match self {
            CallArgs::Positional(args) => args.len(),
            CallArgs::Keyword(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Operators ────────────────────────────────────────────────────────────────

/// Binary operators (in precedence order, lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Equality
    Eq,
    NotEq,
    Match,
    NotMatch,
    // Ordering
    Less,
    LessEq,
    Greater,
    GreaterEq,
    // Bitwise
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Match => "=~",
            BinOp::NotMatch => "!~",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `~x`
    BitNot,
    /// `!x`
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "!",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Templates
// ══════════════════════════════════════════════════════════════════════════════

/// A string with `${expr}` fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
    pub span: Span,
}

impl Template {
    /// The single expression making up the whole template, if that is its shape.
    pub fn sole_expr(&self) -> Option<&Expr> {
        match self.parts.as_slice() {
            [TemplatePart::Expr(expr)] => Some(expr),
            _ => None,
        }
    }

    /// Returns `true` if the template contains no expressions.
    pub fn is_literal(&self) -> bool {
        self.parts
            .iter()
            .all(|p| matches!(p, TemplatePart::Literal(_)))
    }
}

/// A part of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text segment.
    Literal(String),
    /// An interpolated expression `${expr}`.
    Expr(Expr),
}
