//! JSONPath syntax tree.

use std::fmt;

/// A JSONPath expression: a path, a literal, an operator, or (with
/// placeholders enabled) an object built from placeholder captures.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(Path),
    Literal(Literal),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `{#0: $.a[#0].b, 'k': $.c}`
    Object(Vec<(ObjectKey, Expr)>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Match,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Match => "=~",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

/// A key of a placeholder object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKey {
    /// `#n`: the key captured by placeholder `n`
    Placeholder(u32),
    Literal(String),
}

/// Where a path starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// `$`
    Document,
    /// `@`
    Current,
    /// No sigil: starts at the current value
    Implicit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub root: Root,
    pub selectors: Vec<Selector>,
}

impl Path {
    /// Whether the path can produce more than one match.
    pub fn is_multi(&self) -> bool {
        self.selectors.iter().any(Selector::is_multi)
    }
}

/// A literal selection key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Name(String),
    Index(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{name:?}"),
            Key::Index(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// `.name`, `['name']`, `[0]`
    Child(Key),
    /// `.*`, `[*]`
    Wildcard,
    /// `..`: the current value and all of its descendants
    RecursiveDescent,
    /// `[start:end:step]`
    Range {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    /// `['a', 'b']`, `[0, 2]`
    Union(Vec<Key>),
    /// `[?(expr)]`
    Filter(Box<Expr>),
    /// `[(expr)]`
    Script(Box<Expr>),
    /// `[#n]`, `.#n`: a wildcard that captures each key as placeholder `n`
    Placeholder(u32),
}

impl Selector {
    pub fn is_multi(&self) -> bool {
        !matches!(self, Selector::Child(_) | Selector::Script(_))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Child(key) => write!(f, "[{key}]"),
            Selector::Wildcard => f.write_str("[*]"),
            Selector::RecursiveDescent => f.write_str(".."),
            Selector::Range { start, end, step } => {
                let bound = |b: &Option<i64>| b.map(|b| b.to_string()).unwrap_or_default();
                write!(f, "[{}:{}", bound(start), bound(end))?;
                if step.is_some() {
                    write!(f, ":{}", bound(step))?;
                }
                f.write_str("]")
            }
            Selector::Union(keys) => {
                let keys: Vec<String> = keys.iter().map(Key::to_string).collect();
                write!(f, "[{}]", keys.join(","))
            }
            Selector::Filter(_) => f.write_str("[?(…)]"),
            Selector::Script(_) => f.write_str("[(…)]"),
            Selector::Placeholder(n) => write!(f, "[#{n}]"),
        }
    }
}

/// A part of a JSONPath template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    /// `{expr}`
    Expr(Expr),
    /// `{range expr}…{end}`
    Range { expr: Expr, body: Vec<TemplatePart> },
}
