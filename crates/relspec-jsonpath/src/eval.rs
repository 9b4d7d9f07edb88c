//! JSONPath evaluation.
//!
//! A path is evaluated as a set of matches flowing through its selectors.
//! Once any selector can yield more than one match, errors raised for
//! individual matches are dropped unless they propagate; before that they
//! surface (or prune, when missing keys are allowed).

use std::collections::BTreeMap;

use regex::Regex;
use relspec_types::ops::{self, ArithOp};
use relspec_types::{ReferenceId, Value};

use crate::ast::{BinOp, Expr, Key, Literal, ObjectKey, Path, Root, Selector, UnaryOp};
use crate::error::{JsonPathError, JsonPathResult};
use crate::options::JsonPathOptions;
use crate::visitor::{PathKey, PathValue, VariableVisitor};

/// A value reached by a path, with the keys its placeholders captured.
#[derive(Clone)]
struct Match<R: ReferenceId> {
    value: Value<R>,
    captures: BTreeMap<u32, PathKey>,
}

impl<R: ReferenceId> Match<R> {
    fn child(&self, value: Value<R>) -> Self {
        Self {
            value,
            captures: self.captures.clone(),
        }
    }
}

pub(crate) struct Evaluator<'a, R: ReferenceId, V: VariableVisitor<R> + ?Sized> {
    visitor: &'a V,
    root: &'a Value<R>,
    options: &'a JsonPathOptions,
    /// Inside filters, missing keys read as `null`.
    lenient: bool,
}

impl<'a, R: ReferenceId, V: VariableVisitor<R> + ?Sized> Evaluator<'a, R, V> {
    pub(crate) fn new(visitor: &'a V, root: &'a Value<R>, options: &'a JsonPathOptions) -> Self {
        Self {
            visitor,
            root,
            options,
            lenient: false,
        }
    }

    fn filtering(&self) -> Self {
        Self {
            visitor: self.visitor,
            root: self.root,
            options: self.options,
            lenient: true,
        }
    }

    // ── Expressions ──

    pub(crate) fn eval(&self, expr: &Expr, current: &Value<R>) -> JsonPathResult<Value<R>> {
        match expr {
            Expr::Path(path) => self.eval_path(path, current),
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, current)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!filter_truthy(&value))),
                    UnaryOp::Neg => ops::negate(&value).map_err(|e| operator("-", e)),
                }
            }
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right, current),
            Expr::Object(entries) => self.eval_object(entries, current),
        }
    }

    fn eval_binary(
        &self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        current: &Value<R>,
    ) -> JsonPathResult<Value<R>> {
        let lhs = self.eval(left, current)?;
        match op {
            BinOp::And if !filter_truthy(&lhs) => return Ok(Value::Bool(false)),
            BinOp::Or if filter_truthy(&lhs) => return Ok(Value::Bool(true)),
            _ => {}
        }
        let rhs = self.eval(right, current)?;
        let sym = op.as_str();
        let value = match op {
            BinOp::And | BinOp::Or => Value::Bool(filter_truthy(&rhs)),
            BinOp::Eq => Value::Bool(lhs == rhs),
            BinOp::NotEq => Value::Bool(lhs != rhs),
            BinOp::Match => {
                let (Some(text), Some(pattern)) = (lhs.as_str(), rhs.as_str()) else {
                    return Ok(Value::Bool(false));
                };
                let re = Regex::new(pattern).map_err(|e| operator(sym, e))?;
                Value::Bool(re.is_match(text))
            }
            BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => {
                // Incomparable operands simply do not match.
                let Ok(ordering) = ops::compare(&lhs, &rhs) else {
                    return Ok(Value::Bool(false));
                };
                Value::Bool(match op {
                    BinOp::Less => ordering.is_lt(),
                    BinOp::LessEq => ordering.is_le(),
                    BinOp::Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                })
            }
            BinOp::Add => ops::add(&lhs, &rhs).map_err(|e| operator(sym, e))?,
            BinOp::Sub => arith(ArithOp::Sub, sym, &lhs, &rhs)?,
            BinOp::Mul => arith(ArithOp::Mul, sym, &lhs, &rhs)?,
            BinOp::Div => arith(ArithOp::Div, sym, &lhs, &rhs)?,
            BinOp::Mod => arith(ArithOp::Mod, sym, &lhs, &rhs)?,
        };
        Ok(value)
    }

    /// `{#0: $.a[#0], 'k': …}`: one entry per match of each value path,
    /// keyed by the captured placeholder.
    fn eval_object(
        &self,
        entries: &[(ObjectKey, Expr)],
        current: &Value<R>,
    ) -> JsonPathResult<Value<R>> {
        let mut out = BTreeMap::new();
        for (key, expr) in entries {
            let matches = match expr {
                Expr::Path(path) => self.matches(path, current)?.0,
                other => vec![Match {
                    value: self.eval(other, current)?,
                    captures: BTreeMap::new(),
                }],
            };
            for m in matches {
                let name = match key {
                    ObjectKey::Literal(name) => name.clone(),
                    ObjectKey::Placeholder(n) => match m.captures.get(n) {
                        Some(captured) => captured.to_string(),
                        None => continue,
                    },
                };
                out.insert(name, self.visitor.visit_value(m.value)?);
            }
        }
        Ok(Value::Map(out))
    }

    // ── Paths ──

    fn eval_path(&self, path: &Path, current: &Value<R>) -> JsonPathResult<Value<R>> {
        let (matches, multi) = self.matches(path, current)?;
        if multi {
            let values = matches
                .into_iter()
                .map(|m| self.visitor.visit_value(m.value))
                .collect::<JsonPathResult<Vec<_>>>()?;
            return Ok(Value::List(values));
        }
        match matches.into_iter().next() {
            Some(m) => self.visitor.visit_value(m.value),
            None => Ok(Value::Null),
        }
    }

    /// All matches of a path, and whether it can yield several.
    fn matches(&self, path: &Path, current: &Value<R>) -> JsonPathResult<(Vec<Match<R>>, bool)> {
        let start = match path.root {
            Root::Document => self.root.clone(),
            Root::Current | Root::Implicit => current.clone(),
        };
        let mut matches = vec![Match {
            value: start,
            captures: BTreeMap::new(),
        }];
        let mut multi = false;
        for selector in &path.selectors {
            let mut next = Vec::new();
            for m in &matches {
                match self.select(selector, m) {
                    Ok(selected) => next.extend(selected),
                    Err(err) if err.propagates() => return Err(err),
                    Err(_) if multi => {}
                    Err(err) if err.is_missing() && self.prunes_missing() => {}
                    Err(err) => return Err(err),
                }
            }
            multi |= selector.is_multi();
            matches = next;
        }
        Ok((matches, multi))
    }

    fn prunes_missing(&self) -> bool {
        self.lenient || self.options.missing_keys_allowed
    }

    fn select(&self, selector: &Selector, m: &Match<R>) -> JsonPathResult<Vec<Match<R>>> {
        let parent = &m.value;
        let keyed = |values: Vec<PathValue<R>>| -> Vec<Match<R>> {
            values.into_iter().map(|pv| m.child(pv.value)).collect()
        };
        match selector {
            Selector::Child(key) => Ok(vec![m.child(self.visitor.visit_child(parent, key)?)]),
            Selector::Wildcard => Ok(keyed(self.visitor.visit_wildcard(parent)?)),
            Selector::RecursiveDescent => Ok(keyed(self.visitor.visit_recursive_descent(parent)?)),
            Selector::Range { start, end, step } => Ok(keyed(
                self.visitor.visit_range(parent, *start, *end, *step)?,
            )),
            Selector::Union(keys) => {
                let mut out = Vec::with_capacity(keys.len());
                for key in keys {
                    match self.visitor.visit_child(parent, key) {
                        Ok(value) => out.push(m.child(value)),
                        Err(err) if err.propagates() => return Err(err),
                        Err(_) => {}
                    }
                }
                Ok(out)
            }
            Selector::Filter(filter) => {
                let evaluator = self.filtering();
                let mut out = Vec::new();
                for child in self.visitor.visit_wildcard(parent)? {
                    match evaluator.eval(filter, &child.value) {
                        Ok(result) if filter_truthy(&result) => out.push(m.child(child.value)),
                        Ok(_) => {}
                        Err(err) if err.propagates() => return Err(err),
                        Err(_) => {}
                    }
                }
                Ok(out)
            }
            Selector::Script(script) => {
                let key = match self.eval(script, parent)? {
                    Value::String(name) => Key::Name(name),
                    Value::Int(index) => Key::Index(index),
                    Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Key::Index(f as i64),
                    other => {
                        return Err(JsonPathError::VarSelectorType {
                            type_name: other.type_name().to_string(),
                        })
                    }
                };
                Ok(vec![m.child(self.visitor.visit_child(parent, &key)?)])
            }
            Selector::Placeholder(n) => Ok(self
                .visitor
                .visit_wildcard(parent)?
                .into_iter()
                .map(|pv| {
                    let mut captured = m.child(pv.value);
                    captured.captures.insert(*n, pv.key);
                    captured
                })
                .collect()),
        }
    }
}

/// Truthiness inside filters: booleans are themselves, `null` is false,
/// everything else selected is true.
pub(crate) fn filter_truthy<R: ReferenceId>(value: &Value<R>) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        _ => true,
    }
}

fn literal_value<R: ReferenceId>(literal: &Literal) -> Value<R> {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(n) => Value::Float(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn arith<R: ReferenceId>(
    op: ArithOp,
    sym: &str,
    lhs: &Value<R>,
    rhs: &Value<R>,
) -> JsonPathResult<Value<R>> {
    ops::arithmetic(op, lhs, rhs).map_err(|e| operator(sym, e))
}

fn operator(op: &str, err: impl std::fmt::Display) -> JsonPathError {
    JsonPathError::Operator {
        op: op.to_string(),
        message: err.to_string(),
    }
}

