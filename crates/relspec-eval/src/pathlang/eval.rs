//! Expression evaluation.
//!
//! Operands are evaluated to full depth. An operand that is not ok makes
//! the whole expression unresolved: its value is `null` and its reference
//! log says why. Values taken from the document are evaluated through the
//! caller's evaluator, so reserved forms resolve as traversal proceeds.

use std::cmp::Ordering;
use std::rc::Rc;

use regex::Regex;
use relspec_types::ast::{BinOp, CallArgs, Expr, ExprKind, Selector, UnaryOp};
use relspec_types::ops::{self, ArithOp, BitOp};
use relspec_types::{
    Annotation, Context, DynEvaluator, EvalError, EvalResult, Evaluation, Expandable, Map,
    Metadata, ReferenceId, ReferenceLog, Value, DEPTH_FULL,
};

use crate::engine::{coalesce_evaluators, Engine};
use crate::expandable::MemoizedExpandable;
use crate::func::{call, Arguments, KeywordArgs, PositionalArgs};

use super::PathLanguage;

/// Everything an expression can see.
pub(crate) struct Scope<'a, R: ReferenceId> {
    pub(crate) language: &'a PathLanguage<R>,
    pub(crate) ctx: &'a Context,
    pub(crate) evaluator: &'a DynEvaluator<R>,
    pub(crate) root: &'a Value<R>,
}

impl<R: ReferenceId> Clone for Scope<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ReferenceId> Copy for Scope<'_, R> {}

fn unresolved<R: ReferenceId>(references: ReferenceLog<R>) -> Evaluation<R> {
    Evaluation::with_references(Value::Null, references)
}

impl<'a, R: ReferenceId> Scope<'a, R> {
    pub(crate) fn eval(&self, expr: &Expr, depth: i32) -> EvalResult<Evaluation<R>> {
        self.ctx.check()?;
        match &expr.kind {
            ExprKind::Null => Ok(Evaluation::new(Value::Null)),
            ExprKind::Bool(b) => Ok(Evaluation::new(Value::Bool(*b))),
            ExprKind::Int(i) => Ok(Evaluation::new(Value::Int(*i))),
            ExprKind::Float(f) => Ok(Evaluation::new(Value::Float(*f))),
            ExprKind::String(s) => Ok(Evaluation::new(Value::String(s.clone()))),
            ExprKind::List(items) => self.eval_list(items),
            ExprKind::Map(entries) => self.eval_map(entries),
            ExprKind::Root => self.evaluator.evaluate(self.ctx, self.root, depth),
            ExprKind::Variable(name) => {
                let root = self.evaluator.evaluate(self.ctx, self.root, 1)?;
                self.index(root, Value::String(name.clone()), true, depth)
            }
            ExprKind::Select { object, selector } => self.eval_select(object, selector, depth),
            ExprKind::Call { name, args } => self.eval_call(&name.name, args, depth),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Binary { left, op, right } => match op {
                BinOp::And | BinOp::Or => self.eval_logical(*op, left, right),
                _ => self.eval_binary(*op, left, right),
            },
            ExprKind::Pipe { left, right } => self.eval_pipe(left, right, depth),
        }
    }

    // ── Literals ─────────────────────────────────────────────────────────

    fn eval_list(&self, items: &[Expr]) -> EvalResult<Evaluation<R>> {
        let mut metadata = Metadata::default();
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let result = self.eval(item, DEPTH_FULL)?;
            out.push(result.value.clone());
            metadata.add_step(result, vec![Annotation::array_index(i)]);
        }
        Ok(Evaluation {
            metadata,
            value: Value::List(out),
        })
    }

    fn eval_map(&self, entries: &[(Expr, Expr)]) -> EvalResult<Evaluation<R>> {
        let mut metadata = Metadata::default();
        let mut out = Map::new();
        for (key, value) in entries {
            let key = self.eval(key, DEPTH_FULL)?;
            if !key.ok() {
                metadata.merge_references(key.references());
                return Ok(unresolved(metadata.references));
            }
            let name = match &key.value {
                Value::String(s) => s.clone(),
                other => {
                    return Err(EvalError::UnexpectedKeyType {
                        type_name: other.type_name().to_string(),
                    })
                }
            };
            metadata.merge_references(key.references());
            let result = self.eval(value, DEPTH_FULL)?;
            out.insert(name.clone(), result.value.clone());
            metadata.add_step(result, vec![Annotation::object_key(&name)]);
        }
        Ok(Evaluation {
            metadata,
            value: Value::Map(out),
        })
    }

    // ── Selection ────────────────────────────────────────────────────────

    fn eval_select(
        &self,
        object: &Expr,
        selector: &Selector,
        depth: i32,
    ) -> EvalResult<Evaluation<R>> {
        let container = self.eval(object, 1)?;
        match selector {
            Selector::Literal(name) => self.index(container, Value::String(name.clone()), true, depth),
            Selector::Expr(key) => {
                let key = self.eval(key, DEPTH_FULL)?;
                if !key.ok() {
                    let references = container.metadata.references.merged(key.references());
                    return Ok(unresolved(references));
                }
                let mut result = self.index(container, key.value, false, depth)?;
                result.metadata.merge_references(&key.metadata.references);
                Ok(result)
            }
        }
    }

    /// Select `key` from an already shallowly evaluated container, then
    /// evaluate the child to `depth`.
    fn index(
        &self,
        container: Evaluation<R>,
        key: Value<R>,
        literal: bool,
        depth: i32,
    ) -> EvalResult<Evaluation<R>> {
        if !container.ok() {
            return Ok(unresolved(container.metadata.references));
        }
        let child = select(&container.value, &key, literal)?;
        let label = key.to_template_string().unwrap_or_default();
        let result = self
            .evaluator
            .evaluate(self.ctx, &child, depth)
            .map_err(|e| e.at_path(label.clone()))?;
        let mut metadata = Metadata::default();
        metadata.merge_references(&container.metadata.references);
        let value = result.value.clone();
        metadata.add_step(result, vec![Annotation::object_key(&label)]);
        Ok(Evaluation { metadata, value })
    }

    // ── Calls ────────────────────────────────────────────────────────────

    fn eval_call(&self, name: &str, args: &CallArgs, depth: i32) -> EvalResult<Evaluation<R>> {
        let args = match args {
            CallArgs::Positional(exprs) => Arguments::Positional(PositionalArgs::new(
                exprs.iter().map(|e| self.deferred(e)).collect(),
            )),
            CallArgs::Keyword(pairs) => Arguments::Keyword(KeywordArgs::new(
                pairs
                    .iter()
                    .map(|(ident, e)| (ident.name.clone(), self.deferred(e)))
                    .collect(),
            )),
        };
        let result = call(self.ctx, self.language.library(), self.evaluator, name, args)?;
        if !result.ok() {
            return Ok(unresolved(result.metadata.references));
        }
        settle(self.ctx, self.evaluator, result, depth)
    }

    /// An argument evaluated only when, and as deeply as, the function asks.
    fn deferred(&self, expr: &Expr) -> Value<R> {
        let expandable = ExprExpandable {
            expr: Rc::new(expr.clone()),
            language: self.language.clone(),
            evaluator: Rc::clone(self.evaluator),
            root: self.root.clone(),
        };
        Value::Expandable(Rc::new(MemoizedExpandable::new(Rc::new(expandable))))
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&self, op: UnaryOp, operand: &Expr) -> EvalResult<Evaluation<R>> {
        let operand = self.eval(operand, DEPTH_FULL)?;
        if !operand.ok() {
            return Ok(unresolved(operand.metadata.references));
        }
        let value = match op {
            UnaryOp::Neg => ops::negate(&operand.value)?,
            UnaryOp::BitNot => ops::bit_not(&operand.value)?,
            UnaryOp::Not => Value::Bool(!ops::truthy(&operand.value)?),
        };
        Ok(Evaluation::with_references(value, operand.metadata.references))
    }

    fn eval_logical(&self, op: BinOp, left: &Expr, right: &Expr) -> EvalResult<Evaluation<R>> {
        let left = self.eval(left, DEPTH_FULL)?;
        let mut references = left.metadata.references.clone();
        if !left.ok() {
            if self.language.is_eager() {
                self.observe_unused(right, &mut references)?;
            }
            return Ok(unresolved(references));
        }
        let l = ops::truthy(&left.value)?;
        let decided = match op {
            BinOp::Or => l,
            _ => !l,
        };
        if decided {
            if self.language.is_eager() {
                self.observe_unused(right, &mut references)?;
            }
            return Ok(Evaluation::with_references(Value::Bool(l), references));
        }
        let right = self.eval(right, DEPTH_FULL)?;
        references.merge(right.references());
        if !right.ok() {
            return Ok(unresolved(references));
        }
        let r = ops::truthy(&right.value)?;
        Ok(Evaluation::with_references(Value::Bool(r), references))
    }

    /// Evaluate a side that does not affect the outcome, for its references.
    fn observe_unused(&self, expr: &Expr, references: &mut ReferenceLog<R>) -> EvalResult<()> {
        match self.eval(expr, DEPTH_FULL) {
            Ok(result) => references.merge_unused(result.references()),
            Err(e) if e.is_canceled() => return Err(e),
            Err(_) => {}
        }
        Ok(())
    }

    fn eval_binary(&self, op: BinOp, left: &Expr, right: &Expr) -> EvalResult<Evaluation<R>> {
        let left = self.eval(left, DEPTH_FULL)?;
        let right = self.eval(right, DEPTH_FULL)?;
        let references = left.metadata.references.clone().merged(right.references());
        if !left.ok() || !right.ok() {
            return Ok(unresolved(references));
        }
        let value = binary(op, &left.value, &right.value)?;
        Ok(Evaluation::with_references(value, references))
    }

    fn eval_pipe(&self, left: &Expr, right: &Expr, depth: i32) -> EvalResult<Evaluation<R>> {
        let left = self.eval(left, DEPTH_FULL)?;
        if !left.ok() {
            return Ok(unresolved(left.metadata.references));
        }
        let scope = Scope {
            root: &left.value,
            ..*self
        };
        let mut result = scope.eval(right, depth)?;
        result.metadata.merge_references(left.references());
        Ok(result)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Take one step into a list or map.
///
/// `literal` keys come from `.name` syntax, where digits index lists.
fn select<R: ReferenceId>(container: &Value<R>, key: &Value<R>, literal: bool) -> EvalResult<Value<R>> {
    match container {
        Value::Map(map) => match key {
            Value::String(name) => map
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownKey { key: name.clone() }),
            other => Err(EvalError::UnexpectedKeyType {
                type_name: other.type_name().to_string(),
            }),
        },
        Value::List(items) => {
            let index = match key {
                Value::Int(i) => *i,
                Value::String(s) if literal => {
                    s.parse::<i64>()
                        .map_err(|_| EvalError::UnexpectedStringIndex { index: s.clone() })?
                }
                Value::String(s) => {
                    return Err(EvalError::UnexpectedStringIndex { index: s.clone() })
                }
                other => {
                    return Err(EvalError::UnexpectedIndexType {
                        type_name: other.type_name().to_string(),
                    })
                }
            };
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(EvalError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                })
        }
        other => Err(EvalError::UnsupportedValueType {
            type_name: other.type_name().to_string(),
        }),
    }
}

fn binary<R: ReferenceId>(op: BinOp, l: &Value<R>, r: &Value<R>) -> EvalResult<Value<R>> {
    let ordered = |accept: fn(Ordering) -> bool| -> EvalResult<Value<R>> {
        Ok(Value::Bool(accept(ops::compare(l, r)?)))
    };
    Ok(match op {
        BinOp::Or => Value::Bool(ops::truthy(l)? || ops::truthy(r)?),
        BinOp::And => Value::Bool(ops::truthy(l)? && ops::truthy(r)?),
        BinOp::Eq => Value::Bool(l == r),
        BinOp::NotEq => Value::Bool(l != r),
        BinOp::Match => Value::Bool(matches_pattern(l, r)?),
        BinOp::NotMatch => Value::Bool(!matches_pattern(l, r)?),
        BinOp::Less => return ordered(Ordering::is_lt),
        BinOp::LessEq => return ordered(Ordering::is_le),
        BinOp::Greater => return ordered(Ordering::is_gt),
        BinOp::GreaterEq => return ordered(Ordering::is_ge),
        BinOp::BitOr => ops::bitwise(BitOp::Or, l, r)?,
        BinOp::BitXor => ops::bitwise(BitOp::Xor, l, r)?,
        BinOp::BitAnd => ops::bitwise(BitOp::And, l, r)?,
        BinOp::Shl => ops::bitwise(BitOp::Shl, l, r)?,
        BinOp::Shr => ops::bitwise(BitOp::Shr, l, r)?,
        BinOp::Add => ops::add(l, r)?,
        BinOp::Sub => ops::arithmetic(ArithOp::Sub, l, r)?,
        BinOp::Mul => ops::arithmetic(ArithOp::Mul, l, r)?,
        BinOp::Div => ops::arithmetic(ArithOp::Div, l, r)?,
        BinOp::Mod => ops::arithmetic(ArithOp::Mod, l, r)?,
        BinOp::Pow => ops::arithmetic(ArithOp::Pow, l, r)?,
    })
}

fn matches_pattern<R: ReferenceId>(subject: &Value<R>, pattern: &Value<R>) -> EvalResult<bool> {
    let (Value::String(subject), Value::String(pattern)) = (subject, pattern) else {
        let got = if subject.as_str().is_some() { pattern } else { subject };
        return Err(EvalError::unexpected_type(&["string"], got.type_name()));
    };
    let re = Regex::new(pattern).map_err(|e| EvalError::Regex {
        message: e.to_string(),
    })?;
    Ok(re.is_match(subject))
}

/// Walk a function result to `depth` when it has structure left to walk.
///
/// Strings are final: a function that builds `${…}` text returns text.
pub(crate) fn settle<R: ReferenceId>(
    ctx: &Context,
    fallback: &DynEvaluator<R>,
    result: Evaluation<R>,
    depth: i32,
) -> EvalResult<Evaluation<R>> {
    if !matches!(
        result.value,
        Value::List(_) | Value::Map(_) | Value::Expandable(_)
    ) {
        return Ok(result);
    }
    let evaluator = coalesce_evaluators(result.metadata.evaluator.clone(), fallback);
    let walked = evaluator.evaluate(ctx, &result.value, depth)?;
    let mut metadata = Metadata {
        annotation: result.metadata.annotation.clone(),
        ..Metadata::default()
    };
    let value = walked.value.clone();
    metadata.add_step(result, Vec::new());
    metadata.add_step(walked, Vec::new());
    Ok(Evaluation { metadata, value })
}

// ── Deferred arguments ───────────────────────────────────────────────────────

/// An argument expression bound to the scope it appeared in.
struct ExprExpandable<R: ReferenceId> {
    expr: Rc<Expr>,
    language: PathLanguage<R>,
    evaluator: DynEvaluator<R>,
    root: Value<R>,
}

impl<R: ReferenceId> Expandable<R> for ExprExpandable<R> {
    fn expand(&self, ctx: &Context, depth: i32) -> EvalResult<Evaluation<R>> {
        let scope = Scope {
            language: &self.language,
            ctx,
            evaluator: &self.evaluator,
            root: &self.root,
        };
        let result = scope.eval(&self.expr, depth)?;
        // Already evaluated: walking it again must not reinterpret strings.
        Ok(result.with_evaluator(Engine::<R>::default().to_dyn()))
    }
}
