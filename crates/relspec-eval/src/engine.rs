//! The evaluator driver.
//!
//! [`Engine`] walks a value to a requested depth and dispatches on its shape
//! to a [`Visitor`]. Every hook receives `next`, the evaluator to use for
//! children, so an overriding visitor keeps its behavior all the way down.

use std::rc::Rc;

use relspec_types::{
    next_depth, Annotation, Context, DynEvaluator, DynExpandable, EvalResult, Evaluation,
    Evaluator, Map, Metadata, ReferenceId, Value, DEPTH_FULL,
};

// ══════════════════════════════════════════════════════════════════════════════
// Visitor
// ══════════════════════════════════════════════════════════════════════════════

/// Per-shape hooks called by the [`Engine`].
///
/// The defaults delegate to the `walk_*` functions in this module, which an
/// overriding visitor can also call to fall back on standard behavior.
pub trait Visitor<R: ReferenceId> {
    fn visit_expandable(
        &self,
        ctx: &Context,
        expandable: &DynExpandable<R>,
        depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        walk_expandable(ctx, expandable, depth, next)
    }

    fn visit_list(
        &self,
        ctx: &Context,
        items: &[Value<R>],
        depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        walk_list(ctx, items, depth, next)
    }

    fn visit_map(
        &self,
        ctx: &Context,
        map: &Map<R>,
        depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        walk_map(ctx, map, depth, next)
    }

    fn visit_string(
        &self,
        _ctx: &Context,
        s: &str,
        _depth: i32,
        _next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        Ok(Evaluation::new(Value::String(s.to_string())))
    }
}

/// The visitor with every hook left at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVisitor;

impl<R: ReferenceId> Visitor<R> for DefaultVisitor {}

// ── Default walks ────────────────────────────────────────────────────────────

/// Expand, then keep evaluating what the expansion produced at the same
/// depth, preferring the evaluator the expansion asked for.
pub fn walk_expandable<R: ReferenceId>(
    ctx: &Context,
    expandable: &DynExpandable<R>,
    depth: i32,
    next: &DynEvaluator<R>,
) -> EvalResult<Evaluation<R>> {
    let expanded = expandable.expand(ctx, depth)?;
    if !expanded.ok() {
        return Ok(expanded);
    }
    let evaluator = coalesce_evaluators(expanded.metadata.evaluator.clone(), next);
    let result = evaluator.evaluate(ctx, &expanded.value, depth)?;
    let mut metadata = Metadata::default();
    metadata.add_step(expanded, Vec::new());
    let value = result.value.clone();
    metadata.add_step(result, Vec::new());
    Ok(Evaluation { metadata, value })
}

/// Evaluate each item one level down, preserving order.
pub fn walk_list<R: ReferenceId>(
    ctx: &Context,
    items: &[Value<R>],
    depth: i32,
    next: &DynEvaluator<R>,
) -> EvalResult<Evaluation<R>> {
    if depth == 1 {
        return Ok(Evaluation::new(Value::List(items.to_vec())));
    }
    let child_depth = next_depth(depth);
    let mut metadata = Metadata::default();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        ctx.check()?;
        let result = next
            .evaluate(ctx, item, child_depth)
            .map_err(|e| e.at_path(i.to_string()))?;
        out.push(result.value.clone());
        metadata.add_step(result, vec![Annotation::array_index(i)]);
    }
    Ok(Evaluation {
        metadata,
        value: Value::List(out),
    })
}

/// Evaluate each entry one level down.
pub fn walk_map<R: ReferenceId>(
    ctx: &Context,
    map: &Map<R>,
    depth: i32,
    next: &DynEvaluator<R>,
) -> EvalResult<Evaluation<R>> {
    if depth == 1 {
        return Ok(Evaluation::new(Value::Map(map.clone())));
    }
    let child_depth = next_depth(depth);
    let mut metadata = Metadata::default();
    let mut out = Map::new();
    for (key, item) in map {
        ctx.check()?;
        let result = next
            .evaluate(ctx, item, child_depth)
            .map_err(|e| e.at_path(key.clone()))?;
        out.insert(key.clone(), result.value.clone());
        metadata.add_step(result, vec![Annotation::object_key(key)]);
    }
    Ok(Evaluation {
        metadata,
        value: Value::Map(out),
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Engine
// ══════════════════════════════════════════════════════════════════════════════

/// Depth-bounded recursive walker.
///
/// Cheap to clone: clones share the visitor.
pub struct Engine<R: ReferenceId> {
    visitor: Rc<dyn Visitor<R>>,
}

impl<R: ReferenceId> Clone for Engine<R> {
    fn clone(&self) -> Self {
        Self {
            visitor: Rc::clone(&self.visitor),
        }
    }
}

impl<R: ReferenceId> Default for Engine<R> {
    fn default() -> Self {
        Self::new(DefaultVisitor)
    }
}

impl<R: ReferenceId> Engine<R> {
    pub fn new(visitor: impl Visitor<R> + 'static) -> Self {
        Self {
            visitor: Rc::new(visitor),
        }
    }

    /// This engine as a shareable evaluator.
    pub fn to_dyn(&self) -> DynEvaluator<R> {
        Rc::new(self.clone())
    }
}

impl<R: ReferenceId> Evaluator<R> for Engine<R> {
    fn evaluate(&self, ctx: &Context, value: &Value<R>, depth: i32) -> EvalResult<Evaluation<R>> {
        if depth == 0 {
            return Ok(Evaluation::new(value.clone()));
        }
        ctx.check()?;
        let next = self.to_dyn();
        match value {
            Value::Expandable(e) => self.visitor.visit_expandable(ctx, e, depth, &next),
            Value::List(items) => self.visitor.visit_list(ctx, items, depth, &next),
            Value::Map(map) => self.visitor.visit_map(ctx, map, depth, &next),
            Value::String(s) => self.visitor.visit_string(ctx, s, depth, &next),
            scalar => Ok(Evaluation::new(scalar.clone())),
        }
    }
}

// ── Combinators ──────────────────────────────────────────────────────────────

/// Evaluate until only scalars remain.
pub fn evaluate_all<R: ReferenceId>(
    evaluator: &dyn Evaluator<R>,
    ctx: &Context,
    value: &Value<R>,
) -> EvalResult<Evaluation<R>> {
    evaluator.evaluate(ctx, value, DEPTH_FULL)
}

/// The preferred evaluator when there is one, otherwise the fallback.
pub fn coalesce_evaluators<R: ReferenceId>(
    preferred: Option<DynEvaluator<R>>,
    fallback: &DynEvaluator<R>,
) -> DynEvaluator<R> {
    preferred.unwrap_or_else(|| Rc::clone(fallback))
}
