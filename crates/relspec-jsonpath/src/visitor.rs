//! Traversal hooks.
//!
//! The evaluator never looks inside a value itself: every step goes
//! through a [`VariableVisitor`], so callers can resolve lazily computed
//! values before they are indexed, and record what they touched.

use std::fmt;

use relspec_types::{ReferenceId, Value};

use crate::ast::Key;
use crate::error::{JsonPathError, JsonPathResult};

/// The key under which a value was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    /// The value a recursive descent started from.
    Current,
    Name(String),
    Index(usize),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Current => f.write_str("@"),
            PathKey::Name(name) => f.write_str(name),
            PathKey::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A selected value with its key.
#[derive(Debug, Clone)]
pub struct PathValue<R: ReferenceId> {
    pub key: PathKey,
    pub value: Value<R>,
}

impl<R: ReferenceId> PathValue<R> {
    pub fn new(key: PathKey, value: Value<R>) -> Self {
        Self { key, value }
    }
}

/// Hooks the evaluator calls to traverse values.
///
/// Only [`resolve`](VariableVisitor::resolve) and
/// [`visit_value`](VariableVisitor::visit_value) usually need overriding;
/// the selection hooks resolve the parent and then select structurally.
pub trait VariableVisitor<R: ReferenceId> {
    /// Prepare a value for traversal.
    fn resolve(&self, value: &Value<R>) -> JsonPathResult<Value<R>> {
        reject_expandable(value)?;
        Ok(value.clone())
    }

    /// Finalize a selected value before it is returned or compared.
    fn visit_value(&self, value: Value<R>) -> JsonPathResult<Value<R>> {
        reject_expandable(&value)?;
        Ok(value)
    }

    fn visit_child(&self, parent: &Value<R>, key: &Key) -> JsonPathResult<Value<R>> {
        select_child(&self.resolve(parent)?, key)
    }

    fn visit_wildcard(&self, parent: &Value<R>) -> JsonPathResult<Vec<PathValue<R>>> {
        Ok(children(&self.resolve(parent)?))
    }

    fn visit_range(
        &self,
        parent: &Value<R>,
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    ) -> JsonPathResult<Vec<PathValue<R>>> {
        select_range(&self.resolve(parent)?, start, end, step)
    }

    /// The value itself followed by all of its descendants, pre-order.
    fn visit_recursive_descent(&self, value: &Value<R>) -> JsonPathResult<Vec<PathValue<R>>> {
        let mut out = vec![PathValue::new(PathKey::Current, value.clone())];
        descend(self, value, &mut out)?;
        Ok(out)
    }
}

fn descend<R: ReferenceId, V: VariableVisitor<R> + ?Sized>(
    visitor: &V,
    value: &Value<R>,
    out: &mut Vec<PathValue<R>>,
) -> JsonPathResult<()> {
    for child in visitor.visit_wildcard(value)? {
        let value = child.value.clone();
        out.push(child);
        descend(visitor, &value, out)?;
    }
    Ok(())
}

/// Traverses plain values only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVariableVisitor;

impl<R: ReferenceId> VariableVisitor<R> for DefaultVariableVisitor {}

fn reject_expandable<R: ReferenceId>(value: &Value<R>) -> JsonPathResult<()> {
    if value.is_expandable() {
        return Err(JsonPathError::UnknownVariableType {
            type_name: value.type_name().to_string(),
        });
    }
    Ok(())
}

// ── Structural selection ─────────────────────────────────────────────────────

/// Select one child of a list or map.
///
/// Negative indices count from the end. A name that parses as an integer
/// indexes lists; an integer key looks up its decimal form in maps.
pub fn select_child<R: ReferenceId>(parent: &Value<R>, key: &Key) -> JsonPathResult<Value<R>> {
    match (parent, key) {
        (Value::List(items), Key::Index(index)) => list_item(items, *index),
        (Value::List(items), Key::Name(name)) => match name.parse::<i64>() {
            Ok(index) => list_item(items, index),
            Err(_) => Err(JsonPathError::KeyParse { key: name.clone() }),
        },
        (Value::Map(map), Key::Name(name)) => map
            .get(name)
            .cloned()
            .ok_or_else(|| JsonPathError::KeyParse { key: name.clone() }),
        (Value::Map(map), Key::Index(index)) => {
            let name = index.to_string();
            map.get(&name)
                .cloned()
                .ok_or(JsonPathError::KeyParse { key: name })
        }
        (value, key) if value.is_expandable() => Err(JsonPathError::UnknownVariableType {
            type_name: format!("{} (selecting {key})", value.type_name()),
        }),
        (value, key) => Err(JsonPathError::PathResolution {
            selector: key.to_string(),
            type_name: value.type_name().to_string(),
        }),
    }
}

fn list_item<R: ReferenceId>(items: &[Value<R>], index: i64) -> JsonPathResult<Value<R>> {
    let len = items.len();
    let resolved = if index < 0 {
        i64::try_from(len).ok().and_then(|len| len.checked_add(index))
    } else {
        Some(index)
    };
    resolved
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(JsonPathError::IndexParse { index, len })
}

/// Every child of a list or map; maps in key order, scalars have none.
pub fn children<R: ReferenceId>(value: &Value<R>) -> Vec<PathValue<R>> {
    match value {
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| PathValue::new(PathKey::Index(i), v.clone()))
            .collect(),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| PathValue::new(PathKey::Name(k.clone()), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Slice a list.
///
/// Negative bounds count from the end. A negative step walks from
/// `end - 1` down to `start`; a zero step selects nothing.
pub fn select_range<R: ReferenceId>(
    parent: &Value<R>,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> JsonPathResult<Vec<PathValue<R>>> {
    let Value::List(items) = parent else {
        return Err(JsonPathError::PathResolution {
            selector: "range".to_string(),
            type_name: parent.type_name().to_string(),
        });
    };
    let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let normalize = |bound: i64| {
        if bound < 0 {
            (len + bound).max(0)
        } else {
            bound.min(len)
        }
    };
    let lo = start.map(normalize).unwrap_or(0);
    let hi = end.map(normalize).unwrap_or(len);
    let step = step.unwrap_or(1);

    let pick = |i: i64| {
        let i = i as usize;
        PathValue::new(PathKey::Index(i), items[i].clone())
    };
    let mut out = Vec::new();
    if step > 0 {
        let mut i = lo;
        while i < hi {
            out.push(pick(i));
            i = i.saturating_add(step);
        }
    } else if step < 0 {
        let mut i = hi - 1;
        while i >= lo {
            out.push(pick(i));
            i = i.saturating_add(step);
        }
    }
    Ok(out)
}
