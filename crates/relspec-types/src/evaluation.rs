//! Evaluation results, their metadata, and the two core traits.
//!
//! Every evaluation returns an [`Evaluation`]: the produced [`Value`] plus
//! [`Metadata`] carrying the reference log and, for debugging, the chain of
//! child steps that contributed to it.

use crate::context::Context;
use crate::error::EvalResult;
use crate::reference::{ReferenceId, ReferenceLog};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Depth meaning "recurse until only scalars remain".
pub const DEPTH_FULL: i32 = -1;

/// The depth to use one level further down. Negative depths stay unbounded.
pub fn next_depth(depth: i32) -> i32 {
    if depth < 0 {
        depth
    } else {
        (depth - 1).max(0)
    }
}

// ── Traits ───────────────────────────────────────────────────────────────────

/// A value that defers its own resolution.
pub trait Expandable<R: ReferenceId> {
    fn expand(&self, ctx: &Context, depth: i32) -> EvalResult<Evaluation<R>>;
}

/// Anything that can evaluate a value to a given depth.
pub trait Evaluator<R: ReferenceId> {
    fn evaluate(&self, ctx: &Context, value: &Value<R>, depth: i32) -> EvalResult<Evaluation<R>>;
}

pub type DynEvaluator<R> = Rc<dyn Evaluator<R>>;
pub type DynExpandable<R> = Rc<dyn Expandable<R>>;

// ── Annotation ───────────────────────────────────────────────────────────────

/// Why a step contributed to its parent. Purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub description: String,
}

impl Annotation {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            description: description.into(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn array_index(index: usize) -> Self {
        Self::new("array-index", format!("array index {index}"))
            .with_attribute("index", index.to_string())
    }

    pub fn object_key(key: &str) -> Self {
        Self::new("object-key", format!("object key {key:?}")).with_attribute("key", key)
    }

    /// `index` is zero-based; the description is one-based.
    pub fn positional_argument(index: usize) -> Self {
        Self::new("function-argument", format!("argument {}", index + 1))
            .with_attribute("position", (index + 1).to_string())
    }

    pub fn keyword_argument(name: &str) -> Self {
        Self::new("function-argument", format!("argument {name:?}")).with_attribute("name", name)
    }

    pub fn invocation(name: &str) -> Self {
        Self::new("invocation", format!("invocation of {name}")).with_attribute("name", name)
    }

    pub fn typed_mapping(type_name: &str) -> Self {
        Self::new("typed-mapping", format!("resolution of type {type_name:?}"))
            .with_attribute("type", type_name)
    }

    pub fn encoding(encoding: &str) -> Self {
        Self::new("encoding", format!("decoding of {encoding} data"))
            .with_attribute("encoding", encoding)
    }

    pub fn expression(language: &str, source: &str) -> Self {
        Self::new("expression", format!("{language} expression {source:?}"))
            .with_attribute("language", language)
    }
}

// ── Metadata and results ─────────────────────────────────────────────────────

/// One contributing sub-result.
#[derive(Debug, Clone)]
pub struct Step<R: ReferenceId> {
    pub evaluation: Evaluation<R>,
    pub annotations: Vec<Annotation>,
}

/// Everything known about how a value was produced.
#[derive(Clone)]
pub struct Metadata<R: ReferenceId> {
    pub annotation: Option<Annotation>,
    pub references: ReferenceLog<R>,
    pub steps: Vec<Step<R>>,
    /// Preferred evaluator for continuing evaluation of the value.
    pub evaluator: Option<DynEvaluator<R>>,
}

impl<R: ReferenceId> Default for Metadata<R> {
    fn default() -> Self {
        Self {
            annotation: None,
            references: ReferenceLog::new(),
            steps: Vec::new(),
            evaluator: None,
        }
    }
}

impl<R: ReferenceId> Metadata<R> {
    /// Record a child result; its references merge into this log.
    pub fn add_step(&mut self, evaluation: Evaluation<R>, annotations: Vec<Annotation>) {
        self.references.merge(&evaluation.metadata.references);
        self.steps.push(Step {
            evaluation,
            annotations,
        });
    }

    pub fn merge_references(&mut self, log: &ReferenceLog<R>) {
        self.references.merge(log);
    }
}

impl<R: ReferenceId> fmt::Debug for Metadata<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("annotation", &self.annotation)
            .field("references", &self.references)
            .field("steps", &self.steps)
            .field("evaluator", &self.evaluator.is_some())
            .finish()
    }
}

/// A value together with its metadata.
#[derive(Debug, Clone)]
pub struct Evaluation<R: ReferenceId> {
    pub metadata: Metadata<R>,
    pub value: Value<R>,
}

impl<R: ReferenceId> Evaluation<R> {
    /// Wrap a value with empty metadata.
    pub fn new(value: Value<R>) -> Self {
        Self {
            metadata: Metadata::default(),
            value,
        }
    }

    pub fn with_references(value: Value<R>, references: ReferenceLog<R>) -> Self {
        Self {
            metadata: Metadata {
                references,
                ..Metadata::default()
            },
            value,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.metadata.annotation = Some(annotation);
        self
    }

    pub fn with_evaluator(mut self, evaluator: DynEvaluator<R>) -> Self {
        self.metadata.evaluator = Some(evaluator);
        self
    }

    pub fn references(&self) -> &ReferenceLog<R> {
        &self.metadata.references
    }

    /// Every used reference resolved without error.
    pub fn ok(&self) -> bool {
        self.metadata.references.ok()
    }

    /// Every used reference resolved.
    pub fn resolved(&self) -> bool {
        self.metadata.references.resolved()
    }

    /// Discard the step chain, keeping the value and references.
    pub fn reduce(mut self) -> Self {
        self.metadata.steps.clear();
        self
    }
}
