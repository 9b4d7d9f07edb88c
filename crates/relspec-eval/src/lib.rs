//! Evaluator for relspec documents.
//!
//! A document is a JSON-compatible tree that may embed typed references to
//! external values, encoded data, function invocations and templates.
//! Evaluating it produces a value and a [`ReferenceLog`] recording which
//! external identifiers were consulted and whether they resolved, so a
//! caller can tell a finished value from one still waiting on its inputs.
//!
//! ```ignore
//! let evaluator = relspec::RelspecOptions::new()
//!     .with_mapping_type_resolver("Env", resolve_env)
//!     .build();
//! let result = evaluator.evaluate_all(&Context::new(), &document)?;
//! if result.ok() { /* use result.value */ }
//! ```
//!
//! [`ReferenceLog`]: relspec_types::ReferenceLog

pub mod engine;
pub mod expandable;
pub mod fnlib;
pub mod func;
pub mod jsonpath;
pub mod pathlang;
pub mod query;
pub mod relspec;

pub use engine::{coalesce_evaluators, evaluate_all, DefaultVisitor, Engine, Visitor};
pub use expandable::{MemoizedExpandable, StaticExpandable, ValueExpandable};
pub use func::{Descriptor, Library};
pub use pathlang::{PathLanguage, PathTemplate};
pub use query::{evaluate_query, Language, QueryOptions};
pub use relspec::{Evaluator, MappingTypeResolver, RelspecOptions, TemplateLanguage};
