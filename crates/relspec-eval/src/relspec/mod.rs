//! The relspec evaluator.
//!
//! Extends the default walk with the reserved document forms:
//!
//! - `{"$type": "<Name>", …}` is resolved by the [`MappingTypeResolver`]
//!   registered for `<Name>`. Mappings of an unregistered type are left as
//!   they are.
//! - `{"$encoding": "base64" | "base64url" | "utf8", "data": …}` decodes
//!   `data` to a string.
//! - `{"$fn.<name>": args}` invokes a library function. A list is passed
//!   positionally, a mapping by keyword, and anything else as the single
//!   positional argument.
//! - Strings containing `${…}` (or `{…}` in the JSONPath dialect) are
//!   templates evaluated against the template environment.
//!
//! Anything that cannot be resolved yet evaluates to an equivalent
//! document, with the blocking references in its log, so the result can be
//! evaluated again once those references are available.

mod encoding;
mod invocation;
mod resolver;
mod visitor;

pub use encoding::{decode, encode, DATA_KEY, ENCODINGS, ENCODING_KEY};
pub use invocation::FUNCTION_PREFIX;
pub use resolver::{DynMappingTypeResolver, MappingTypeResolver, TYPE_KEY};

use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use relspec_jsonpath::JsonPathOptions;
use relspec_types::{
    Context, DynEvaluator, EvalResult, Evaluation, Evaluator as EvaluatorTrait, Map, ReferenceId,
    Value,
};
use serde::{Deserialize, Serialize};

use crate::engine::{evaluate_all, Engine};
use crate::func::{Descriptor, Library};
use crate::pathlang::PathLanguage;
use visitor::RelspecVisitor;

/// The dialect of strings embedded in documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateLanguage {
    /// `${expression}` fragments in the path language.
    #[default]
    Path,
    /// `{…}` and `{range …}…{end}` fragments in JSONPath.
    #[serde(rename = "jsonpath")]
    JsonPath,
}

impl fmt::Display for TemplateLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateLanguage::Path => f.write_str("path"),
            TemplateLanguage::JsonPath => f.write_str("jsonpath"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Options
// ══════════════════════════════════════════════════════════════════════════════

/// Builds an [`Evaluator`].
///
/// ```ignore
/// let evaluator = RelspecOptions::new()
///     .with_mapping_type_resolver("Secret", resolve_secret)
///     .with_template_variable("region", "eu-west-1")
///     .build();
/// let result = evaluator.evaluate_all(&Context::new(), &document)?;
/// ```
pub struct RelspecOptions<R: ReferenceId> {
    resolvers: BTreeMap<String, DynMappingTypeResolver<R>>,
    library: Library<R>,
    environment: Map<R>,
    template_language: TemplateLanguage,
    jsonpath: JsonPathOptions,
    eager: bool,
    keep_steps: bool,
}

impl<R: ReferenceId> Default for RelspecOptions<R> {
    fn default() -> Self {
        Self {
            resolvers: BTreeMap::new(),
            library: Library::standard(),
            environment: Map::new(),
            template_language: TemplateLanguage::default(),
            jsonpath: JsonPathOptions::default(),
            eager: false,
            keep_steps: false,
        }
    }
}

impl<R: ReferenceId> RelspecOptions<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping_type_resolver(
        mut self,
        type_name: impl Into<String>,
        resolver: impl MappingTypeResolver<R> + 'static,
    ) -> Self {
        self.resolvers.insert(type_name.into(), Rc::new(resolver));
        self
    }

    /// Replace the function library. Defaults to [`Library::standard`].
    pub fn with_library(mut self, library: Library<R>) -> Self {
        self.library = library;
        self
    }

    /// Add or replace one function.
    pub fn with_function(
        mut self,
        name: impl Into<String>,
        descriptor: impl Descriptor<R> + 'static,
    ) -> Self {
        self.library = self.library.with(name, descriptor);
        self
    }

    /// Replace the variables templates are evaluated against.
    pub fn with_template_environment(mut self, environment: Map<R>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_template_variable(mut self, name: impl Into<String>, value: impl Into<Value<R>>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }

    pub fn with_template_language(mut self, language: TemplateLanguage) -> Self {
        self.template_language = language;
        self
    }

    /// Options for templates in the JSONPath dialect.
    pub fn with_jsonpath_options(mut self, options: JsonPathOptions) -> Self {
        self.jsonpath = options;
        self
    }

    /// Evaluate every argument and both sides of `&&`/`||`, so that all
    /// references an expression could consult appear in the log.
    pub fn with_eager_evaluation(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    /// Keep the step chain of every result.
    pub fn with_steps(mut self, keep_steps: bool) -> Self {
        self.keep_steps = keep_steps;
        self
    }

    pub fn build(self) -> Evaluator<R> {
        let eager = self.eager;
        let configured = self.library;
        let library = Rc::new_cyclic(|scope: &Weak<Library<R>>| {
            let bound = configured.bind(scope, eager);
            if eager {
                bound.eager()
            } else {
                bound
            }
        });
        let path = PathLanguage::new(Rc::clone(&library)).with_eager_evaluation(self.eager);
        let visitor = RelspecVisitor {
            resolvers: self.resolvers,
            library,
            path,
            environment: Value::Map(self.environment),
            template_language: self.template_language,
            jsonpath: self.jsonpath,
            keep_steps: self.keep_steps,
        };
        Evaluator {
            engine: Engine::new(visitor),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Evaluator
// ══════════════════════════════════════════════════════════════════════════════

/// Evaluates documents containing reserved forms.
pub struct Evaluator<R: ReferenceId> {
    engine: Engine<R>,
}

impl<R: ReferenceId> Clone for Evaluator<R> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<R: ReferenceId> Default for Evaluator<R> {
    fn default() -> Self {
        RelspecOptions::new().build()
    }
}

impl<R: ReferenceId> Evaluator<R> {
    pub fn to_dyn(&self) -> DynEvaluator<R> {
        self.engine.to_dyn()
    }

    pub fn evaluate_all(&self, ctx: &Context, value: &Value<R>) -> EvalResult<Evaluation<R>> {
        evaluate_all(&self.engine, ctx, value)
    }
}

impl<R: ReferenceId> EvaluatorTrait<R> for Evaluator<R> {
    fn evaluate(&self, ctx: &Context, value: &Value<R>, depth: i32) -> EvalResult<Evaluation<R>> {
        self.engine.evaluate(ctx, value, depth)
    }
}
