use std::collections::BTreeMap;
use std::rc::Rc;

use relspec_jsonpath::{JsonPathOptions, JsonPathTemplate};
use relspec_types::{
    Context, DynEvaluator, DynExpandable, EvalResult, Evaluation, Map, ReferenceId, Value,
};
use tracing::debug;

use super::encoding::{encoding_wrapper, resolve_encoding};
use super::invocation::{invocation, resolve_invocation};
use super::resolver::{resolve_typed_mapping, DynMappingTypeResolver, TYPE_KEY};
use super::TemplateLanguage;
use crate::engine::{walk_expandable, walk_list, walk_map, Visitor};
use crate::func::Library;
use crate::jsonpath::render_jsonpath_template;
use crate::pathlang::{PathLanguage, PathTemplate};

/// Recognizes typed mappings, encoding wrappers, invocations and templates.
pub(super) struct RelspecVisitor<R: ReferenceId> {
    pub(super) resolvers: BTreeMap<String, DynMappingTypeResolver<R>>,
    pub(super) library: Rc<Library<R>>,
    pub(super) path: PathLanguage<R>,
    pub(super) environment: Value<R>,
    pub(super) template_language: TemplateLanguage,
    pub(super) jsonpath: JsonPathOptions,
    pub(super) keep_steps: bool,
}

impl<R: ReferenceId> RelspecVisitor<R> {
    fn finish(&self, result: EvalResult<Evaluation<R>>) -> EvalResult<Evaluation<R>> {
        if self.keep_steps {
            result
        } else {
            result.map(Evaluation::reduce)
        }
    }

    fn map(
        &self,
        ctx: &Context,
        map: &Map<R>,
        depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        if let Some(type_name) = map.get(TYPE_KEY).and_then(Value::as_str) {
            return match self.resolvers.get(type_name) {
                Some(resolver) => {
                    resolve_typed_mapping(ctx, type_name, map, resolver.as_ref(), depth, next)
                }
                None => {
                    debug!(type_name, "no resolver for typed mapping");
                    Ok(Evaluation::new(Value::Map(map.clone())))
                }
            };
        }
        if let Some((encoding, data)) = encoding_wrapper(map) {
            return resolve_encoding(ctx, encoding, data, next);
        }
        if let Some((key, name, args)) = invocation(map) {
            return resolve_invocation(ctx, &self.library, key, name, args, depth, next);
        }
        walk_map(ctx, map, depth, next)
    }

    fn string(&self, ctx: &Context, s: &str, next: &DynEvaluator<R>) -> EvalResult<Evaluation<R>> {
        match self.template_language {
            TemplateLanguage::Path if s.contains("${") => {
                let template = PathTemplate::parse(s)?;
                self.path
                    .evaluate_template(ctx, &template, &self.environment, next)
            }
            TemplateLanguage::JsonPath if s.contains('{') => {
                let template = JsonPathTemplate::parse_with(s, self.jsonpath)?;
                render_jsonpath_template(ctx, next, &template, &self.environment)
            }
            _ => Ok(Evaluation::new(Value::String(s.to_string()))),
        }
    }
}

impl<R: ReferenceId> Visitor<R> for RelspecVisitor<R> {
    fn visit_expandable(
        &self,
        ctx: &Context,
        expandable: &DynExpandable<R>,
        depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        self.finish(walk_expandable(ctx, expandable, depth, next))
    }

    fn visit_list(
        &self,
        ctx: &Context,
        items: &[Value<R>],
        depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        self.finish(walk_list(ctx, items, depth, next))
    }

    fn visit_map(
        &self,
        ctx: &Context,
        map: &Map<R>,
        depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        self.finish(self.map(ctx, map, depth, next))
    }

    fn visit_string(
        &self,
        ctx: &Context,
        s: &str,
        _depth: i32,
        next: &DynEvaluator<R>,
    ) -> EvalResult<Evaluation<R>> {
        self.finish(self.string(ctx, s, next))
    }
}
