//! `$type` mappings.

use std::rc::Rc;

use relspec_types::{
    Annotation, Context, DynEvaluator, EvalError, EvalResult, Evaluation, Map, Metadata,
    ReferenceId, Value, DEPTH_FULL,
};
use tracing::debug;

use crate::engine::coalesce_evaluators;

/// The key that marks a typed mapping.
pub const TYPE_KEY: &str = "$type";

/// Computes the value of a `{"$type": …}` mapping.
///
/// `fields` holds every other entry of the mapping, already fully
/// evaluated. A resolver reports a missing or failed external value as an
/// unresolved or errored reference in its result; an `Err` means the mapping
/// itself is malformed.
pub trait MappingTypeResolver<R: ReferenceId> {
    fn resolve(&self, ctx: &Context, fields: &Map<R>) -> EvalResult<Evaluation<R>>;
}

impl<R, F> MappingTypeResolver<R> for F
where
    R: ReferenceId,
    F: Fn(&Context, &Map<R>) -> EvalResult<Evaluation<R>>,
{
    fn resolve(&self, ctx: &Context, fields: &Map<R>) -> EvalResult<Evaluation<R>> {
        self(ctx, fields)
    }
}

pub type DynMappingTypeResolver<R> = Rc<dyn MappingTypeResolver<R>>;

/// Resolve a typed mapping with `resolver`.
///
/// Fields are evaluated first. If any is unresolved, or the resolver's own
/// result is not ok, the mapping is rebuilt from the partially evaluated
/// fields so it can be evaluated again later.
pub(super) fn resolve_typed_mapping<R: ReferenceId>(
    ctx: &Context,
    type_name: &str,
    map: &Map<R>,
    resolver: &dyn MappingTypeResolver<R>,
    depth: i32,
    next: &DynEvaluator<R>,
) -> EvalResult<Evaluation<R>> {
    let mut metadata = Metadata {
        annotation: Some(Annotation::typed_mapping(type_name)),
        ..Metadata::default()
    };
    let mut fields = Map::new();
    for (key, value) in map.iter().filter(|(k, _)| k.as_str() != TYPE_KEY) {
        ctx.check()?;
        let result = next
            .evaluate(ctx, value, DEPTH_FULL)
            .map_err(|e| e.at_path(key.clone()))?;
        fields.insert(key.clone(), result.value.clone());
        metadata.add_step(result, vec![Annotation::object_key(key)]);
    }
    if !metadata.references.ok() {
        return Ok(Evaluation {
            metadata,
            value: rebuild(type_name, fields),
        });
    }

    let resolved = resolver
        .resolve(ctx, &fields)
        .map_err(|e| EvalError::InvalidType {
            type_name: type_name.to_string(),
            cause: Box::new(e),
        })?;
    debug!(
        type_name,
        ok = resolved.ok(),
        references = resolved.references().len(),
        "resolved typed mapping"
    );
    if !resolved.ok() {
        metadata.add_step(resolved, Vec::new());
        return Ok(Evaluation {
            metadata,
            value: rebuild(type_name, fields),
        });
    }

    let evaluator = coalesce_evaluators(resolved.metadata.evaluator.clone(), next);
    let walked = evaluator.evaluate(ctx, &resolved.value, depth)?;
    let value = walked.value.clone();
    metadata.add_step(resolved, Vec::new());
    metadata.add_step(walked, Vec::new());
    Ok(Evaluation { metadata, value })
}

fn rebuild<R: ReferenceId>(type_name: &str, mut fields: Map<R>) -> Value<R> {
    fields.insert(TYPE_KEY.to_string(), Value::String(type_name.to_string()));
    Value::Map(fields)
}
