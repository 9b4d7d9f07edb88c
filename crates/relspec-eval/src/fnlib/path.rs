//! `path`: evaluate a path expression against a value.

use std::rc::{Rc, Weak};

use relspec_types::{
    Annotation, Context, DynEvaluator, EvalError, EvalResult, Evaluation, Map, Metadata,
    ReferenceId, Value, DEPTH_FULL,
};

use super::string_arg;
use crate::func::{
    invoker, unresolved_keyword, unresolved_positional, Descriptor, DynDescriptor, DynInvoker,
    KeywordArgs, Library, PositionalArgs,
};
use crate::pathlang::{parse_expression, PathLanguage};

/// Until bound to a library, queries see only the builtins.
pub(super) struct Path<R: ReferenceId> {
    scope: Weak<Library<R>>,
    eager: bool,
}

impl<R: ReferenceId> Path<R> {
    pub(super) fn new() -> Self {
        Self {
            scope: Weak::new(),
            eager: false,
        }
    }

    fn language(&self) -> PathLanguage<R> {
        match self.scope.upgrade() {
            Some(library) => PathLanguage::new(library).with_eager_evaluation(self.eager),
            None => PathLanguage::new(Rc::new(Library::standard())),
        }
    }
}

impl<R: ReferenceId> Descriptor<R> for Path<R> {
    fn description(&self) -> &str {
        "selects from an object with a path expression, falling back to a default"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity_range(2, Some(3))?;
        let arg = |i: usize| args.get(i).map(|a| a.value.clone());
        let call = PathCall {
            object: arg(0).unwrap_or(Value::Null),
            query: arg(1).unwrap_or(Value::Null),
            default: arg(2),
            shape: Shape::Positional,
            language: self.language(),
        };
        Ok(call.into_invoker(evaluator))
    }

    fn keyword_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: KeywordArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_names(&["object", "query", "default"])?;
        let call = PathCall {
            object: args.require("object")?.value,
            query: args.require("query")?.value,
            default: args.get("default").map(|a| a.value),
            shape: Shape::Keyword,
            language: self.language(),
        };
        Ok(call.into_invoker(evaluator))
    }

    fn bind_library(&self, scope: &Weak<Library<R>>, eager: bool) -> Option<DynDescriptor<R>> {
        Some(Rc::new(Path {
            scope: scope.clone(),
            eager,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Positional,
    Keyword,
}

const NAMES: [&str; 3] = ["object", "query", "default"];

impl Shape {
    fn blame(self, arg: usize, err: EvalError) -> EvalError {
        match self {
            Shape::Positional => err.for_positional_arg(arg),
            Shape::Keyword => err.for_keyword_arg(NAMES[arg]),
        }
    }

    fn annotation(self, arg: usize) -> Annotation {
        match self {
            Shape::Positional => Annotation::positional_argument(arg),
            Shape::Keyword => Annotation::keyword_argument(NAMES[arg]),
        }
    }

    /// The argument container of an invocation that cannot run yet.
    fn placeholder<R: ReferenceId>(self, values: Vec<Value<R>>, metadata: Metadata<R>) -> Evaluation<R> {
        match self {
            Shape::Positional => unresolved_positional(values, metadata),
            Shape::Keyword => {
                let map: Map<R> = NAMES
                    .iter()
                    .map(|n| n.to_string())
                    .zip(values)
                    .collect();
                unresolved_keyword(map, metadata)
            }
        }
    }
}

struct PathCall<R: ReferenceId> {
    object: Value<R>,
    query: Value<R>,
    default: Option<Value<R>>,
    shape: Shape,
    language: PathLanguage<R>,
}

impl<R: ReferenceId> PathCall<R> {
    fn into_invoker(self, evaluator: DynEvaluator<R>) -> DynInvoker<R> {
        invoker(move |ctx: &Context| self.invoke(ctx, &evaluator))
    }

    fn invoke(&self, ctx: &Context, evaluator: &DynEvaluator<R>) -> EvalResult<Evaluation<R>> {
        let shape = self.shape;
        let mut metadata = Metadata::default();
        let mut values = Vec::with_capacity(3);
        for (i, arg) in [&self.object, &self.query].into_iter().enumerate() {
            let result = evaluator
                .evaluate(ctx, arg, DEPTH_FULL)
                .map_err(|e| shape.blame(i, e))?;
            values.push(result.value.clone());
            metadata.add_step(result, vec![shape.annotation(i)]);
        }
        if !metadata.references.ok() {
            values.extend(self.default.clone());
            return Ok(shape.placeholder(values, metadata));
        }

        let source = string_arg(&values[1]).map_err(|e| shape.blame(1, e))?;
        let expr = parse_expression(source).map_err(|e| shape.blame(1, e))?;
        let selected = match self.language.eval_full(ctx, &expr, &values[0], evaluator) {
            Ok(selected) => selected,
            Err(e) if e.is_not_exists() => match &self.default {
                Some(default) => {
                    let result = evaluator
                        .evaluate(ctx, default, DEPTH_FULL)
                        .map_err(|e| shape.blame(2, e))?;
                    metadata.add_step(result.clone(), vec![shape.annotation(2)]);
                    return Ok(Evaluation {
                        metadata,
                        value: result.value,
                    });
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        };
        let value = selected.value.clone();
        metadata.add_step(selected, Vec::new());
        Ok(Evaluation { metadata, value })
    }
}
