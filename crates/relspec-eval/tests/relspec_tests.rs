//! End-to-end evaluation of documents with reserved forms.
//!
//! Covers: typed references, partially resolved invocations, queries in
//! every language, merge modes, `exists` and `path` defaults, short-circuit
//! reference discipline, unknown types and cancellation.

use std::io;

use chrono::{TimeZone, Utc};
use relspec_eval::func::{evaluated_positional, Descriptor, DynInvoker, PositionalArgs};
use relspec_eval::{
    evaluate_query, Language, PathLanguage, QueryOptions, RelspecOptions, TemplateLanguage,
};
use relspec_types::{
    CancelHandle, Context, DynEvaluator, EvalError, EvalResult, Evaluation, FixedClock, Map,
    Reference, ReferenceLog, Value,
};
use serde_json::json;

type V = Value<String>;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn doc(json: serde_json::Value) -> V {
    Value::from(json)
}

/// Resolves `{"$type": "Env", "name": n}` from `env`; missing names are
/// errored references.
fn env_resolver(
    env: serde_json::Value,
) -> impl Fn(&Context, &Map<String>) -> EvalResult<Evaluation<String>> {
    move |_ctx: &Context, fields: &Map<String>| {
        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut log = ReferenceLog::new();
        match env.get(&name) {
            Some(value) => {
                log.set(Reference::ok(name));
                Ok(Evaluation::with_references(doc(value.clone()), log))
            }
            None => {
                let err = io::Error::new(io::ErrorKind::NotFound, format!("{name} not found"));
                log.set(Reference::errored(name, err));
                Ok(Evaluation::with_references(Value::Null, log))
            }
        }
    }
}

fn evaluator(env: serde_json::Value) -> relspec_eval::Evaluator<String> {
    RelspecOptions::new()
        .with_mapping_type_resolver("Env", env_resolver(env))
        .build()
}

fn env_ref(name: &str) -> serde_json::Value {
    json!({"$type": "Env", "name": name})
}

fn query(
    language: Language,
    source: &str,
    document: serde_json::Value,
    options: &QueryOptions<String>,
) -> EvalResult<Evaluation<String>> {
    let evaluator = evaluator(json!({"t": true, "f": false, "x": 1}));
    evaluate_query(
        &Context::new(),
        &evaluator.to_dyn(),
        language,
        source,
        &doc(document),
        options,
    )
}

fn ids(log: &ReferenceLog<String>) -> Vec<String> {
    log.iter().map(|r| r.id.clone()).collect()
}

/// `double(n)`: twice an integer.
struct Double;

impl Descriptor<String> for Double {
    fn description(&self) -> &str {
        "doubles an integer"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<String>,
        args: PositionalArgs<String>,
    ) -> EvalResult<DynInvoker<String>> {
        args.check_arity(1, false)?;
        Ok(evaluated_positional(evaluator, args, |_ctx: &Context, values: Vec<V>| {
            match values.first() {
                Some(Value::Int(n)) => Ok(Evaluation::new(Value::Int(n * 2))),
                other => Err(EvalError::unexpected_type(
                    &["int"],
                    other.map_or("null", |v| v.type_name()),
                )),
            }
        }))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scenarios
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_typed_reference_resolves() {
    let result = evaluator(json!({"foo": "bar"}))
        .evaluate_all(&Context::new(), &doc(json!({"a": env_ref("foo")})))
        .unwrap();
    assert_eq!(result.value, doc(json!({"a": "bar"})));
    assert_eq!(ids(result.references()), vec!["foo"]);
    assert!(result.references().get(&"foo".to_string()).unwrap().is_ok());
    assert!(result.ok());
}

#[test]
fn test_partially_resolved_concat() {
    let input = json!({"$fn.concat": [env_ref("first"), env_ref("second")]});
    let result = evaluator(json!({"first": "hi"}))
        .evaluate_all(&Context::new(), &doc(input))
        .unwrap();
    assert_eq!(
        result.value,
        doc(json!({"$fn.concat": ["hi", env_ref("second")]}))
    );
    let log = result.references();
    assert_eq!(ids(log), vec!["first", "second"]);
    assert!(log.get(&"first".to_string()).unwrap().is_ok());
    let second = log.get(&"second".to_string()).unwrap();
    assert!(second.error.is_some());
    assert!(!result.ok());
}

#[test]
fn test_partial_result_evaluates_again_once_resolved() {
    let ctx = Context::new();
    let input = doc(json!({"$fn.concat": [env_ref("first"), "-", env_ref("second")]}));
    let partial = evaluator(json!({"first": "a"}))
        .evaluate_all(&ctx, &input)
        .unwrap();
    assert!(!partial.ok());
    let complete = evaluator(json!({"first": "a", "second": "b"}))
        .evaluate_all(&ctx, &partial.value)
        .unwrap();
    assert_eq!(complete.value, doc(json!("a-b")));
    assert!(complete.ok());
}

#[test]
fn test_path_expression_with_pipe() {
    let result = query(
        Language::Path,
        r#"jsonUnmarshal('{"x":{"y":"z"}}') |> x.y"#,
        json!({}),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, doc(json!("z")));
}

#[test]
fn test_jsonpath_wildcard() {
    let result = query(
        Language::JsonPath,
        "$.welcome.message[*]",
        json!({"welcome": {"message": ["Good Morning", "Hello World!"]}}),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, doc(json!(["Good Morning", "Hello World!"])));
}

#[test]
fn test_merge_deep() {
    let input = json!({"$fn.merge": [
        {"a": "b", "c": {"d": "e"}},
        {"a": "overwritten", "c": {"f": "added"}}
    ]});
    let result = evaluator(json!({}))
        .evaluate_all(&Context::new(), &doc(input))
        .unwrap();
    assert_eq!(
        result.value,
        doc(json!({"a": "overwritten", "c": {"d": "e", "f": "added"}}))
    );
}

#[test]
fn test_merge_shallow() {
    let input = json!({"$fn.merge": {
        "objects": [{"c": {"d": "e"}}, {"c": {"f": "added"}}],
        "mode": "shallow"
    }});
    let result = evaluator(json!({}))
        .evaluate_all(&Context::new(), &doc(input))
        .unwrap();
    assert_eq!(result.value, doc(json!({"c": {"f": "added"}})));
}

#[test]
fn test_exists_for_missing_key() {
    let result = query(
        Language::Path,
        "exists(foo.quux)",
        json!({"foo": {"bar": "baz"}}),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, Value::Bool(false));
    assert!(result.references().is_empty());
}

#[test]
fn test_exists_through_typed_reference() {
    let document = json!({"present": env_ref("x"), "absent": env_ref("nope")});
    let present = query(Language::Path, "exists(present)", document.clone(), &QueryOptions::default())
        .unwrap();
    assert_eq!(present.value, Value::Bool(true));
    assert_eq!(ids(present.references()), vec!["x"]);

    // An errored reference leaves the call unresolved rather than false.
    let absent = query(Language::Path, "exists(absent)", document, &QueryOptions::default()).unwrap();
    assert!(!absent.ok());
}

#[test]
fn test_exists_propagates_other_errors() {
    let err = query(
        Language::Path,
        "exists(1 % 0)",
        json!({}),
        &QueryOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err.root_cause(), EvalError::DivisionByZero));
}

#[test]
fn test_path_default() {
    let document = json!({"obj": {"a": {"b": 1}}});
    let found = query(
        Language::Path,
        "path(obj, 'a.b', 'fallback')",
        document.clone(),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(found.value, Value::Int(1));

    let missing = query(
        Language::Path,
        "path(object: obj, query: 'a.c', default: 'fallback')",
        document.clone(),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(missing.value, doc(json!("fallback")));

    let err = query(
        Language::Path,
        "path(obj, 'a.c')",
        document,
        &QueryOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_not_exists());
}

#[test]
fn test_path_query_calls_configured_functions() {
    let evaluator = RelspecOptions::new().with_function("double", Double).build();
    let direct = evaluator
        .evaluate_all(&Context::new(), &doc(json!({"$fn.double": [2]})))
        .unwrap();
    assert_eq!(direct.value, Value::Int(4));

    let input = doc(json!({"$fn.path": [{"a": 2}, "double(a)"]}));
    let through_path = evaluator.evaluate_all(&Context::new(), &input).unwrap();
    assert_eq!(through_path.value, Value::Int(4));

    let eager = RelspecOptions::new()
        .with_function("double", Double)
        .with_eager_evaluation(true)
        .build();
    let input = doc(json!({"$fn.path": {"object": {"a": 3}, "query": "toString(double(a))"}}));
    let result = eager.evaluate_all(&Context::new(), &input).unwrap();
    assert_eq!(result.value, doc(json!("6")));
}

// ══════════════════════════════════════════════════════════════════════════════
// Short-circuit discipline
// ══════════════════════════════════════════════════════════════════════════════

fn logic_document() -> serde_json::Value {
    json!({"yes": env_ref("t"), "no": env_ref("f"), "other": env_ref("x")})
}

#[test]
fn test_or_skips_right_side_when_lazy() {
    let result = query(
        Language::Path,
        "yes || other",
        logic_document(),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, Value::Bool(true));
    assert_eq!(ids(result.references()), vec!["t"]);
}

#[test]
fn test_or_observes_right_side_when_eager() {
    let options = QueryOptions {
        path: PathLanguage::default().with_eager_evaluation(true),
        ..QueryOptions::default()
    };
    let result = query(Language::Path, "yes || other", logic_document(), &options).unwrap();
    assert_eq!(result.value, Value::Bool(true));
    let log = result.references();
    assert_eq!(ids(log), vec!["t", "x"]);
    assert!(log.get(&"t".to_string()).unwrap().used);
    assert!(!log.get(&"x".to_string()).unwrap().used);
    assert!(result.ok());
}

#[test]
fn test_and_evaluates_both_sides_when_needed() {
    let result = query(
        Language::Path,
        "yes && no",
        logic_document(),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, Value::Bool(false));
    assert_eq!(ids(result.references()), vec!["f", "t"]);
}

#[test]
fn test_eager_library_observes_skipped_coalesce_arguments() {
    let evaluator = RelspecOptions::new()
        .with_mapping_type_resolver("Env", env_resolver(json!({"a": "first", "b": "second"})))
        .with_eager_evaluation(true)
        .build();
    let input = doc(json!({"$fn.coalesce": [env_ref("a"), env_ref("b")]}));
    let result = evaluator.evaluate_all(&Context::new(), &input).unwrap();
    assert_eq!(result.value, doc(json!("first")));
    let log = result.references();
    assert!(log.get(&"a".to_string()).unwrap().used);
    assert!(!log.get(&"b".to_string()).unwrap().used);
}

// ══════════════════════════════════════════════════════════════════════════════
// Templates and the remaining languages
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_template_falls_back_to_source_when_unresolved() {
    let evaluator = RelspecOptions::new()
        .with_mapping_type_resolver("Env", env_resolver(json!({"name": "world"})))
        .with_template_variable("known", doc(env_ref("name")))
        .with_template_variable("unknown", doc(env_ref("missing")))
        .build();
    let input = doc(json!(["hello ${known}", "hello ${unknown}"]));
    let result = evaluator.evaluate_all(&Context::new(), &input).unwrap();
    assert_eq!(result.value, doc(json!(["hello world", "hello ${unknown}"])));
    assert_eq!(ids(result.references()), vec!["missing", "name"]);
}

#[test]
fn test_path_template_query() {
    let result = query(
        Language::PathTemplate,
        "${a}-${b.c}",
        json!({"a": 1, "b": {"c": true}}),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, doc(json!("1-true")));
}

#[test]
fn test_jsonpath_resolves_typed_references_while_traversing() {
    let result = query(
        Language::JsonPath,
        "$.wrapper.inner",
        json!({"wrapper": {"$fn.merge": [{"inner": env_ref("x")}]}}),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, Value::Int(1));
    assert_eq!(ids(result.references()), vec!["x"]);
}

#[test]
fn test_jsonpath_template_query() {
    let result = query(
        Language::JsonPathTemplate,
        "{range .items[*]}[{.v}]{end}",
        json!({"items": [{"v": "a"}, {"v": env_ref("x")}]}),
        &QueryOptions::default(),
    )
    .unwrap();
    assert_eq!(result.value, doc(json!("[a][1]")));
}

#[test]
fn test_jsonpath_template_environment_dialect() {
    let evaluator = RelspecOptions::new()
        .with_template_language(TemplateLanguage::JsonPath)
        .with_template_variable("region", "eu-west-1")
        .build();
    let result = evaluator
        .evaluate_all(&Context::new(), &doc(json!({"host": "api.{.region}.example.com"})))
        .unwrap();
    assert_eq!(result.value, doc(json!({"host": "api.eu-west-1.example.com"})));
}

// ══════════════════════════════════════════════════════════════════════════════
// Pass-through and context
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_unknown_type_round_trips() {
    let input = doc(json!({"a": {"$type": "Unregistered", "x": "${nope}"}, "b": [1]}));
    let result = evaluator(json!({}))
        .evaluate_all(&Context::new(), &input)
        .unwrap();
    assert_eq!(result.value, input);
    assert!(result.references().is_empty());
}

#[test]
fn test_errored_references_round_trip() {
    let input = doc(json!({
        "a": env_ref("x"),
        "b": [env_ref("y"), {"k": env_ref("z")}],
    }));
    let result = evaluator(json!({}))
        .evaluate_all(&Context::new(), &input)
        .unwrap();
    assert_eq!(result.value, input);
    assert!(!result.ok());
    let log = result.references();
    assert_eq!(ids(log), vec!["x", "y", "z"]);
    assert!(log.iter().all(|r| r.error.is_some()));
    assert_eq!(
        log.to_string(),
        "! x: x not found\n! y: y not found\n! z: z not found\n"
    );
}

#[test]
fn test_now_reads_context_clock() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let ctx = Context::new().with_clock(FixedClock(at));
    let result = evaluator(json!({}))
        .evaluate_all(&ctx, &doc(json!({"$fn.now": []})))
        .unwrap();
    assert_eq!(result.value, Value::Time(at));

    let stringified = evaluator(json!({}))
        .evaluate_all(&ctx, &doc(json!({"$fn.toString": {"$fn.now": []}})))
        .unwrap();
    assert_eq!(stringified.value, doc(json!("2024-05-01T12:00:00Z")));
}

#[test]
fn test_canceled_context_aborts() {
    let handle = CancelHandle::new();
    handle.cancel();
    let ctx = Context::new().with_cancel(handle);
    let err = evaluator(json!({}))
        .evaluate_all(&ctx, &doc(json!({"a": [1, 2]})))
        .unwrap_err();
    assert!(err.is_canceled());
}

#[test]
fn test_markdown_invocation() {
    let input = doc(json!({"$fn.convertMarkdown": {"to": "jira", "content": "# Title\n- item"}}));
    let result = evaluator(json!({}))
        .evaluate_all(&Context::new(), &input)
        .unwrap();
    assert_eq!(result.value, doc(json!("h1. Title\n* item")));
}
