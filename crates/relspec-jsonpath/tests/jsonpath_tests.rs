//! JSONPath expression tests against the classic bookstore document.
//!
//! Covers: child and bracket selectors, wildcards, recursive descent,
//! ranges, unions, filters, scripts, placeholders, missing-key handling,
//! and custom variable visitors.

use std::rc::Rc;

use relspec_jsonpath::{
    JsonPath, JsonPathError, JsonPathOptions, JsonPathResult, VariableVisitor,
};
use relspec_types::{Context, EvalResult, Evaluation, Expandable, Value};
use serde_json::json;

type V = Value<String>;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn store() -> V {
    Value::from(json!({
        "store": {
            "book": [
                {"category": "reference", "author": "Nigel Rees",
                 "title": "Sayings of the Century", "price": 8.95},
                {"category": "fiction", "author": "Evelyn Waugh",
                 "title": "Sword of Honour", "price": 12.99},
                {"category": "fiction", "author": "Herman Melville",
                 "title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99},
                {"category": "fiction", "author": "J. R. R. Tolkien",
                 "title": "The Lord of the Rings", "isbn": "0-395-19395-8", "price": 22.99}
            ],
            "bicycle": {"color": "red", "price": 19.95}
        }
    }))
}

fn eval_with(source: &str, options: JsonPathOptions, doc: &V) -> JsonPathResult<V> {
    JsonPath::parse_with(source, options)?.evaluate(doc)
}

fn eval(source: &str) -> V {
    match eval_with(source, JsonPathOptions::default(), &store()) {
        Ok(value) => value,
        Err(err) => panic!("evaluating {source:?} failed: {err}"),
    }
}

fn expect(source: &str, expected: serde_json::Value) {
    assert_eq!(eval(source), Value::from(expected), "evaluating {source:?}");
}

// ─────────────────────────────────────────────────────────────────────
// Selectors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_single_child_returns_scalar() {
    expect("$.store.bicycle.color", json!("red"));
    expect("$['store']['bicycle']['price']", json!(19.95));
    expect("$.store.book[2].title", json!("Moby Dick"));
}

#[test]
fn test_root_alone() {
    assert_eq!(eval("$"), store());
}

#[test]
fn test_negative_index() {
    expect("$.store.book[-1].title", json!("The Lord of the Rings"));
}

#[test]
fn test_wildcard_returns_list() {
    expect(
        "$.store.book[*].author",
        json!(["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"]),
    );
    expect("$.store.bicycle.*", json!(["red", 19.95]));
}

#[test]
fn test_wildcard_scenario() {
    let doc = Value::from(json!({"welcome": {"message": ["Good Morning", "Hello World!"]}}));
    let value = eval_with("$.welcome.message[*]", JsonPathOptions::default(), &doc).unwrap();
    assert_eq!(value, Value::from(json!(["Good Morning", "Hello World!"])));
}

#[test]
fn test_recursive_descent() {
    expect(
        "$..author",
        json!(["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"]),
    );
    expect("$.store..price", json!([19.95, 8.95, 12.99, 8.99, 22.99]));
}

#[test]
fn test_ranges() {
    expect(
        "$.store.book[:2].title",
        json!(["Sayings of the Century", "Sword of Honour"]),
    );
    expect("$.store.book[-1:].title", json!(["The Lord of the Rings"]));
    expect(
        "$.store.book[::-2].title",
        json!(["The Lord of the Rings", "Sword of Honour"]),
    );
    expect("$.store.book[3:1].title", json!([]));
}

#[test]
fn test_union() {
    expect(
        "$.store.book[0]['title', 'price']",
        json!(["Sayings of the Century", 8.95]),
    );
    expect("$.store.book[0, 3].price", json!([8.95, 22.99]));
}

#[test]
fn test_multi_mode_drops_missing() {
    expect(
        "$.store.book[*].isbn",
        json!(["0-553-21311-3", "0-395-19395-8"]),
    );
}

// ─────────────────────────────────────────────────────────────────────
// Filters and scripts
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_filter_exists() {
    expect(
        "$.store.book[?(@.isbn)].title",
        json!(["Moby Dick", "The Lord of the Rings"]),
    );
    expect(
        "$.store.book[?(!@.isbn)].title",
        json!(["Sayings of the Century", "Sword of Honour"]),
    );
}

#[test]
fn test_filter_comparisons() {
    expect(
        "$.store.book[?(@.price < 10)].title",
        json!(["Sayings of the Century", "Moby Dick"]),
    );
    expect(
        "$.store.book[?(@.category == 'fiction' && @.price > 20)].title",
        json!(["The Lord of the Rings"]),
    );
    expect(
        "$.store.book[?@.price * 2 > 40].title",
        json!(["The Lord of the Rings"]),
    );
}

#[test]
fn test_filter_regex() {
    expect("$.store.book[?(@.author =~ 'Tolkien')].price", json!([22.99]));
    expect(
        "$.store.book[?(@.title =~ '^S')].title",
        json!(["Sayings of the Century", "Sword of Honour"]),
    );
}

#[test]
fn test_filter_against_root() {
    expect(
        "$.store.book[?(@.price > $.store.bicycle.price)].title",
        json!(["The Lord of the Rings"]),
    );
}

#[test]
fn test_script_selector() {
    expect("$.store.bicycle[('color')]", json!("red"));
    expect("$.store.book[(1 + 1)].title", json!("Moby Dick"));
}

#[test]
fn test_script_selector_type_propagates() {
    let err = eval_with("$.store[*][(true)]", JsonPathOptions::default(), &store()).unwrap_err();
    assert!(matches!(err, JsonPathError::VarSelectorType { .. }));
}

// ─────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_key_surfaces() {
    let err = eval_with("$.store.pen", JsonPathOptions::default(), &store()).unwrap_err();
    assert!(matches!(err, JsonPathError::KeyParse { ref key } if key == "pen"));
    let err = eval_with("$.store.book[10]", JsonPathOptions::default(), &store()).unwrap_err();
    assert!(matches!(err, JsonPathError::IndexParse { index: 10, len: 4 }));
}

#[test]
fn test_missing_keys_allowed_prunes() {
    let opts = JsonPathOptions::new().with_missing_keys_allowed();
    assert_eq!(eval_with("$.store.pen", opts, &store()).unwrap(), Value::Null);
    assert_eq!(
        eval_with("$.store.book[10].title", opts, &store()).unwrap(),
        Value::Null
    );
}

#[test]
fn test_initial_path() {
    let opts = JsonPathOptions::new().with_initial_path();
    assert_eq!(
        eval_with("store.bicycle.color", opts, &store()).unwrap(),
        Value::from("red")
    );
}

#[test]
fn test_placeholders() {
    let opts = JsonPathOptions::new().with_placeholders();
    assert_eq!(
        eval_with("{#0: $.store.bicycle.#0}", opts, &store()).unwrap(),
        Value::from(json!({"color": "red", "price": 19.95}))
    );
    assert_eq!(
        eval_with("{#0: $.store.book[#0].price, 'n': 1}", opts, &store()).unwrap(),
        Value::from(json!({"0": 8.95, "1": 12.99, "2": 8.99, "3": 22.99, "n": 1}))
    );
}

// ─────────────────────────────────────────────────────────────────────
// Visitors
// ─────────────────────────────────────────────────────────────────────

/// Expands to a fixed value.
struct Fixed(V);

impl Expandable<String> for Fixed {
    fn expand(&self, _ctx: &Context, _depth: i32) -> EvalResult<Evaluation<String>> {
        Ok(Evaluation::new(self.0.clone()))
    }
}

/// Expands every expandable before traversing it.
struct Expanding;

impl VariableVisitor<String> for Expanding {
    fn resolve(&self, value: &V) -> JsonPathResult<V> {
        match value {
            Value::Expandable(e) => Ok(e.expand(&Context::new(), 1)?.value),
            other => Ok(other.clone()),
        }
    }

    fn visit_value(&self, value: V) -> JsonPathResult<V> {
        self.resolve(&value)
    }
}

fn lazy_doc() -> V {
    let inner: V = Value::from(json!({"b": 2}));
    Value::map([(
        "a",
        Value::Expandable(Rc::new(Fixed(inner))),
    )])
}

#[test]
fn test_default_visitor_rejects_expandables() {
    let err = JsonPath::parse("$.a.b").unwrap().evaluate(&lazy_doc()).unwrap_err();
    assert!(matches!(err, JsonPathError::UnknownVariableType { .. }));
    assert!(err.propagates());

    // Even where errors are otherwise dropped.
    let err = JsonPath::parse("$.*").unwrap().evaluate(&lazy_doc()).unwrap_err();
    assert!(matches!(err, JsonPathError::UnknownVariableType { .. }));
}

#[test]
fn test_custom_visitor_resolves_before_indexing() {
    let path = JsonPath::parse("$.a.b").unwrap();
    assert_eq!(path.evaluate_with(&lazy_doc(), &Expanding).unwrap(), Value::Int(2));
    let path = JsonPath::parse("$.a").unwrap();
    assert_eq!(
        path.evaluate_with(&lazy_doc(), &Expanding).unwrap(),
        Value::from(json!({"b": 2}))
    );
}

#[test]
fn test_evaluation_is_deterministic() {
    let first = eval("$..price");
    for _ in 0..50 {
        assert_eq!(eval("$..price"), first);
    }
}
