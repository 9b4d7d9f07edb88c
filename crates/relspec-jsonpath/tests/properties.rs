//! Property-based tests for range and recursive-descent selection.

use proptest::prelude::*;
use relspec_jsonpath::JsonPath;
use relspec_types::Value;
use serde_json::json;

type V = Value<String>;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn ints(values: &[i64]) -> V {
    Value::List(values.iter().copied().map(Value::Int).collect())
}

/// Slice bounds clamped the way Python clamps them.
fn clamp(bound: i64, len: i64) -> usize {
    let clamped = if bound < 0 { (len + bound).max(0) } else { bound.min(len) };
    clamped as usize
}

fn select(source: &str, doc: &V) -> V {
    match JsonPath::parse(source).and_then(|path| path.evaluate(doc)) {
        Ok(value) => value,
        Err(err) => panic!("evaluating {source:?} failed: {err}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn test_range_matches_clamped_slice(
        items in prop::collection::vec(any::<i64>(), 0..8),
        start in -10i64..10,
        end in -10i64..10,
    ) {
        let len = items.len() as i64;
        let (lo, hi) = (clamp(start, len), clamp(end, len));
        let expected = if lo < hi { &items[lo..hi] } else { &items[..0] };
        let selected = select(&format!("$[{start}:{end}]"), &ints(&items));
        prop_assert_eq!(selected, ints(expected));
    }

    #[test]
    fn test_negative_step_reverses(items in prop::collection::vec(any::<i64>(), 0..8)) {
        let mut reversed = items.clone();
        reversed.reverse();
        prop_assert_eq!(select("$[::-1]", &ints(&items)), ints(&reversed));
    }

    #[test]
    fn test_recursive_descent_finds_every_member(
        values in prop::collection::vec(-1000i64..1000, 1..6),
    ) {
        let entries: Vec<serde_json::Value> = values.iter().map(|v| json!({"v": v})).collect();
        let doc: V = Value::from(json!({"items": entries}));
        let Value::List(found) = select("$..v", &doc) else {
            panic!("recursive descent should select a list");
        };
        let mut found: Vec<i64> = found
            .iter()
            .map(|v| match v {
                Value::Int(n) => *n,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        let mut expected = values.clone();
        found.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(found, expected);
    }
}
