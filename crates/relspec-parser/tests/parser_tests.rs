//! Parser tests for the path expression language and templates.
//!
//! Covers: literals, selectors, calls (positional and keyword), operator
//! precedence and associativity, pipes, templates with elided fragments,
//! error reporting, and determinism.

use relspec_parser::{parse_expression, parse_template};
use relspec_types::ast::*;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Parse an expression, panicking with every error if it fails.
fn parse_ok(source: &str) -> Expr {
    match parse_expression(source) {
        Ok(expr) => expr,
        Err(errors) => {
            for e in &errors.errors {
                eprintln!("  ERROR: {} at {}", e.message, e.span);
            }
            panic!("unexpected parse errors for {source:?} (see above)");
        }
    }
}

/// Parse an expression and return the first error message.
fn first_error(source: &str) -> String {
    match parse_expression(source) {
        Ok(expr) => panic!("expected an error for {source:?}, got {expr:?}"),
        Err(errors) => errors.first().map(|e| e.message.clone()).unwrap_or_default(),
    }
}

/// Render an expression as fully parenthesized text for precedence checks.
fn render(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Null => "null".into(),
        ExprKind::Bool(b) => b.to_string(),
        ExprKind::Int(n) => n.to_string(),
        ExprKind::Float(n) => n.to_string(),
        ExprKind::String(s) => format!("{s:?}"),
        ExprKind::List(items) => format!(
            "[{}]",
            items.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        ExprKind::Map(entries) => format!(
            "{{{}}}",
            entries
                .iter()
                .map(|(k, v)| format!("{}: {}", render(k), render(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        ExprKind::Root => "$".into(),
        ExprKind::Variable(name) => name.clone(),
        ExprKind::Select { object, selector } => match selector {
            Selector::Literal(key) => format!("{}.{key}", render(object)),
            Selector::Expr(index) => format!("{}[{}]", render(object), render(index)),
        },
        ExprKind::Call { name, args } => match args {
            CallArgs::Positional(args) => format!(
                "{}({})",
                name.name,
                args.iter().map(render).collect::<Vec<_>>().join(", ")
            ),
            CallArgs::Keyword(args) => format!(
                "{}({})",
                name.name,
                args.iter()
                    .map(|(k, v)| format!("{}: {}", k.name, render(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        ExprKind::Unary { op, operand } => format!("({}{})", op.as_str(), render(operand)),
        ExprKind::Binary { left, op, right } => {
            format!("({} {} {})", render(left), op.as_str(), render(right))
        }
        ExprKind::Pipe { left, right } => format!("({} |> {})", render(left), render(right)),
    }
}

fn rendered(source: &str) -> String {
    render(&parse_ok(source))
}

// ─────────────────────────────────────────────────────────────────────
// Literals and selectors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_literals() {
    assert_eq!(parse_ok("42").kind, ExprKind::Int(42));
    assert_eq!(parse_ok("1.5").kind, ExprKind::Float(1.5));
    assert_eq!(parse_ok("'x'").kind, ExprKind::String("x".into()));
    assert_eq!(parse_ok("null").kind, ExprKind::Null);
    assert_eq!(parse_ok("true").kind, ExprKind::Bool(true));
}

#[test]
fn test_collection_literals() {
    assert_eq!(rendered("[1, 'a', [] ,]"), "[1, \"a\", []]");
    assert_eq!(rendered("{a: 1, 'b c': x}"), "{\"a\": 1, \"b c\": x}");
}

#[test]
fn test_dot_selectors() {
    assert_eq!(rendered("foo.bar.0.'baz qux'"), "foo.bar.0.baz qux");
    assert_eq!(rendered("$.a"), "$.a");
    assert_eq!(rendered("my-var.my-key"), "my-var.my-key");
}

#[test]
fn test_keyword_member_names() {
    assert_eq!(rendered("a.true.null"), "a.true.null");
}

#[test]
fn test_bracket_selector() {
    assert_eq!(rendered("foo['bar'][1 + 1]"), "foo[\"bar\"][(1 + 1)]");
    assert_eq!(rendered("$['a']"), "$[\"a\"]");
}

// ─────────────────────────────────────────────────────────────────────
// Calls
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_positional_call() {
    let expr = parse_ok("concat(a, 'b', 1)");
    match expr.kind {
        ExprKind::Call {
            name,
            args: CallArgs::Positional(args),
        } => {
            assert_eq!(name.name, "concat");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected positional call, got {other:?}"),
    }
}

#[test]
fn test_zero_arg_call_is_positional() {
    match parse_ok("now()").kind {
        ExprKind::Call { name, args } => {
            assert_eq!(name.name, "now");
            assert_eq!(args, CallArgs::Positional(vec![]));
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn test_keyword_call() {
    assert_eq!(
        rendered("merge(objects: [a, b], mode: 'shallow')"),
        "merge(objects: [a, b], mode: \"shallow\")"
    );
}

#[test]
fn test_single_arg_lookahead() {
    assert_eq!(rendered("f(a)"), "f(a)");
    assert_eq!(rendered("f(a: 1)"), "f(a: 1)");
    assert_eq!(rendered("f(a.b)"), "f(a.b)");
}

#[test]
fn test_mixed_call_args_rejected() {
    assert_eq!(first_error("f(a: 1, b)"), "expected keyword argument");
}

#[test]
fn test_duplicate_keyword_rejected() {
    assert_eq!(
        first_error("f(a: 1, a: 2)"),
        "duplicate keyword argument 'a'"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(rendered("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(rendered("1 - 2 - 3"), "((1 - 2) - 3)");
    assert_eq!(rendered("2 ** 3 ** 2"), "(2 ** (3 ** 2))");
    assert_eq!(rendered("2 * 3 ** 2"), "(2 * (3 ** 2))");
}

#[test]
fn test_logical_precedence() {
    assert_eq!(rendered("a || b && c"), "(a || (b && c))");
    assert_eq!(rendered("a == 1 && b != 2"), "((a == 1) && (b != 2))");
    assert_eq!(rendered("a < b == c > d"), "((a < b) == (c > d))");
}

#[test]
fn test_bitwise_precedence() {
    assert_eq!(rendered("a | b ^ c & d"), "(a | (b ^ (c & d)))");
    assert_eq!(rendered("1 << 2 + 3"), "(1 << (2 + 3))");
    assert_eq!(rendered("a & b == c"), "((a & b) == c)");
}

#[test]
fn test_regex_operators() {
    assert_eq!(rendered("name =~ '^a.*'"), "(name =~ \"^a.*\")");
    assert_eq!(rendered("name !~ 'x'"), "(name !~ \"x\")");
}

#[test]
fn test_unary() {
    assert_eq!(rendered("-a.b"), "(-a.b)");
    assert_eq!(rendered("!!x"), "(!(!x))");
    assert_eq!(rendered("~1 + 2"), "((~1) + 2)");
}

#[test]
fn test_pipe_binds_loosest() {
    assert_eq!(
        rendered("jsonUnmarshal(s) |> x.y || z"),
        "(jsonUnmarshal(s) |> (x.y || z))"
    );
    assert_eq!(rendered("a |> b |> c"), "((a |> b) |> c)");
}

#[test]
fn test_parentheses() {
    assert_eq!(rendered("(1 + 2) * 3"), "((1 + 2) * 3)");
    assert_eq!(rendered("(a).b"), "a.b");
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_trailing_dot_is_error() {
    assert_eq!(first_error("foo."), "expected selector after '.'");
}

#[test]
fn test_trailing_tokens_are_error() {
    assert_eq!(first_error("a b"), "unexpected 'b' after expression");
}

#[test]
fn test_missing_operand() {
    assert_eq!(first_error("1 +"), "expected expression, got 'end of input'");
}

#[test]
fn test_unclosed_call() {
    assert_eq!(first_error("f(a"), "expected ')', got 'end of input'");
}

#[test]
fn test_lex_errors_reported_first() {
    assert_eq!(first_error("a = 'x"), "Unexpected character '='");
}

#[test]
fn test_nesting_limit() {
    let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert!(first_error(&deep).starts_with("maximum expression nesting depth"));
}

// ─────────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_template_literal_only() {
    let t = parse_template("hello world").unwrap();
    assert!(t.is_literal());
    assert_eq!(t.parts, vec![TemplatePart::Literal("hello world".into())]);
}

#[test]
fn test_template_sole_expression() {
    let t = parse_template("${a.b}").unwrap();
    let expr = t.sole_expr().expect("single expression");
    assert_eq!(render(expr), "a.b");
}

#[test]
fn test_template_mixed() {
    let t = parse_template("Hello, ${name}! You are ${age + 1}.").unwrap();
    assert_eq!(t.parts.len(), 5);
    assert_eq!(t.parts[0], TemplatePart::Literal("Hello, ".into()));
    assert_eq!(t.parts[4], TemplatePart::Literal(".".into()));
    match &t.parts[3] {
        TemplatePart::Expr(e) => assert_eq!(render(e), "(age + 1)"),
        other => panic!("expected expression, got {other:?}"),
    }
}

#[test]
fn test_template_empty_fragments_elided() {
    let t = parse_template("a${}b${ }c").unwrap();
    assert_eq!(t.parts, vec![TemplatePart::Literal("abc".into())]);
    let t = parse_template("${}").unwrap();
    assert!(t.parts.is_empty());
}

#[test]
fn test_template_errors() {
    let errors = parse_template("${a.} and ${b +}").unwrap_err();
    assert_eq!(errors.total_errors, 2);
    assert_eq!(errors.errors[0].message, "expected selector after '.'");
}

#[test]
fn test_parsing_is_deterministic() {
    let source = "coalesce(a.b, $['c'], 1 + 2 * 3) |> x";
    let first = parse_ok(source);
    for _ in 0..100 {
        assert_eq!(parse_ok(source), first);
    }
}
