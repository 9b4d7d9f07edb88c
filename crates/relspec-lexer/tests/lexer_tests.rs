//! Lexer tests for the path expression language and its templates.
//!
//! Covers: literals, identifiers with dashes, every operator, the
//! integer-after-dot rule, template text and fragments, nested braces,
//! error recovery, and span tracking.

use relspec_lexer::{Lexer, TokenKind};
use relspec_types::SourceText;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex an expression and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    let src = SourceText::new(source);
    Lexer::new(&src)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex a template and return the token kinds (excluding final Eof).
fn template_kinds(source: &str) -> Vec<TokenKind> {
    let src = SourceText::new(source);
    Lexer::template(&src)
        .lex()
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex an expression and return the first error message.
fn first_error(source: &str) -> String {
    let src = SourceText::new(source);
    Lexer::new(&src)
        .lex()
        .errors
        .errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_default()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("42 3.5 1e3 2E-2"),
        vec![
            TokenKind::Int(42),
            TokenKind::Float(3.5),
            TokenKind::Float(1000.0),
            TokenKind::Float(0.02),
        ]
    );
}

#[test]
fn test_integer_overflow_becomes_float() {
    assert_eq!(
        kinds("99999999999999999999"),
        vec![TokenKind::Float(1e20)]
    );
}

#[test]
fn test_strings() {
    assert_eq!(
        kinds(r#"'a' "b" `c\d`"#),
        vec![
            TokenKind::String("a".into()),
            TokenKind::String("b".into()),
            TokenKind::String("c\\d".into()),
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds(r#"'it\'s' "tab\there" "é""#),
        vec![
            TokenKind::String("it's".into()),
            TokenKind::String("tab\there".into()),
            TokenKind::String("é".into()),
        ]
    );
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("true false null"),
        vec![TokenKind::True, TokenKind::False, TokenKind::Null]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Names and selectors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_identifiers_allow_inner_dashes() {
    assert_eq!(kinds("my-key"), vec![ident("my-key")]);
    assert_eq!(
        kinds("-key"),
        vec![TokenKind::Minus, ident("key")],
        "a leading dash is an operator"
    );
}

#[test]
fn test_integer_after_dot() {
    assert_eq!(
        kinds("a.0.1"),
        vec![
            ident("a"),
            TokenKind::Dot,
            TokenKind::Int(0),
            TokenKind::Dot,
            TokenKind::Int(1),
        ]
    );
}

#[test]
fn test_dollar_and_brackets() {
    assert_eq!(
        kinds("$['a b']"),
        vec![
            TokenKind::Dollar,
            TokenKind::LBracket,
            TokenKind::String("a b".into()),
            TokenKind::RBracket,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_all_operators() {
    assert_eq!(
        kinds("+ - * ** / % ~ ^ & && | || |> << >> ! != !~ == =~ < <= > >="),
        vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::StarStar,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Tilde,
            TokenKind::Caret,
            TokenKind::Amp,
            TokenKind::AmpAmp,
            TokenKind::Pipe,
            TokenKind::PipePipe,
            TokenKind::PipeGreater,
            TokenKind::Shl,
            TokenKind::Shr,
            TokenKind::Bang,
            TokenKind::BangEq,
            TokenKind::BangTilde,
            TokenKind::EqEq,
            TokenKind::EqTilde,
            TokenKind::Less,
            TokenKind::LessEq,
            TokenKind::Greater,
            TokenKind::GreaterEq,
        ]
    );
}

#[test]
fn test_keyword_call() {
    assert_eq!(
        kinds("merge(objects: [a], mode: 'shallow')"),
        vec![
            ident("merge"),
            TokenKind::LParen,
            ident("objects"),
            TokenKind::Colon,
            TokenKind::LBracket,
            ident("a"),
            TokenKind::RBracket,
            TokenKind::Comma,
            ident("mode"),
            TokenKind::Colon,
            TokenKind::String("shallow".into()),
            TokenKind::RParen,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_template_text_only() {
    assert_eq!(
        template_kinds("hello $ world {x}"),
        vec![TokenKind::Text("hello $ world {x}".into())]
    );
}

#[test]
fn test_template_fragments() {
    assert_eq!(
        template_kinds("a ${b} c${d.e}"),
        vec![
            TokenKind::Text("a ".into()),
            TokenKind::InterpolationStart,
            ident("b"),
            TokenKind::InterpolationEnd,
            TokenKind::Text(" c".into()),
            TokenKind::InterpolationStart,
            ident("d"),
            TokenKind::Dot,
            ident("e"),
            TokenKind::InterpolationEnd,
        ]
    );
}

#[test]
fn test_template_nested_braces() {
    assert_eq!(
        template_kinds("${ {'a': 1}.a }"),
        vec![
            TokenKind::InterpolationStart,
            TokenKind::LBrace,
            TokenKind::String("a".into()),
            TokenKind::Colon,
            TokenKind::Int(1),
            TokenKind::RBrace,
            TokenKind::Dot,
            ident("a"),
            TokenKind::InterpolationEnd,
        ]
    );
}

#[test]
fn test_template_empty_fragment() {
    assert_eq!(
        template_kinds("${}"),
        vec![TokenKind::InterpolationStart, TokenKind::InterpolationEnd]
    );
}

#[test]
fn test_template_unterminated() {
    let src = SourceText::new("x ${a");
    let result = Lexer::template(&src).lex();
    assert_eq!(result.errors.total_errors, 1);
    assert_eq!(
        result.errors.errors[0].message,
        "Unterminated template expression"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Errors and spans
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_single_equals_is_error() {
    assert_eq!(first_error("a = b"), "Unexpected character '='");
}

#[test]
fn test_unexpected_character_recovers() {
    let src = SourceText::new("a # b");
    let result = Lexer::new(&src).lex();
    assert_eq!(result.errors.total_errors, 1);
    let kinds: Vec<_> = result.tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![ident("a"), ident("b"), TokenKind::Eof]);
}

#[test]
fn test_unterminated_string() {
    assert_eq!(first_error("'abc"), "Unterminated string literal");
}

#[test]
fn test_spans() {
    let src = SourceText::new("foo.bar");
    let tokens = Lexer::new(&src).lex().tokens;
    assert_eq!(tokens[0].span.start_col, 1);
    assert_eq!(tokens[0].span.end_col, 3);
    assert_eq!(tokens[1].span.start_col, 4);
    assert_eq!(tokens[2].span.start_col, 5);
}

#[test]
fn test_lexing_is_deterministic() {
    let source = "coalesce(a.b, $['c'], 1 + 2 * 3) |> x";
    let first = kinds(source);
    for _ in 0..100 {
        assert_eq!(kinds(source), first);
    }
}
