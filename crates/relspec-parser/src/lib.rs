//! Path-expression parser: converts a token stream into an AST.

mod parse_expr;
mod parse_template;
mod parser;

pub use parser::{ParseResult, Parser, MAX_EXPR_DEPTH};

use relspec_lexer::Lexer;
use relspec_types::ast::{Expr, Template};
use relspec_types::{ParseErrors, SourceText};

/// Lex and parse a standalone expression.
pub fn parse_expression(source: &str) -> Result<Expr, ParseErrors> {
    let src = SourceText::new(source);
    let lex = Lexer::new(&src).lex();
    let mut result = Parser::new(lex.tokens, &src).parse();
    merge_lex_errors(&mut result, lex.errors);
    result.into_result()
}

/// Lex and parse a template with `${expr}` fragments.
pub fn parse_template(source: &str) -> Result<Template, ParseErrors> {
    let src = SourceText::new(source);
    let lex = Lexer::template(&src).lex();
    let mut result = Parser::new(lex.tokens, &src).parse_template();
    merge_lex_errors(&mut result, lex.errors);
    result.into_result()
}

/// Lexer errors come first; they usually explain the parser's.
fn merge_lex_errors<T>(result: &mut ParseResult<T>, lex_errors: ParseErrors) {
    if lex_errors.has_errors() {
        let parse_errors = std::mem::replace(&mut result.errors, lex_errors);
        result.errors.extend(parse_errors);
    }
}
