//! Template parsing: literal text interleaved with `${expr}` fragments.

use relspec_lexer::token::TokenKind;
use relspec_types::ast::{Template, TemplatePart};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse every part of a template until `Eof`.
    ///
    /// Empty fragments (`${}`) are elided. A malformed fragment is reported
    /// and skipped so later fragments still get checked.
    pub(crate) fn parse_template_parts(&mut self) -> Template {
        let start = self.current_span();
        let mut parts = Vec::new();

        while !self.at_end() && !self.too_many_errors() {
            match self.peek_kind().clone() {
                TokenKind::Text(text) => {
                    self.advance();
                    parts.push(TemplatePart::Literal(text));
                }
                TokenKind::InterpolationStart => {
                    self.advance();
                    if self.eat(&TokenKind::InterpolationEnd) {
                        continue;
                    }
                    match self.parse_expression() {
                        Some(expr) => {
                            if self.expect(&TokenKind::InterpolationEnd).is_some() {
                                parts.push(TemplatePart::Expr(expr));
                            } else {
                                self.synchronize_fragment();
                            }
                        }
                        None => self.synchronize_fragment(),
                    }
                }
                other => {
                    self.error_at_current(format!("unexpected '{other}' in template"));
                    self.advance();
                }
            }
        }

        let span = if parts.is_empty() {
            start
        } else {
            start.merge(self.previous_span())
        };
        Template {
            parts: merge_literals(parts),
            span,
        }
    }
}

/// Join adjacent literal parts left behind by elided fragments.
fn merge_literals(parts: Vec<TemplatePart>) -> Vec<TemplatePart> {
    let mut merged: Vec<TemplatePart> = Vec::with_capacity(parts.len());
    for part in parts {
        if let (Some(TemplatePart::Literal(prev)), TemplatePart::Literal(text)) =
            (merged.last_mut(), &part)
        {
            prev.push_str(text);
            continue;
        }
        merged.push(part);
    }
    merged
}
