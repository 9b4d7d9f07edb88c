//! `${…}` templates.

use relspec_types::ast::{Template, TemplatePart};
use relspec_types::{Annotation, EvalResult, Evaluation, Metadata, ReferenceId, Value, DEPTH_FULL};
use tracing::trace;

use super::eval::Scope;
use super::parse_error;

/// A parsed template and the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PathTemplate {
    source: String,
    template: Template,
}

impl PathTemplate {
    pub fn parse(source: &str) -> EvalResult<Self> {
        let template = relspec_parser::parse_template(source).map_err(parse_error)?;
        trace!(source, parts = template.parts.len(), "parsed path template");
        Ok(Self {
            source: source.to_string(),
            template,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Returns `true` if there is nothing to interpolate.
    pub fn is_literal(&self) -> bool {
        self.template.is_literal()
    }

    /// Interpolate every fragment.
    ///
    /// A template that is a single fragment keeps that fragment's type.
    /// Anything else is stringified and joined. If any fragment is
    /// unresolved the value is the template text itself.
    pub(crate) fn evaluate<R: ReferenceId>(&self, scope: &Scope<'_, R>) -> EvalResult<Evaluation<R>> {
        let annotation = Annotation::expression("path-template", &self.source);
        if let Some(expr) = self.template.sole_expr() {
            let mut result = scope.eval(expr, DEPTH_FULL)?;
            if !result.ok() {
                result.value = Value::String(self.source.clone());
            }
            return Ok(result.with_annotation(annotation));
        }

        let mut metadata = Metadata::default();
        let mut out = String::new();
        for part in &self.template.parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Expr(expr) => {
                    let result = scope.eval(expr, DEPTH_FULL)?;
                    if result.ok() {
                        out.push_str(&result.value.to_template_string()?);
                    }
                    metadata.add_step(result, Vec::new());
                }
            }
        }
        if !metadata.references.ok() {
            out = self.source.clone();
        }
        metadata.annotation = Some(annotation);
        Ok(Evaluation {
            metadata,
            value: Value::String(out),
        })
    }
}
