//! The JSONPath template dialect.
//!
//! Text interleaved with `{expr}` actions and `{range expr}…{end}` loops.
//! Paths inside actions may omit the root and start with `.` or `[`; they
//! are relative to the current value, which is the document at the top
//! level and each item inside a range.

use relspec_types::{format_float, ReferenceId, Value};

use crate::ast::TemplatePart;
use crate::error::{JsonPathError, JsonPathResult};
use crate::eval::Evaluator;
use crate::options::JsonPathOptions;
use crate::parser::parse_with;
use crate::visitor::{DefaultVariableVisitor, VariableVisitor};

/// A parsed JSONPath template.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPathTemplate {
    source: String,
    parts: Vec<TemplatePart>,
    options: JsonPathOptions,
}

impl JsonPathTemplate {
    pub fn parse(source: &str) -> JsonPathResult<Self> {
        Self::parse_with(source, JsonPathOptions::default())
    }

    pub fn parse_with(source: &str, options: JsonPathOptions) -> JsonPathResult<Self> {
        let parts = TemplateParser::new(source, &options).parse()?;
        tracing::trace!(source, parts = parts.len(), "parsed jsonpath template");
        Ok(Self {
            source: source.to_string(),
            parts,
            options,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Render against plain values.
    pub fn render<R: ReferenceId>(&self, root: &Value<R>) -> JsonPathResult<String> {
        self.render_with(root, &DefaultVariableVisitor)
    }

    pub fn render_with<R, V>(&self, root: &Value<R>, visitor: &V) -> JsonPathResult<String>
    where
        R: ReferenceId,
        V: VariableVisitor<R> + ?Sized,
    {
        let evaluator = Evaluator::new(visitor, root, &self.options);
        let mut out = String::new();
        render_parts(&evaluator, &self.parts, root, &mut out)?;
        Ok(out)
    }
}

fn render_parts<R, V>(
    evaluator: &Evaluator<'_, R, V>,
    parts: &[TemplatePart],
    current: &Value<R>,
    out: &mut String,
) -> JsonPathResult<()>
where
    R: ReferenceId,
    V: VariableVisitor<R> + ?Sized,
{
    for part in parts {
        match part {
            TemplatePart::Text(text) => out.push_str(text),
            TemplatePart::Expr(expr) => {
                let value = evaluator.eval(expr, current)?;
                out.push_str(&format_value(&value)?);
            }
            TemplatePart::Range { expr, body } => {
                let items = match evaluator.eval(expr, current)? {
                    Value::List(items) => items,
                    Value::Map(map) => map.into_values().collect(),
                    Value::Null => Vec::new(),
                    other => vec![other],
                };
                for item in &items {
                    render_parts(evaluator, body, item, out)?;
                }
            }
        }
    }
    Ok(())
}

/// Format a value for template output: `null` is empty, lists are
/// space-joined, strings are raw, containers nested in lists are JSON.
pub fn format_value<R: ReferenceId>(value: &Value<R>) -> JsonPathResult<String> {
    match value {
        Value::List(items) => {
            let formatted = items
                .iter()
                .map(format_item)
                .collect::<JsonPathResult<Vec<_>>>()?;
            Ok(formatted.join(" "))
        }
        other => format_item(other),
    }
}

fn format_item<R: ReferenceId>(value: &Value<R>) -> JsonPathResult<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Float(f) => Ok(format_float(*f)),
        Value::List(_) | Value::Map(_) | Value::Expandable(_) => {
            let json = value.to_json()?;
            Ok(json.to_string())
        }
        other => Ok(other.to_template_string()?),
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

struct TemplateParser<'a> {
    source: &'a str,
    options: &'a JsonPathOptions,
    pos: usize,
}

enum Action {
    Expr(TemplatePart),
    Range(crate::ast::Expr, usize),
    End(usize),
}

impl<'a> TemplateParser<'a> {
    fn new(source: &'a str, options: &'a JsonPathOptions) -> Self {
        Self {
            source,
            options,
            pos: 0,
        }
    }

    fn parse(mut self) -> JsonPathResult<Vec<TemplatePart>> {
        let parts = self.parse_parts(None)?;
        Ok(parts)
    }

    /// Parts up to the end of input, or up to `{end}` when inside a range
    /// opened at `range_at`.
    fn parse_parts(&mut self, range_at: Option<usize>) -> JsonPathResult<Vec<TemplatePart>> {
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            let rest = &self.source[self.pos..];
            let Some(open) = rest.find('{') else {
                text.push_str(rest);
                self.pos = self.source.len();
                flush(&mut text, &mut parts);
                return match range_at {
                    Some(at) => Err(JsonPathError::parse("range is missing {end}", at)),
                    None => Ok(parts),
                };
            };
            text.push_str(&rest[..open]);
            flush(&mut text, &mut parts);
            let action_at = self.pos + open;
            match self.parse_action(action_at)? {
                Action::Expr(part) => parts.push(part),
                Action::Range(expr, at) => {
                    let body = self.parse_parts(Some(at))?;
                    parts.push(TemplatePart::Range { expr, body });
                }
                Action::End(at) => {
                    return match range_at {
                        Some(_) => Ok(parts),
                        None => Err(JsonPathError::parse("{end} without range", at)),
                    };
                }
            }
        }
    }

    /// The action whose `{` is at `start`; leaves the cursor after its `}`.
    fn parse_action(&mut self, start: usize) -> JsonPathResult<Action> {
        let close = find_close(self.source, start)?;
        let inner = &self.source[start + 1..close];
        self.pos = close + 1;
        let body = inner.trim();
        let offset = start + 1 + (inner.len() - inner.trim_start().len());
        if body == "end" {
            return Ok(Action::End(start));
        }
        if let Some(expr) = body.strip_prefix("range") {
            if expr.starts_with(char::is_whitespace) {
                let expr = parse_with(expr, self.options, true).map_err(|e| shift(e, offset + 5))?;
                return Ok(Action::Range(expr, start));
            }
        }
        if body.is_empty() {
            return Err(JsonPathError::parse("empty template action", start));
        }
        let expr = parse_with(body, self.options, true).map_err(|e| shift(e, offset))?;
        Ok(Action::Expr(TemplatePart::Expr(expr)))
    }
}

fn flush(text: &mut String, parts: &mut Vec<TemplatePart>) {
    if !text.is_empty() {
        parts.push(TemplatePart::Text(std::mem::take(text)));
    }
}

/// The `}` closing the action opened at `start`, skipping quoted strings
/// and nested braces.
fn find_close(source: &str, start: usize) -> JsonPathResult<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in source[start..].char_indices() {
        let at = start + i;
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(at);
                }
            }
            _ => {}
        }
    }
    Err(JsonPathError::parse("unterminated template action", start))
}

/// Re-base a parse error from an action onto the whole template.
fn shift(err: JsonPathError, offset: usize) -> JsonPathError {
    match err {
        JsonPathError::Parse { message, position } => JsonPathError::Parse {
            message,
            position: position + offset,
        },
        JsonPathError::UnexpectedSeparator {
            separator,
            position,
        } => JsonPathError::UnexpectedSeparator {
            separator,
            position: position + offset,
        },
        JsonPathError::MixedSeparator {
            first,
            second,
            position,
        } => JsonPathError::MixedSeparator {
            first,
            second,
            position: position + offset,
        },
        other => other,
    }
}
