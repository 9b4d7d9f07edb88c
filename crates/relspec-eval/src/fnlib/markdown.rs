//! `convertMarkdown`: Markdown to other markup languages.
//!
//! Only Jira wiki markup is supported.

use relspec_types::{
    Context, DynEvaluator, EvalError, EvalResult, Evaluation, Map, ReferenceId, Value,
};

use super::string_arg;
use crate::func::{
    evaluated_keyword, evaluated_positional, Descriptor, DynInvoker, KeywordArgs, PositionalArgs,
};

pub(super) struct ConvertMarkdown;

impl<R: ReferenceId> Descriptor<R> for ConvertMarkdown {
    fn description(&self) -> &str {
        "converts Markdown text to another markup format"
    }

    fn positional_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: PositionalArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_arity(2, false)?;
        Ok(evaluated_positional(evaluator, args, |_ctx: &Context, values: Vec<Value<R>>| {
            let to = string_arg(&values[0]).map_err(|e| e.for_positional_arg(0))?;
            let content = string_arg(&values[1]).map_err(|e| e.for_positional_arg(1))?;
            let converted = convert(to, content).map_err(|e| e.for_positional_arg(0))?;
            Ok(Evaluation::new(Value::String(converted)))
        }))
    }

    fn keyword_invoker(
        &self,
        evaluator: DynEvaluator<R>,
        args: KeywordArgs<R>,
    ) -> EvalResult<DynInvoker<R>> {
        args.check_names(&["to", "content"])?;
        args.require("to")?;
        args.require("content")?;
        Ok(evaluated_keyword(evaluator, args, |_ctx: &Context, values: Map<R>| {
            let to = keyword_str(&values, "to")?;
            let content = keyword_str(&values, "content")?;
            let converted = convert(to, content).map_err(|e| e.for_keyword_arg("to"))?;
            Ok(Evaluation::new(Value::String(converted)))
        }))
    }
}

fn keyword_str<'a, R: ReferenceId>(values: &'a Map<R>, name: &str) -> EvalResult<&'a str> {
    match values.get(name) {
        Some(value) => string_arg(value).map_err(|e| e.for_keyword_arg(name)),
        None => Err(EvalError::ArgNotFound {
            name: name.to_string(),
        }),
    }
}

fn convert(to: &str, content: &str) -> EvalResult<String> {
    match to {
        "jira" => Ok(to_jira(content)),
        other => Err(EvalError::ConvertTypeNotSupported {
            to: other.to_string(),
        }),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Jira
// ══════════════════════════════════════════════════════════════════════════════

/// Render Markdown as Jira wiki markup.
pub fn to_jira(markdown: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut lists = ListStack::default();
    let mut quote: Vec<String> = Vec::new();
    let mut fence: Option<Vec<String>> = None;

    for line in markdown.lines() {
        if let Some(code) = fence.as_mut() {
            if line.trim_start().starts_with("```") {
                out.append(code);
                out.push("{code}".to_string());
                fence = None;
            } else {
                code.push(line.to_string());
            }
            continue;
        }

        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('>') {
            quote.push(inline(rest.strip_prefix(' ').unwrap_or(rest)));
            continue;
        }
        flush_quote(&mut quote, &mut out);

        if let Some(lang) = trimmed.strip_prefix("```") {
            lists.clear();
            let lang = lang.trim();
            let open = if lang.is_empty() {
                "{code}".to_string()
            } else {
                format!("{{code:{lang}}}")
            };
            fence = Some(vec![open]);
            continue;
        }
        if is_rule(trimmed) {
            lists.clear();
            out.push("----".to_string());
            continue;
        }
        if let Some((level, text)) = heading(trimmed) {
            lists.clear();
            out.push(format!("h{level}. {}", inline(text)));
            continue;
        }
        if let Some((kind, text)) = list_item(trimmed) {
            let prefix = lists.push(indent_width(line), kind);
            out.push(format!("{prefix} {}", inline(text)));
            continue;
        }
        if trimmed.is_empty() {
            lists.clear();
        }
        out.push(inline(line));
    }
    flush_quote(&mut quote, &mut out);
    if let Some(mut code) = fence {
        // Unterminated fence: close it at the end of the text.
        out.append(&mut code);
        out.push("{code}".to_string());
    }
    out.join("\n")
}

fn flush_quote(quote: &mut Vec<String>, out: &mut Vec<String>) {
    match quote.len() {
        0 => {}
        1 => out.push(format!("bq. {}", quote[0])),
        _ => {
            out.push("{quote}".to_string());
            out.append(quote);
            out.push("{quote}".to_string());
        }
    }
    quote.clear();
}

fn is_rule(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|m| compact.chars().all(|c| c == *m))
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if rest.is_empty() {
        return Some((level, ""));
    }
    rest.strip_prefix(' ').map(|text| (level, text.trim()))
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn list_item(line: &str) -> Option<(char, &str)> {
    for marker in ["- ", "* ", "+ "] {
        if let Some(text) = line.strip_prefix(marker) {
            return Some(('*', text));
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(text) = line[digits..]
            .strip_prefix(". ")
            .or_else(|| line[digits..].strip_prefix(") "))
        {
            return Some(('#', text));
        }
    }
    None
}

/// Open lists by indentation, outermost first.
#[derive(Default)]
struct ListStack {
    levels: Vec<(usize, char)>,
}

impl ListStack {
    /// Record an item and return its Jira prefix (`*`, `#`, `*#`, ...).
    fn push(&mut self, indent: usize, kind: char) -> String {
        while matches!(self.levels.last(), Some((i, _)) if *i > indent) {
            self.levels.pop();
        }
        if self.levels.last().is_some_and(|(i, _)| *i == indent) {
            self.levels.pop();
        }
        self.levels.push((indent, kind));
        self.levels.iter().map(|(_, k)| *k).collect()
    }

    fn clear(&mut self) {
        self.levels.clear();
    }
}

// ── Inline markup ────────────────────────────────────────────────────────────

fn inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    'scan: while i < chars.len() {
        let rest = &chars[i..];
        match rest[0] {
            '`' => {
                if let Some(end) = find(&chars, i + 1, "`") {
                    out.push_str("{{");
                    out.extend(&chars[i + 1..end]);
                    out.push_str("}}");
                    i = end + 1;
                    continue;
                }
            }
            '!' if rest.get(1) == Some(&'[') => {
                if let Some((_, url, next)) = link(&chars, i + 1) {
                    out.push('!');
                    out.push_str(&url);
                    out.push('!');
                    i = next;
                    continue;
                }
            }
            '[' => {
                if let Some((label, url, next)) = link(&chars, i) {
                    out.push_str(&format!("[{}|{url}]", inline(&label)));
                    i = next;
                    continue;
                }
            }
            _ => {}
        }
        for (delim, jira) in [("**", "*"), ("__", "*"), ("~~", "-")] {
            if starts_with(rest, delim) {
                if let Some(end) = find(&chars, i + 2, delim).filter(|end| *end > i + 2) {
                    let inner: String = chars[i + 2..end].iter().collect();
                    out.push_str(jira);
                    out.push_str(&inline(&inner));
                    out.push_str(jira);
                    i = end + 2;
                    continue 'scan;
                }
            }
        }
        if matches!(rest[0], '*' | '_') && opens_emphasis(&chars, i) {
            let delim = if rest[0] == '*' { "*" } else { "_" };
            if let Some(end) = closing_emphasis(&chars, i + 1, rest[0]) {
                let inner: String = chars[i + 1..end].iter().collect();
                out.push('_');
                out.push_str(&inline(&inner));
                out.push('_');
                i = end + delim.len();
                continue;
            }
        }
        out.push(rest[0]);
        i += 1;
    }
    out
}

fn starts_with(chars: &[char], pat: &str) -> bool {
    let mut it = chars.iter();
    pat.chars().all(|p| it.next() == Some(&p))
}

fn find(chars: &[char], from: usize, pat: &str) -> Option<usize> {
    (from..chars.len()).find(|&j| starts_with(&chars[j..], pat))
}

/// `[label](url)` starting at `start`; returns label, url and the index
/// after the closing parenthesis.
fn link(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let close = find(chars, start + 1, "]")?;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let end = find(chars, close + 2, ")")?;
    let label = chars[start + 1..close].iter().collect();
    let url = chars[close + 2..end].iter().collect();
    Some((label, url, end + 1))
}

fn opens_emphasis(chars: &[char], i: usize) -> bool {
    let next_is_text = chars.get(i + 1).is_some_and(|c| !c.is_whitespace());
    let prev_is_word = i > 0 && chars[i - 1].is_alphanumeric();
    next_is_text && !(chars[i] == '_' && prev_is_word)
}

fn closing_emphasis(chars: &[char], from: usize, marker: char) -> Option<usize> {
    (from..chars.len()).find(|&j| {
        chars[j] == marker
            && j > from
            && !chars[j - 1].is_whitespace()
            && chars.get(j + 1) != Some(&marker)
            && !(marker == '_' && chars.get(j + 1).is_some_and(|c| c.is_alphanumeric()))
    })
}
