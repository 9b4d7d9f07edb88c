//! Evaluate a query in one of the supported languages against a document.

use std::fmt;
use std::str::FromStr;

use relspec_jsonpath::{JsonPath, JsonPathOptions, JsonPathTemplate};
use relspec_types::{Context, DynEvaluator, EvalError, EvalResult, Evaluation, ReferenceId, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::jsonpath::{evaluate_jsonpath, render_jsonpath_template};
use crate::pathlang::{PathLanguage, PathTemplate};

/// Query languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    Path,
    PathTemplate,
    #[serde(rename = "jsonpath")]
    JsonPath,
    #[serde(rename = "jsonpath-template")]
    JsonPathTemplate,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Path,
        Language::PathTemplate,
        Language::JsonPath,
        Language::JsonPathTemplate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Path => "path",
            Language::PathTemplate => "path-template",
            Language::JsonPath => "jsonpath",
            Language::JsonPathTemplate => "jsonpath-template",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.as_str() == s)
            .ok_or_else(|| EvalError::InvalidValue {
                value: s.to_string(),
                wanted: Language::ALL.iter().map(|l| l.as_str().to_string()).collect(),
            })
    }
}

/// Language settings for [`evaluate_query`].
pub struct QueryOptions<R: ReferenceId> {
    pub path: PathLanguage<R>,
    pub jsonpath: JsonPathOptions,
}

impl<R: ReferenceId> Default for QueryOptions<R> {
    fn default() -> Self {
        Self {
            path: PathLanguage::default(),
            jsonpath: JsonPathOptions::default(),
        }
    }
}

impl<R: ReferenceId> Clone for QueryOptions<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            jsonpath: self.jsonpath,
        }
    }
}

/// Evaluate `query` against `document`, walking the document with
/// `evaluator` as the query traverses it.
///
/// The returned value is fully evaluated.
pub fn evaluate_query<R: ReferenceId>(
    ctx: &Context,
    evaluator: &DynEvaluator<R>,
    language: Language,
    query: &str,
    document: &Value<R>,
    options: &QueryOptions<R>,
) -> EvalResult<Evaluation<R>> {
    debug!(%language, query, "evaluating query");
    let result = match language {
        Language::Path => options.path.evaluate_source(ctx, query, document, evaluator)?,
        Language::PathTemplate => {
            let template = PathTemplate::parse(query)?;
            options
                .path
                .evaluate_template(ctx, &template, document, evaluator)?
        }
        Language::JsonPath => {
            let path = JsonPath::parse_with(query, options.jsonpath)?;
            evaluate_jsonpath(ctx, evaluator, &path, document)?
        }
        Language::JsonPathTemplate => {
            let template = JsonPathTemplate::parse_with(query, options.jsonpath)?;
            render_jsonpath_template(ctx, evaluator, &template, document)?
        }
    };
    if !result.ok() {
        debug!(%language, query, "query is unresolved");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_names_round_trip() {
        for language in Language::ALL {
            assert_eq!(language.as_str().parse::<Language>().unwrap(), language);
            let json = serde_json::to_value(language).unwrap();
            assert_eq!(json, serde_json::Value::String(language.to_string()));
        }
    }

    #[test]
    fn test_unknown_language() {
        let err = "xpath".parse::<Language>().unwrap_err();
        assert!(matches!(err, EvalError::InvalidValue { .. }));
    }
}
