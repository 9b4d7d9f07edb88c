//! Function arguments.
//!
//! Arguments arrive unevaluated. Functions decide when, and how deeply, to
//! evaluate each one.

use std::collections::BTreeMap;

use relspec_types::{EvalError, EvalResult, ReferenceId, Value};

// ── Positional ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PositionalArg<R: ReferenceId> {
    /// Zero-based position.
    pub index: usize,
    pub value: Value<R>,
}

#[derive(Debug, Clone)]
pub struct PositionalArgs<R: ReferenceId> {
    args: Vec<PositionalArg<R>>,
}

impl<R: ReferenceId> PositionalArgs<R> {
    pub fn new(values: Vec<Value<R>>) -> Self {
        Self {
            args: values
                .into_iter()
                .enumerate()
                .map(|(index, value)| PositionalArg { index, value })
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&PositionalArg<R>> {
        self.args.get(index)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionalArg<R>> {
        self.args.iter()
    }

    /// Require exactly `wanted` arguments, or at least `wanted` when
    /// `variadic`.
    pub fn check_arity(&self, wanted: usize, variadic: bool) -> EvalResult<()> {
        self.check_arity_range(wanted, if variadic { None } else { Some(wanted) })
    }

    /// Require between `min` and `max` arguments (unbounded when `max` is
    /// `None`). Blames the first missing or first extra argument.
    pub fn check_arity_range(&self, min: usize, max: Option<usize>) -> EvalResult<()> {
        let got = self.len();
        let arity = |wanted: usize| EvalError::Arity {
            wanted,
            variadic: max.is_none(),
            got,
        };
        if got < min {
            return Err(arity(min).for_positional_arg(got));
        }
        if let Some(max) = max {
            if got > max {
                return Err(arity(max).for_positional_arg(max));
            }
        }
        Ok(())
    }

    /// The arguments as a list value, in order.
    pub fn to_value(&self) -> Value<R> {
        Value::List(self.args.iter().map(|a| a.value.clone()).collect())
    }
}

impl<R: ReferenceId> IntoIterator for PositionalArgs<R> {
    type Item = PositionalArg<R>;
    type IntoIter = std::vec::IntoIter<PositionalArg<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.into_iter()
    }
}

// ── Keyword ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct KeywordArg<R: ReferenceId> {
    pub name: String,
    pub value: Value<R>,
}

#[derive(Debug, Clone)]
pub struct KeywordArgs<R: ReferenceId> {
    args: BTreeMap<String, Value<R>>,
}

impl<R: ReferenceId> KeywordArgs<R> {
    pub fn new(args: BTreeMap<String, Value<R>>) -> Self {
        Self { args }
    }

    pub fn get(&self, name: &str) -> Option<KeywordArg<R>> {
        self.args.get(name).map(|value| KeywordArg {
            name: name.to_string(),
            value: value.clone(),
        })
    }

    /// The named argument, or [`EvalError::ArgNotFound`].
    pub fn require(&self, name: &str) -> EvalResult<KeywordArg<R>> {
        self.get(name).ok_or_else(|| EvalError::ArgNotFound {
            name: name.to_string(),
        })
    }

    /// Fail on any argument not in `accepted`.
    pub fn check_names(&self, accepted: &[&str]) -> EvalResult<()> {
        match self.args.keys().find(|k| !accepted.contains(&k.as_str())) {
            Some(unknown) => Err(EvalError::InvalidValue {
                value: unknown.clone(),
                wanted: accepted.iter().map(|a| a.to_string()).collect(),
            }
            .for_keyword_arg(unknown.clone())),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Arguments in name order.
    pub fn iter(&self) -> impl Iterator<Item = KeywordArg<R>> + '_ {
        self.args.iter().map(|(name, value)| KeywordArg {
            name: name.clone(),
            value: value.clone(),
        })
    }

    /// The arguments as a map value.
    pub fn to_value(&self) -> Value<R> {
        Value::Map(self.args.clone())
    }
}

/// Arguments in one of the two call shapes.
#[derive(Debug, Clone)]
pub enum Arguments<R: ReferenceId> {
    Positional(PositionalArgs<R>),
    Keyword(KeywordArgs<R>),
}

impl<R: ReferenceId> Arguments<R> {
    pub fn shape(&self) -> &'static str {
        match self {
            Arguments::Positional(_) => "positional",
            Arguments::Keyword(_) => "keyword",
        }
    }

    pub fn to_value(&self) -> Value<R> {
        match self {
            Arguments::Positional(args) => args.to_value(),
            Arguments::Keyword(args) => args.to_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(n: usize) -> PositionalArgs<String> {
        PositionalArgs::new((0..n as i64).map(Value::Int).collect())
    }

    #[test]
    fn test_missing_positional_is_none() {
        assert!(args(1).get(0).is_some());
        assert!(args(1).get(1).is_none());
    }

    #[test]
    fn test_arity_blames_argument() {
        let err = args(1).check_arity(2, false).unwrap_err();
        assert_eq!(err.to_string(), "argument 2: wanted 2 arguments, got 1");
        let err = args(3).check_arity(2, false).unwrap_err();
        assert_eq!(err.to_string(), "argument 3: wanted 2 arguments, got 3");
        assert!(args(5).check_arity(2, true).is_ok());
        let err = args(0).check_arity(1, true).unwrap_err();
        assert_eq!(err.to_string(), "argument 1: wanted at least 1 argument, got 0");
    }

    #[test]
    fn test_keyword_require() {
        let kw = KeywordArgs::<String>::new(BTreeMap::from([("a".to_string(), Value::Int(1))]));
        assert_eq!(kw.require("a").unwrap().value, Value::Int(1));
        assert!(matches!(kw.require("b"), Err(EvalError::ArgNotFound { .. })));
        assert!(kw.check_names(&["a"]).is_ok());
        assert!(kw.check_names(&["b"]).is_err());
    }
}
