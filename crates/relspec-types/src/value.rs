//! The document value model.
//!
//! A [`Value`] is a JSON-compatible datum extended with byte strings,
//! timestamps, and deferred [`Expandable`] producers. Maps are ordered by key
//! so every traversal and rendering is deterministic.

use crate::error::{EvalError, EvalResult};
use crate::evaluation::Expandable;
use crate::reference::ReferenceId;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A string-keyed mapping of values.
pub type Map<R> = BTreeMap<String, Value<R>>;

/// A document value.
#[derive(Clone)]
pub enum Value<R: ReferenceId> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
    List(Vec<Value<R>>),
    Map(Map<R>),
    /// A producer whose result is computed on demand.
    Expandable(Rc<dyn Expandable<R>>),
}

impl<R: ReferenceId> Value<R> {
    /// The name of this value's type as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Time(_) => "time",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Expandable(_) => "expandable",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_expandable(&self) -> bool {
        matches!(self, Value::Expandable(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<R>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map<R>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Numeric view of an `Int` or `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value<R>)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert any serializable Rust value into a document value.
    ///
    /// Types that do not serialize to JSON (maps with non-string keys, for
    /// instance) surface as [`EvalError::UnsupportedValue`].
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> EvalResult<Self> {
        serde_json::to_value(value)
            .map(Value::from)
            .map_err(|_| EvalError::UnsupportedValue {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Convert to a plain JSON value.
    ///
    /// Bytes become standard base64 and times RFC 3339 strings. Non-finite
    /// floats become `null`. Expandables cannot be represented and fail with
    /// [`EvalError::UnsupportedValue`].
    pub fn to_json(&self) -> EvalResult<serde_json::Value> {
        use serde_json::Value as Json;
        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::String(BASE64.encode(b)),
            Value::Time(t) => Json::String(format_time(t)),
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<EvalResult<Vec<_>>>()?,
            ),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<EvalResult<serde_json::Map<_, _>>>()?,
            ),
            Value::Expandable(_) => {
                return Err(EvalError::UnsupportedValue {
                    type_name: self.type_name().to_string(),
                })
            }
        })
    }

    /// Stringify a scalar for template concatenation.
    ///
    /// `null` is the empty string, bytes are decoded as UTF-8, times are
    /// RFC 3339 with nanoseconds, and numbers and booleans use their decimal
    /// form. Lists, maps and expandables are rejected.
    pub fn to_template_string(&self) -> EvalResult<String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(format_float(*f)),
            Value::String(s) => Ok(s.clone()),
            Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
            Value::Time(t) => Ok(format_time(t)),
            other => Err(EvalError::unexpected_type(
                &["null", "bool", "int", "float", "string", "bytes", "time"],
                other.type_name(),
            )),
        }
    }

    /// Equality without numeric coercion: `Int(1)` and `Float(1.0)` differ.
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => false,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.strict_eq(vb))
            }
            (a, b) => a == b,
        }
    }
}

/// Format a float the way templates print numbers: shortest decimal, no exponent.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "+Inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        f.to_string()
    }
}

/// Format a timestamp as RFC 3339 with trailing zeros of the fraction trimmed.
pub fn format_time(t: &DateTime<Utc>) -> String {
    let mut out = t.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = t.timestamp_subsec_nanos();
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

// ── Trait impls ──────────────────────────────────────────────────────────────

impl<R: ReferenceId> fmt::Debug for Value<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Bytes(b) => write!(f, "Bytes({b:?})"),
            Value::Time(t) => write!(f, "Time({})", format_time(t)),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Expandable(e) => write!(f, "Expandable({:p})", Rc::as_ptr(e)),
        }
    }
}

impl<R: ReferenceId> PartialEq for Value<R> {
    /// Structural equality; integers and floats compare numerically and
    /// expandables compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Expandable(a), Value::Expandable(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl<R: ReferenceId> Serialize for Value<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&BASE64.encode(b)),
            Value::Time(t) => serializer.serialize_str(&format_time(t)),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
            Value::Expandable(_) => Err(S::Error::custom(
                "an unevaluated expandable cannot be serialized",
            )),
        }
    }
}

impl<R: ReferenceId> From<serde_json::Value> for Value<R> {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl<R: ReferenceId> From<bool> for Value<R> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<R: ReferenceId> From<i64> for Value<R> {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl<R: ReferenceId> From<f64> for Value<R> {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<R: ReferenceId> From<&str> for Value<R> {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<R: ReferenceId> From<String> for Value<R> {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<R: ReferenceId> From<Vec<Value<R>>> for Value<R> {
    fn from(items: Vec<Value<R>>) -> Self {
        Value::List(items)
    }
}

impl<R: ReferenceId> From<Map<R>> for Value<R> {
    fn from(map: Map<R>) -> Self {
        Value::Map(map)
    }
}

impl<R: ReferenceId> From<DateTime<Utc>> for Value<R> {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}
