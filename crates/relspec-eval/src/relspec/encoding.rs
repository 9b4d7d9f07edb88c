//! `{"$encoding": …, "data": …}` wrappers.

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use relspec_types::{
    Annotation, Context, DynEvaluator, EvalError, EvalResult, Evaluation, Map, Metadata,
    ReferenceId, Value, DEPTH_FULL,
};

pub const ENCODING_KEY: &str = "$encoding";
pub const DATA_KEY: &str = "data";

/// Encodings understood by [`decode`].
pub const ENCODINGS: [&str; 3] = ["base64", "base64url", "utf8"];

/// The encoding name and data of an encoding wrapper, if `map` is one.
pub(super) fn encoding_wrapper<R: ReferenceId>(map: &Map<R>) -> Option<(&str, &Value<R>)> {
    if map.len() != 2 {
        return None;
    }
    let encoding = map.get(ENCODING_KEY)?.as_str()?;
    let data = map.get(DATA_KEY)?;
    Some((encoding, data))
}

/// Evaluate the wrapped data and decode it to a string.
pub(super) fn resolve_encoding<R: ReferenceId>(
    ctx: &Context,
    encoding: &str,
    data: &Value<R>,
    next: &DynEvaluator<R>,
) -> EvalResult<Evaluation<R>> {
    let invalid = |cause: EvalError| EvalError::InvalidEncoding {
        encoding: encoding.to_string(),
        cause: Box::new(cause),
    };
    let result = next
        .evaluate(ctx, data, DEPTH_FULL)
        .map_err(|e| e.at_path(DATA_KEY))?;
    let mut metadata = Metadata {
        annotation: Some(Annotation::encoding(encoding)),
        ..Metadata::default()
    };
    if !result.ok() {
        let value = Value::map([
            (ENCODING_KEY, Value::String(encoding.to_string())),
            (DATA_KEY, result.value.clone()),
        ]);
        metadata.add_step(result, vec![Annotation::object_key(DATA_KEY)]);
        return Ok(Evaluation { metadata, value });
    }
    let decoded = decode(encoding, &result.value).map_err(invalid)?;
    metadata.add_step(result, vec![Annotation::object_key(DATA_KEY)]);
    Ok(Evaluation {
        metadata,
        value: Value::String(decoded),
    })
}

/// Decode `data` with the named encoding.
pub fn decode<R: ReferenceId>(encoding: &str, data: &Value<R>) -> EvalResult<String> {
    let text = data
        .as_str()
        .ok_or_else(|| EvalError::unexpected_type(&["string"], data.type_name()))?;
    let bytes = match encoding {
        "base64" => STANDARD.decode(text).map_err(decode_error)?,
        "base64url" => URL_SAFE
            .decode(text)
            .or_else(|_| URL_SAFE_NO_PAD.decode(text))
            .map_err(decode_error)?,
        "utf8" => return Ok(text.to_string()),
        other => {
            return Err(EvalError::UnknownEncoding {
                encoding: other.to_string(),
            })
        }
    };
    String::from_utf8(bytes).map_err(decode_error)
}

/// Encode `text` with the named encoding.
pub fn encode(encoding: &str, text: &str) -> EvalResult<String> {
    match encoding {
        "base64" => Ok(STANDARD.encode(text)),
        "base64url" => Ok(URL_SAFE.encode(text)),
        "utf8" => Ok(text.to_string()),
        other => Err(EvalError::UnknownEncoding {
            encoding: other.to_string(),
        }),
    }
}

fn decode_error(e: impl std::fmt::Display) -> EvalError {
    EvalError::Decode {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value<String> {
        Value::String(text.to_string())
    }

    #[test]
    fn test_decode_each_encoding() {
        assert_eq!(decode("base64", &s("aGVsbG8=")).unwrap(), "hello");
        assert_eq!(decode("base64url", &s("Pz8_")).unwrap(), "???");
        assert_eq!(decode("base64url", &s("aGk")).unwrap(), "hi");
        assert_eq!(decode("utf8", &s("plain")).unwrap(), "plain");
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode("rot13", &s("x")),
            Err(EvalError::UnknownEncoding { .. })
        ));
        assert!(matches!(
            decode("base64", &s("not base64!")),
            Err(EvalError::Decode { .. })
        ));
        assert!(matches!(
            decode::<String>("base64", &Value::Int(1)),
            Err(EvalError::UnexpectedType { .. })
        ));
        // 0xff is not UTF-8.
        assert!(matches!(
            decode("base64", &s("/w==")),
            Err(EvalError::Decode { .. })
        ));
    }

    #[test]
    fn test_wrapper_shape() {
        let wrapper: Map<String> = [
            (ENCODING_KEY.to_string(), s("base64")),
            (DATA_KEY.to_string(), s("aGk=")),
        ]
        .into_iter()
        .collect();
        assert_eq!(encoding_wrapper(&wrapper).map(|(e, _)| e), Some("base64"));

        let mut extra = wrapper.clone();
        extra.insert("other".to_string(), Value::Null);
        assert!(encoding_wrapper(&extra).is_none());
    }
}
