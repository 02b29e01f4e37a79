//! JSON annotation - append key/value pairs to a JSON object string
//!
//! The object is parsed, extended and re-serialized rather than spliced
//! textually, so injected values are always escaped correctly. Key order of
//! the input is preserved (`serde_json` is built with `preserve_order`) and
//! new keys are appended after the existing ones, which matches the layout
//! a textual `...,"k":"v"}` splice would have produced. Numbers keep their
//! source text (`arbitrary_precision`), so wide integers and exponent
//! forms come out exactly as they went in.
//!
//! ```text
//! {"a":1}  +  [engine_name=eng1, container_id=c1]
//!     ──►  {"a":1,"engine_name":"eng1","container_id":"c1"}
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

/// Annotation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    /// Input is not a JSON object
    #[error("{0}")]
    NotAnObject(String),

    /// Re-serializing the extended object failed
    #[error("{0}")]
    Serialize(String),
}

/// Parse `text` as a JSON object, preserving key order
pub(crate) fn parse_object(text: &str) -> Result<Map<String, Value>, AnnotateError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AnnotateError::NotAnObject(format!(
            "expected a JSON object, found {}",
            json_type(&other)
        ))),
        Err(e) => Err(AnnotateError::NotAnObject(e.to_string())),
    }
}

/// Append `extra` pairs to the JSON object in `json_text`
///
/// With no extra pairs the input is returned untouched. A key that already
/// exists in the object takes the annotated value and keeps its position.
pub fn annotate<I, K, V>(json_text: &str, extra: I) -> Result<String, AnnotateError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut extra = extra.into_iter().peekable();
    if extra.peek().is_none() {
        return Ok(json_text.to_string());
    }

    let mut object = parse_object(json_text)?;
    for (key, value) in extra {
        object.insert(key.into(), Value::String(value.into()));
    }

    serde_json::to_string(&Value::Object(object))
        .map_err(|e| AnnotateError::Serialize(e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
