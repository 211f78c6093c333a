//! Shared helpers for walking raw JSON objects.
//!
//! The Virgil wire schema uses configurable field names, residual-key
//! parameter decoding, and cross-field rules, so decoders work directly on
//! [`serde_json::Value`] rather than through derived (de)serialization.
//! These accessors turn the common "field must exist and be of type T"
//! checks into one-liners that produce fully-contextualized errors.

use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};

/// Returns a human-readable name for a JSON value's type, for diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_u64() => "an unsigned integer",
        Value::Number(n) if n.is_i64() => "an integer",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Interprets a value as a JSON object, or fails with a [`CodecError::WrongType`].
pub fn as_object<'a>(value: &'a Value, field: &str) -> CodecResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| CodecError::WrongType {
        field: field.to_string(),
        expected: "an object",
        found: type_name(value),
    })
}

/// Looks up a required field.
pub fn require<'a>(obj: &'a Map<String, Value>, field: &str) -> CodecResult<&'a Value> {
    obj.get(field).ok_or_else(|| CodecError::MissingField {
        field: field.to_string(),
    })
}

/// Looks up a required string field.
pub fn str_field<'a>(obj: &'a Map<String, Value>, field: &str) -> CodecResult<&'a str> {
    let value = require(obj, field)?;
    value.as_str().ok_or_else(|| CodecError::WrongType {
        field: field.to_string(),
        expected: "a string",
        found: type_name(value),
    })
}

/// Looks up a required unsigned-integer field.
pub fn u64_field(obj: &Map<String, Value>, field: &str) -> CodecResult<u64> {
    let value = require(obj, field)?;
    value.as_u64().ok_or_else(|| CodecError::WrongType {
        field: field.to_string(),
        expected: "an unsigned integer",
        found: type_name(value),
    })
}

/// Interprets a value as a JSON float; integers are not silently widened.
pub fn as_float(value: &Value, field: &str) -> CodecResult<f64> {
    value
        .as_f64()
        .filter(|_| value.is_f64())
        .ok_or_else(|| CodecError::WrongType {
            field: field.to_string(),
            expected: "a float",
            found: type_name(value),
        })
}

/// Looks up a required boolean field.
pub fn bool_field(obj: &Map<String, Value>, field: &str) -> CodecResult<bool> {
    let value = require(obj, field)?;
    value.as_bool().ok_or_else(|| CodecError::WrongType {
        field: field.to_string(),
        expected: "a boolean",
        found: type_name(value),
    })
}

/// Looks up an optional string field; present-but-non-string is an error.
pub fn opt_str_field<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
) -> CodecResult<Option<&'a str>> {
    match obj.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| CodecError::WrongType {
                field: field.to_string(),
                expected: "a string",
                found: type_name(value),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!(true)), "a boolean");
        assert_eq!(type_name(&json!(3)), "an unsigned integer");
        assert_eq!(type_name(&json!(-3)), "an integer");
        assert_eq!(type_name(&json!(3.5)), "a number");
        assert_eq!(type_name(&json!("x")), "a string");
        assert_eq!(type_name(&json!([])), "an array");
        assert_eq!(type_name(&json!({})), "an object");
    }

    #[test]
    fn required_field_missing() {
        let m = obj(json!({"a": 1}));
        assert!(matches!(
            require(&m, "b"),
            Err(CodecError::MissingField { .. })
        ));
    }

    #[test]
    fn typed_accessors() {
        let m = obj(json!({"s": "hi", "n": 7, "b": false}));
        assert_eq!(str_field(&m, "s").unwrap(), "hi");
        assert_eq!(u64_field(&m, "n").unwrap(), 7);
        assert!(!bool_field(&m, "b").unwrap());

        assert!(matches!(
            str_field(&m, "n"),
            Err(CodecError::WrongType { expected: "a string", .. })
        ));
        assert!(matches!(
            u64_field(&m, "s"),
            Err(CodecError::WrongType { .. })
        ));
    }

    #[test]
    fn float_rejects_integers() {
        assert_eq!(as_float(&json!(3.5), "v").unwrap(), 3.5);
        assert!(matches!(
            as_float(&json!(3), "v"),
            Err(CodecError::WrongType { expected: "a float", .. })
        ));
        assert!(matches!(
            as_float(&json!(-3), "v"),
            Err(CodecError::WrongType { .. })
        ));
        assert!(as_float(&json!("3.5"), "v").is_err());
    }

    #[test]
    fn optional_string() {
        let m = obj(json!({"s": "hi", "n": 7}));
        assert_eq!(opt_str_field(&m, "s").unwrap(), Some("hi"));
        assert_eq!(opt_str_field(&m, "missing").unwrap(), None);
        assert!(opt_str_field(&m, "n").is_err());
    }
}
