//! The Value type - structured data kept by the emulated storages.
//!
//! Values are what the key-value store holds. Cloning a `Value` is a deep
//! copy, which is exactly the "structured clone" the store promises on the
//! way in and on the way out.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::ShimError;

/// A tree-shaped value.
///
/// # Design Notes
///
/// - Uses `BTreeMap` for deterministic ordering
/// - Includes `Bytes` for binary data, which JSON lacks
/// - Uses `i64` for integers
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Look up a field of a map value.
    ///
    /// Returns `None` for missing fields and for non-map values.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(name),
            _ => None,
        }
    }

    /// Set a field on a map value, returning the previous value.
    ///
    /// # Errors
    ///
    /// Fails with a validation error when `self` is not a map.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Result<Option<Value>, ShimError> {
        match self {
            Value::Map(map) => Ok(map.insert(name.into(), value)),
            _ => Err(ShimError::validation("cannot set a field on a non-map value")),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to JSON. Bytes become base64 strings.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => serde_json::Value::String(codec::base64_encode(&b)),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(Value::into_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Convert a Rust type to a Value via serde.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value, ShimError> {
    let json = serde_json::to_value(data)
        .map_err(|e| ShimError::validation(format!("cannot encode value: {}", e)))?;
    Ok(Value::from(json))
}

/// Convert a Value to a Rust type via serde.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ShimError> {
    serde_json::from_value(value.into_json())
        .map_err(|e| ShimError::validation(format!("cannot decode value: {}", e)))
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Upload {
        root: String,
        shards: Vec<String>,
    }

    #[test]
    fn field_lookup() {
        let value = Value::Map(btree! {
            "id".to_string() => Value::from("abc"),
            "size".to_string() => Value::from(3i64),
        });

        assert_eq!(value.field("id").and_then(Value::as_str), Some("abc"));
        assert_eq!(value.field("size").and_then(Value::as_i64), Some(3));
        assert_eq!(value.field("missing"), None);
        assert_eq!(Value::from("scalar").field("id"), None);
    }

    #[test]
    fn set_field_requires_map() {
        let mut value = Value::map();
        assert_eq!(value.set_field("a", Value::from(1i64)).unwrap(), None);
        assert!(Value::Null.set_field("a", Value::Null).is_err());
    }

    #[test]
    fn bytes_become_base64_in_json() {
        let json = Value::Bytes(b"hello".to_vec()).into_json();
        assert_eq!(json, serde_json::json!("aGVsbG8="));
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let json = serde_json::json!({"a": [1, 2.5, "x", null, true]});
        let value = Value::from(json.clone());
        assert!(value.is_map());
        assert_eq!(value.into_json(), json);
    }

    #[test]
    fn serde_roundtrip_through_value() {
        let upload = Upload {
            root: "bafy".to_string(),
            shards: vec!["s1".to_string()],
        };
        let value = to_value(&upload).unwrap();
        assert_eq!(value.field("root").and_then(Value::as_str), Some("bafy"));

        let back: Upload = from_value(value).unwrap();
        assert_eq!(back, upload);
    }

    #[test]
    fn from_value_type_mismatch_is_validation_error() {
        let result: Result<Upload, _> = from_value(Value::from(1i64));
        assert_eq!(result.unwrap_err().kind(), crate::ErrorKind::Validation);
    }
}
