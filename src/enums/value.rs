//! # Value Module
//!
//! Contains the `Value` enum, a plain nested representation of array
//! contents, equivalent to converting a jagged array to native lists.
//!
//! ## Purpose
//! - Output of [`Content::to_value`](crate::Content::to_value) for
//!   inspection and tests.
//! - Input to [`ArrayBuilder::from_values`](crate::ArrayBuilder::from_values).
//! - JSON bridge through `serde_json`.
//!
//! ## Equality
//! Numbers compare by value across `Int`, `UInt` and `Float`, so an
//! `int64` reduction result equals a literal written as `Value::Float`.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::aliases::Result;
use crate::enums::error::JaggedError;
use crate::traits::print::{MAX_PREVIEW, format_float};

/// A nested value: scalar, list, record or tuple.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Named fields, in field order.
    Record(Vec<(String, Value)>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Builds a record value from `(name, value)` pairs.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Number of items of a list value.
    pub fn len(&self) -> Option<usize> {
        self.as_list().map(|l| l.len())
    }

    fn as_number(&self) -> Option<Number> {
        match *self {
            Value::Int(v) => Some(Number::Int(v)),
            Value::UInt(v) => Some(Number::UInt(v)),
            Value::Float(v) => Some(Number::Float(v)),
            _ => None,
        }
    }

    /// Converts to a `serde_json` tree. NaN and infinities become `null`.
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(v) => J::from(*v),
            Value::UInt(v) => J::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v).map(J::Number).unwrap_or(J::Null),
            Value::Str(s) => J::String(s.clone()),
            Value::List(items) | Value::Tuple(items) => {
                J::Array(items.iter().map(|v| v.to_json_value()).collect())
            }
            Value::Record(fields) => J::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }

    pub fn from_json_value(json: &serde_json::Value) -> Value {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(*b),
            J::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Value::Int(v)
                } else if let Some(v) = n.as_u64() {
                    Value::UInt(v)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            J::String(s) => Value::Str(s.clone()),
            J::Array(items) => Value::List(items.iter().map(Value::from_json_value).collect()),
            J::Object(map) => Value::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json_value(v)))
                    .collect(),
            ),
        }
    }

    /// Compact JSON text.
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    pub fn from_json(text: &str) -> Result<Value> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| JaggedError::value("", format!("invalid JSON: {}", e)))?;
        Ok(Value::from_json_value(&json))
    }
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::UInt(a), Number::UInt(b)) => a == b,
            (Number::Int(a), Number::UInt(b)) | (Number::UInt(b), Number::Int(a)) => {
                a >= 0 && a as u64 == b
            }
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Float(a), Number::Int(b)) | (Number::Int(b), Number::Float(a)) => {
                a == b as f64
            }
            (Number::Float(a), Number::UInt(b)) | (Number::UInt(b), Number::Float(a)) => {
                a == b as f64
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a == b;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from_json_value(&json))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

fn write_items(f: &mut Formatter<'_>, items: &[Value], open: &str, close: &str) -> std::fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().take(MAX_PREVIEW).enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    if items.len() > MAX_PREVIEW {
        write!(f, ", ... ({} more)", items.len() - MAX_PREVIEW)?;
    }
    f.write_str(close)
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => write_items(f, items, "[", "]"),
            Value::Tuple(items) => write_items(f, items, "(", ")"),
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality_across_kinds() {
        assert_eq!(Value::Int(3), Value::Float(3.0));
        assert_eq!(Value::UInt(3), Value::Int(3));
        assert_ne!(Value::Int(-1), Value::UInt(u64::MAX));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }

    #[test]
    fn test_json_round_trip() {
        let text = r#"[1.1,[1,2,3],[],{"x":12.3,"y":"wow"},null,true]"#;
        let v = Value::from_json(text).unwrap();
        assert_eq!(v.to_json(), text);
        assert_eq!(v.len(), Some(6));
    }

    #[test]
    fn test_invalid_json_is_value_error() {
        let err = Value::from_json("[1,").unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Value);
    }

    #[test]
    fn test_display_preview() {
        let v = Value::from((0..60i64).collect::<Vec<_>>());
        let s = v.to_string();
        assert!(s.starts_with("[0, 1, 2"));
        assert!(s.ends_with("... (10 more)]"));
        let r = Value::record([("x", Value::Float(1.5)), ("y", Value::from("a"))]);
        assert_eq!(r.to_string(), "{x: 1.5, y: \"a\"}");
    }
}
