//! Typed property values stored on items.
//!
//! [`Value`] is the variant type carried by every data role of an item.
//! It is deliberately small: items store scalars, everything structured
//! is expressed through child items and tags.

use serde::{Deserialize, Serialize};

/// A typed scalar value held by an item data role.
///
/// Serializes with an explicit `kind` tag so numeric types round-trip
/// exactly through JSON documents.
///
/// # Example
///
/// ```
/// use trellis_model::Value;
///
/// let value = Value::from(42.5);
/// assert_eq!(value.as_float(), Some(42.5));
/// assert!(value.as_str().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

impl Value {
    /// Attempts to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the value as a float.
    ///
    /// Integers are not silently widened; an `Int` returns `None`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from("abc").as_str(), Some("abc"));

        // No cross-type coercion.
        assert_eq!(Value::from(7).as_float(), None);
        assert_eq!(Value::from(1.5).as_int(), None);
    }

    #[test]
    fn test_json_round_trip_preserves_numeric_kind() {
        let float = Value::Float(5.0);
        let json = serde_json::to_string(&float).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, float);

        let int = Value::Int(5);
        let json = serde_json::to_string(&int).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, int);
    }
}
