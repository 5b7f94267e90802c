//! Dynamically typed cell values shared by every backend.
//!
//! A [`Value`] is what a backend hands back when the core asks for samples or
//! grouped frequencies, and what rule parameters are bound to before a
//! predicate is built. It serializes as a plain JSON scalar.

use std::cmp::Ordering;
use std::fmt;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use serde::{Serialize, Serializer};

use crate::error::Result;

/// A single cell of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

/// Hashable identity of a non-null value, used for distinct counts and grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Bool(bool),
    Integer(i64),
    Number(u64),
    Text(String),
}

impl Value {
    /// Returns true for a genuine null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value as a float if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if the value is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as text, the way a string cast would. Null stays `None`.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Number(n) => Some(format!("{n:?}")),
            Value::Text(s) => Some(s.clone()),
        }
    }

    /// Orders two values when they are comparable.
    ///
    /// Numbers compare numerically across integer and float representations,
    /// floats use IEEE total ordering so NaN sorts above every number. Values
    /// of unrelated kinds, and nulls, are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Some(x.total_cmp(&y)),
                _ => None,
            },
        }
    }

    /// Returns the grouping identity of the value, `None` for null.
    ///
    /// Integral floats share a key with the equal integer, and every NaN maps
    /// to one key.
    pub fn group_key(&self) -> Option<GroupKey> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(GroupKey::Bool(*b)),
            Value::Integer(i) => Some(GroupKey::Integer(*i)),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    Some(GroupKey::Integer(*n as i64))
                } else if n.is_nan() {
                    Some(GroupKey::Number(f64::NAN.to_bits()))
                } else {
                    Some(GroupKey::Number(n.to_bits()))
                }
            }
            Value::Text(s) => Some(GroupKey::Text(s.clone())),
        }
    }

    /// Converts a JSON scalar into a value. Arrays and objects are rejected.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_f64().map(Value::Number)),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Reads one row of an Arrow array.
    ///
    /// Types without a direct mapping fall back to Arrow's display formatting.
    pub fn from_arrow(array: &dyn Array, row: usize) -> Result<Value> {
        if array.is_null(row) {
            return Ok(Value::Null);
        }

        let value = match array.data_type() {
            DataType::Null => Value::Null,
            DataType::Boolean => Value::Bool(array.as_boolean().value(row)),
            DataType::Int8 => Value::Integer(array.as_primitive::<Int8Type>().value(row) as i64),
            DataType::Int16 => Value::Integer(array.as_primitive::<Int16Type>().value(row) as i64),
            DataType::Int32 => Value::Integer(array.as_primitive::<Int32Type>().value(row) as i64),
            DataType::Int64 => Value::Integer(array.as_primitive::<Int64Type>().value(row)),
            DataType::UInt8 => Value::Integer(array.as_primitive::<UInt8Type>().value(row) as i64),
            DataType::UInt16 => {
                Value::Integer(array.as_primitive::<UInt16Type>().value(row) as i64)
            }
            DataType::UInt32 => {
                Value::Integer(array.as_primitive::<UInt32Type>().value(row) as i64)
            }
            DataType::UInt64 => {
                let raw = array.as_primitive::<UInt64Type>().value(row);
                i64::try_from(raw)
                    .map(Value::Integer)
                    .unwrap_or(Value::Number(raw as f64))
            }
            DataType::Float32 => {
                Value::Number(array.as_primitive::<Float32Type>().value(row) as f64)
            }
            DataType::Float64 => Value::Number(array.as_primitive::<Float64Type>().value(row)),
            DataType::Utf8 => Value::Text(array.as_string::<i32>().value(row).to_string()),
            DataType::LargeUtf8 => Value::Text(array.as_string::<i64>().value(row).to_string()),
            DataType::Utf8View => Value::Text(array.as_string_view().value(row).to_string()),
            _ => Value::Text(arrow::util::display::array_value_to_string(array, row)?),
        };

        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
