//! Data type enum, name mapping and lattice operations

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Errors from type name mapping and value inference
#[derive(Debug, Error)]
pub enum TypingError {
    /// Type name is not one of the recognized casting names
    #[error("unknown casting type: {0}")]
    UnknownTypeName(String),

    /// DataType has no external string form
    #[error("unable to get string from data type: {0}")]
    NoStringForm(DataType),

    /// Value has no mapping in the type lattice (bool, null, nested)
    #[error("unknown data type for value: {0}")]
    UnknownValueType(Value),
}

/// Column data types, totally ordered by lattice position
///
/// The discriminants are part of the on-disk/metadata contract and must not
/// be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DataType {
    Unknown = 0,
    Int64 = 1,
    Float64 = 2,
    String = 3,
    Timestamp = 4,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Unknown => "UNKNOWN",
            DataType::Int64 => "INT64",
            DataType::Float64 => "FLOAT64",
            DataType::String => "STRING",
            DataType::Timestamp => "TIMESTAMP",
        };
        f.write_str(name)
    }
}

impl DataType {
    /// Parse a casting type name (case-insensitive, whitespace-trimmed)
    pub fn from_str_name(name: &str) -> Result<Self, TypingError> {
        match name.trim().to_lowercase().as_str() {
            "string" => Ok(DataType::String),
            "integer" => Ok(DataType::Int64),
            "double" => Ok(DataType::Float64),
            "timestamp" => Ok(DataType::Timestamp),
            _ => Err(TypingError::UnknownTypeName(name.to_string())),
        }
    }

    /// External string form, the inverse of [`DataType::from_str_name`]
    ///
    /// `Unknown` has no external form and errors.
    pub fn as_str_name(self) -> Result<&'static str, TypingError> {
        match self {
            DataType::String => Ok("string"),
            DataType::Int64 => Ok("integer"),
            DataType::Float64 => Ok("double"),
            DataType::Timestamp => Ok("timestamp"),
            DataType::Unknown => Err(TypingError::NoStringForm(self)),
        }
    }

    /// Infer the data type of a decoded JSON scalar
    ///
    /// Booleans, nulls, arrays and objects have no column type and error;
    /// callers treat that as skip-column.
    pub fn from_value(value: &Value) -> Result<Self, TypingError> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(DataType::Int64),
            Value::Number(_) => Ok(DataType::Float64),
            Value::String(_) => Ok(DataType::String),
            other => Err(TypingError::UnknownValueType(other.clone())),
        }
    }
}

/// Normalize a parsed JSON number literal: integer first, then float
///
/// The literal form is re-parsed so that `5` stays an integer and `5.0`
/// becomes a float. Values that fail both parses, and non-numbers, are
/// returned unchanged.
pub fn reformat_value(value: Value) -> Value {
    match value {
        Value::Number(n) => {
            let literal = n.to_string();
            if let Ok(i) = literal.parse::<i64>() {
                return Value::from(i);
            }
            if let Ok(f) = literal.parse::<f64>() {
                if let Some(reparsed) = serde_json::Number::from_f64(f) {
                    return Value::Number(reparsed);
                }
            }
            Value::Number(n)
        }
        other => other,
    }
}

/// True iff `from` values can be stored in a column of type `to`
///
/// Widening only: `INT64 < FLOAT64 < STRING`, `TIMESTAMP < STRING`.
/// `UNKNOWN` is convertible to anything.
pub fn is_convertible(from: DataType, to: DataType) -> bool {
    if from == to || from == DataType::Unknown {
        return true;
    }
    matches!(
        (from, to),
        (DataType::Int64, DataType::Float64)
            | (DataType::Int64, DataType::String)
            | (DataType::Float64, DataType::String)
            | (DataType::Timestamp, DataType::String)
    )
}

/// Least upper bound of two types in the lattice
///
/// Incomparable non-`UNKNOWN` pairs (e.g. `INT64` and `TIMESTAMP`) resolve
/// to `STRING`, the universal fallback.
pub fn common_ancestor(a: DataType, b: DataType) -> DataType {
    if a == b {
        return a;
    }
    if a == DataType::Unknown {
        return b;
    }
    if b == DataType::Unknown {
        return a;
    }
    if is_convertible(a, b) {
        return b;
    }
    if is_convertible(b, a) {
        return a;
    }
    DataType::String
}

#[cfg(test)]
#[path = "datatype_test.rs"]
mod datatype_test;
