//! Value types for PlainDB
//!
//! This module defines how literal values are represented in memory and how
//! they render into the table file format.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::catalog::DataType;
use crate::error::{Error, Result};

/// A value in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    Null,
    /// Integer value (64-bit)
    Int(i64),
    /// Float value (64-bit)
    Float(f64),
    /// String value, used for both char and varchar columns
    String(String),
}

// Floats compare bitwise so equality is structural and reflexive
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The value's own type tag. Strings report their actual length, not the
    /// capacity of whatever column they end up in.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::String(s) => DataType::VarChar(s.chars().count()),
        }
    }

    /// Try to convert to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether this value may be stored in a column of type `column`.
    ///
    /// Numerics must match exactly. A string fits `varchar(N)` when it has at
    /// most N characters and `char(N)` when it has exactly N. NULL fits
    /// anything.
    pub fn compatible_with(&self, column: &DataType) -> bool {
        match (self, column) {
            (Value::Null, _) => true,
            (Value::Int(_), DataType::Int) => true,
            (Value::Float(_), DataType::Float) => true,
            (Value::String(s), DataType::VarChar(n)) => s.chars().count() <= *n,
            (Value::String(s), DataType::Char(n)) => s.chars().count() == *n,
            _ => false,
        }
    }

    /// Order two numeric values. Mixed int/float compares as f64.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        let incomparable = || Error::Incomparable {
            left: self.to_string(),
            right: other.to_string(),
        };

        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            _ => {
                let a = self.as_f64().ok_or_else(incomparable)?;
                let b = other.as_f64().ok_or_else(incomparable)?;
                a.partial_cmp(&b).ok_or_else(incomparable)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => {
                // keep a fractional part so the value reads back as a float
                let rendered = v.to_string();
                if rendered.contains('.') || !v.is_finite() {
                    write!(f, "{}", rendered)
                } else {
                    write!(f, "{}.0", rendered)
                }
            }
            Value::String(s) => write!(f, "'{}'", s),
        }
    }
}
