//! Data types for PlainDB
//!
//! This module defines the column types supported by the database.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit integer
    Int,
    /// Double-precision floating point
    Float,
    /// Fixed-length character string
    Char(usize),
    /// Variable-length character string with max length
    VarChar(usize),
    /// Type tag of a NULL literal; never declared on a column
    Null,
}

impl DataType {
    /// Map a type name (as written in a header or CREATE statement) to a type.
    ///
    /// `size` is only read for `char` and `varchar`.
    pub fn new(name: &str, size: usize) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "int" => Ok(DataType::Int),
            "float" => Ok(DataType::Float),
            "char" => Ok(DataType::Char(size)),
            "varchar" => Ok(DataType::VarChar(size)),
            _ => Err(Error::UnknownType(name.to_string())),
        }
    }

    /// Whether this type carries a declared capacity, i.e. must be written as
    /// `name(N)`
    pub fn is_sized(name: &str) -> bool {
        matches!(name.to_ascii_lowercase().as_str(), "char" | "varchar")
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Char(n) => write!(f, "char({})", n),
            DataType::VarChar(n) => write!(f, "varchar({})", n),
            DataType::Null => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_name() {
        assert_eq!(DataType::new("int", 0).unwrap(), DataType::Int);
        assert_eq!(DataType::new("FLOAT", 0).unwrap(), DataType::Float);
        assert_eq!(DataType::new("char", 3).unwrap(), DataType::Char(3));
        assert_eq!(DataType::new("varchar", 20).unwrap(), DataType::VarChar(20));
        assert!(matches!(
            DataType::new("blob", 0),
            Err(Error::UnknownType(name)) if name == "blob"
        ));
    }

    #[test]
    fn test_type_display() {
        assert_eq!(DataType::Int.to_string(), "int");
        assert_eq!(DataType::Float.to_string(), "float");
        assert_eq!(DataType::Char(4).to_string(), "char(4)");
        assert_eq!(DataType::VarChar(10).to_string(), "varchar(10)");
    }

    #[test]
    fn test_type_classes() {
        assert!(DataType::is_sized("VARCHAR"));
        assert!(!DataType::is_sized("int"));
    }
}
