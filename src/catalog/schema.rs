//! Schema definitions for PlainDB
//!
//! This module defines table schemas, column metadata and the column-name to
//! ordinal map every positional lookup goes through.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::DataType;
use crate::error::{Error, Result};

/// Column definition in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}

/// Table schema - the ordered columns of a table header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema from a list of columns
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Append a column to the schema
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column_index(name).is_some()
    }

    /// Build the name -> ordinal map for a table with this schema. Columns
    /// also resolve as `table.column`.
    pub fn column_map(&self, table: &str) -> ColumnMap {
        let mut map = ColumnMap::new(table);
        map.extend(self, &[table], 0);
        map
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", column)?;
        }
        Ok(())
    }
}

/// Maps column references to row ordinals.
///
/// Plain names resolve to the first column with that name. Qualified names
/// (`alias.column`, `table.column`) are registered for joined rows where
/// both sides may share a column name.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// Name used in error messages
    source: String,
    ordinals: IndexMap<String, usize>,
}

impl ColumnMap {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ordinals: IndexMap::new(),
        }
    }

    /// Register every column of `schema` starting at ordinal `offset`, under
    /// its plain name and under each of `qualifiers`
    pub fn extend(&mut self, schema: &Schema, qualifiers: &[&str], offset: usize) {
        for (i, column) in schema.columns().iter().enumerate() {
            let ordinal = offset + i;
            self.ordinals.entry(column.name.clone()).or_insert(ordinal);
            for qualifier in qualifiers {
                self.ordinals
                    .entry(format!("{}.{}", qualifier, column.name))
                    .or_insert(ordinal);
            }
        }
    }

    /// Look up the ordinal of a column reference
    pub fn ordinal(&self, name: &str) -> Result<usize> {
        self.ordinals
            .get(name)
            .copied()
            .ok_or_else(|| Error::ColumnNotFound(name.to_string(), self.source.clone()))
    }

    /// Whether a reference resolves
    pub fn contains(&self, name: &str) -> bool {
        self.ordinals.contains_key(name)
    }
}
