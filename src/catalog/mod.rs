//! Catalog module
//!
//! This module contains schema definitions and data types.

pub mod schema;
pub mod types;

pub use schema::{Column, ColumnMap, Schema};
pub use types::DataType;
