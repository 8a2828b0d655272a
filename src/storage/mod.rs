//! Storage engine module
//!
//! This module contains the storage engine components:
//! - Values and rows
//! - The text codec for table files
//! - Table files and database directories

pub mod codec;
pub mod database;
pub mod row;
pub mod table;
pub mod value;

pub use database::DatabaseDir;
pub use row::Row;
pub use table::{TableData, TableFile};
pub use value::Value;
