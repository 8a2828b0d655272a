//! Error types for PlainDB
//!
//! This module defines all error types used throughout the database engine.

use thiserror::Error;

/// The main error type for PlainDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Parser Errors ==========
    #[error("Parse error: {0}")]
    Parse(String),

    // ========== Not Found ==========
    #[error("Failed to use database '{0}' because it does not exist")]
    DatabaseNotFound(String),

    #[error("Table '{0}' does not exist")]
    TableNotFound(String),

    #[error("Column '{0}' does not exist in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("No database selected, run USE <database> first")]
    NoDatabaseSelected,

    // ========== Already Exists ==========
    #[error("Database '{0}' already exists")]
    DatabaseAlreadyExists(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Column '{0}' already exists in table '{1}'")]
    ColumnAlreadyExists(String, String),

    // ========== Type Errors ==========
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },

    // ========== Storage Errors ==========
    #[error("Malformed data in table '{table}': {reason}")]
    MalformedData { table: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Transaction Errors ==========
    #[error("Table '{table}' is locked by process {pid}")]
    LockConflict { table: String, pid: String },

    #[error("Transaction abort: {0}")]
    TransactionAbort(String),

    #[error("A transaction is already in progress")]
    TransactionInProgress,

    // ========== Execution Errors ==========
    #[error("Unsupported: {0}")]
    Unsupported(String),

    // ========== Configuration Errors ==========
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `MalformedData` error for the given table
    pub fn malformed(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedData {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for PlainDB operations
pub type Result<T> = std::result::Result<T, Error>;
