//! Session state
//!
//! A session is the per-process context every statement runs against: the
//! data root, the current database and the open transaction, if any.

use std::path::PathBuf;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::QueryResult;
use crate::sql::parse_statement;
use crate::storage::{DatabaseDir, TableFile};
use crate::transaction::Transaction;

/// Session context
#[derive(Debug)]
pub struct Session {
    databases: DatabaseDir,
    current_db: Option<String>,
    transaction: Option<Transaction>,
    sync_writes: bool,
}

impl Session {
    /// Create a session over the data root `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            databases: DatabaseDir::new(data_dir),
            current_db: None,
            transaction: None,
            sync_writes: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data_dir).sync_writes(config.sync_writes)
    }

    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn databases(&self) -> &DatabaseDir {
        &self.databases
    }

    pub fn current_database(&self) -> Option<&str> {
        self.current_db.as_deref()
    }

    pub fn set_current_database(&mut self, name: Option<String>) {
        self.current_db = name;
    }

    /// Directory of the current database
    pub fn db_dir(&self) -> Result<PathBuf> {
        let name = self.current_db.as_deref().ok_or(Error::NoDatabaseSelected)?;
        self.databases.open(name)
    }

    /// Handle to a table of the current database
    pub fn table(&self, name: &str) -> Result<TableFile> {
        Ok(TableFile::new(&self.db_dir()?, name).sync_writes(self.sync_writes))
    }

    pub(crate) fn write_sync(&self) -> bool {
        self.sync_writes
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    pub(crate) fn transaction_mut(&mut self) -> Option<&mut Transaction> {
        self.transaction.as_mut()
    }

    /// Open a transaction
    pub(crate) fn begin(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(Error::TransactionInProgress);
        }
        self.transaction = Some(Transaction::new());
        Ok(())
    }

    /// Detach the open transaction
    pub(crate) fn take_transaction(&mut self) -> Option<Transaction> {
        self.transaction.take()
    }

    /// Parse and run one statement
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let statement = parse_statement(sql)?;
        debug!(?statement, "parsed statement");
        statement.execute(self)
    }
}
