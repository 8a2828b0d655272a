//! Transaction state
//!
//! A transaction lives on the session between BEGIN and COMMIT. Updates
//! issued inside it are not applied; they are queued along with the lock of
//! the table they touch, and replayed in order on COMMIT.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::lock;
use crate::error::Result;
use crate::sql::ast::UpdateStatement;

/// An update waiting for COMMIT
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    /// Directory of the database the update was issued against
    pub db_dir: PathBuf,
    pub statement: UpdateStatement,
}

/// Transaction context
#[derive(Debug, Default)]
pub struct Transaction {
    pending: Vec<PendingUpdate>,
    locks: Vec<PathBuf>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the target table and queue the update behind it
    pub fn queue_update(&mut self, db_dir: &Path, statement: UpdateStatement) -> Result<()> {
        let lock = lock::acquire(db_dir, &statement.table_name)?;
        if !self.locks.contains(&lock) {
            self.locks.push(lock);
        }

        debug!(table = %statement.table_name, queued = self.pending.len() + 1, "queued update");
        self.pending.push(PendingUpdate {
            db_dir: db_dir.to_path_buf(),
            statement,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queued updates, oldest first
    pub fn pending(&self) -> &[PendingUpdate] {
        &self.pending
    }

    /// Lock files held by this transaction
    pub fn locks(&self) -> &[PathBuf] {
        &self.locks
    }

    /// Split into the update queue and the locks to release afterwards
    pub fn into_parts(self) -> (Vec<PendingUpdate>, Vec<PathBuf>) {
        (self.pending, self.locks)
    }
}

/// Remove every lock file, carrying on past failures. Returns the first
/// failure.
pub fn release_locks(locks: &[PathBuf]) -> Result<()> {
    let mut first_error = None;
    for path in locks {
        if let Err(e) = lock::release(path) {
            warn!(path = %path.display(), error = %e, "failed to release lock");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
