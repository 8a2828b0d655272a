//! Table lock files
//!
//! A lock is the file `.{table}_lock` inside the database directory holding
//! the decimal pid of the process that owns it. Creation is exclusive, so two
//! processes can never both believe they took the same lock. Nothing waits:
//! a lock held by another process is reported straight away.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Path of the lock file guarding `table`
pub fn lock_path(db_dir: &Path, table: &str) -> PathBuf {
    db_dir.join(format!(".{}_lock", table))
}

/// Take the lock on `table` for this process.
///
/// Taking a lock this process already holds succeeds without touching the
/// file. Returns the lock file path.
pub fn acquire(db_dir: &Path, table: &str) -> Result<PathBuf> {
    let path = lock_path(db_dir, table);
    let pid = std::process::id().to_string();

    match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(mut file) => {
            if let Err(e) = file.write_all(pid.as_bytes()) {
                fs::remove_file(&path).ok();
                return Err(e.into());
            }
            debug!(table, pid = %pid, "acquired lock");
            Ok(path)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            // removed since the create: reported as an unknown holder
            let owner = holder(db_dir, table)?.unwrap_or_default();
            if owner == pid {
                Ok(path)
            } else {
                warn!(table, holder = %owner, "table is locked by another process");
                Err(Error::LockConflict {
                    table: table.to_string(),
                    pid: if owner.is_empty() {
                        "unknown".to_string()
                    } else {
                        owner
                    },
                })
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove a lock file. A lock that is already gone counts as released.
pub fn release(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "released lock");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Holder of a lock, if any
pub fn holder(db_dir: &Path, table: &str) -> Result<Option<String>> {
    match fs::read_to_string(lock_path(db_dir, table)) {
        Ok(pid) => Ok(Some(pid.trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
