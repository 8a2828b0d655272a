//! Database directories
//!
//! A database is a directory under the data root; its tables are the files
//! inside it.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Resolves database names against a data root
#[derive(Debug, Clone)]
pub struct DatabaseDir {
    root: PathBuf,
}

impl DatabaseDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory of database `name`
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_dir()
    }

    pub fn create(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::create_dir(&path).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => Error::DatabaseAlreadyExists(name.to_string()),
            _ => Error::Io(e),
        })?;
        Ok(path)
    }

    pub fn drop_database(&self, name: &str) -> Result<()> {
        if !self.exists(name) {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        fs::remove_dir_all(self.path(name))?;
        Ok(())
    }

    /// Path of an existing database
    pub fn open(&self, name: &str) -> Result<PathBuf> {
        if self.exists(name) {
            Ok(self.path(name))
        } else {
            Err(Error::DatabaseNotFound(name.to_string()))
        }
    }
}
