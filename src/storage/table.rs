//! Table files
//!
//! Every mutation builds the complete new contents in memory and swaps them
//! in with a temp file and a rename, so a failed or interrupted statement
//! leaves either the old file or the new one, never a mix.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::codec;
use crate::catalog::Schema;
use crate::error::{Error, Result};
use crate::storage::Row;

/// Decoded contents of a table file
#[derive(Debug, Clone)]
pub struct TableData {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

/// Handle to one table file inside a database directory
#[derive(Debug, Clone)]
pub struct TableFile {
    name: String,
    path: PathBuf,
    sync_writes: bool,
}

impl TableFile {
    pub fn new(db_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: db_dir.join(name),
            sync_writes: true,
        }
    }

    /// Toggle `fsync` before the rename
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_file_name(format!(".{}.tmp", self.name))
    }

    fn not_found(&self, err: std::io::Error) -> Error {
        if err.kind() == ErrorKind::NotFound {
            Error::TableNotFound(self.name.clone())
        } else {
            Error::Io(err)
        }
    }

    /// Create the file with just a header. Fails if the table already exists.
    pub fn create(&self, schema: &Schema) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    Error::TableAlreadyExists(self.name.clone())
                } else {
                    Error::Io(e)
                }
            })?;
        file.write_all(codec::encode_header(schema).as_bytes())?;
        if self.sync_writes {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Delete the file
    pub fn drop_file(&self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| self.not_found(e))
    }

    /// Read only the header
    pub fn read_schema(&self) -> Result<Schema> {
        let contents = fs::read_to_string(&self.path).map_err(|e| self.not_found(e))?;
        let header = contents
            .lines()
            .next()
            .ok_or_else(|| Error::malformed(&self.name, "missing header"))?;
        codec::decode_header(&self.name, header)
    }

    /// Read and decode the whole table. Any undecodable line, or a row whose
    /// arity differs from the header, fails the read.
    pub fn read(&self) -> Result<TableData> {
        let contents = fs::read_to_string(&self.path).map_err(|e| self.not_found(e))?;
        let mut lines = contents.lines();
        let header = lines
            .next()
            .ok_or_else(|| Error::malformed(&self.name, "missing header"))?;
        let schema = codec::decode_header(&self.name, header)?;

        let mut rows = Vec::new();
        for (number, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = codec::decode_row(&self.name, line)?;
            if row.len() != schema.column_count() {
                return Err(Error::malformed(
                    &self.name,
                    format!(
                        "row {} has {} values, header has {} columns",
                        number + 1,
                        row.len(),
                        schema.column_count()
                    ),
                ));
            }
            rows.push(row);
        }

        debug!(table = %self.name, rows = rows.len(), "read table");
        Ok(TableData { schema, rows })
    }

    /// Replace the file with `schema` followed by `rows`
    pub fn rewrite(&self, schema: &Schema, rows: &[Row]) -> Result<()> {
        let mut contents = codec::encode_header(schema);
        for row in rows {
            contents.push_str(&codec::encode_row(&self.name, row)?);
        }
        self.replace_contents(contents.as_bytes())
    }

    /// Add one row at the end of the table
    pub fn append(&self, row: &Row) -> Result<()> {
        let encoded = codec::encode_row(&self.name, row)?;
        let mut contents = fs::read_to_string(&self.path).map_err(|e| self.not_found(e))?;
        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(&encoded);
        self.replace_contents(contents.as_bytes())
    }

    fn replace_contents(&self, contents: &[u8]) -> Result<()> {
        let temp_path = self.temp_path();

        let written = (|| -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(contents)?;
            if self.sync_writes {
                file.sync_all()?;
            }
            Ok(())
        })();

        if let Err(e) = written.and_then(|_| fs::rename(&temp_path, &self.path)) {
            fs::remove_file(&temp_path).ok();
            return Err(Error::Io(e));
        }

        debug!(table = %self.name, bytes = contents.len(), "rewrote table file");
        Ok(())
    }
}
