//! Configuration
//!
//! Settings for a session and the shell, loadable from a JSON file. Every
//! field has a default, so a config file only needs the keys it changes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the shell prints results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Header line and rows in table file format
    #[default]
    Text,
    /// One JSON object per result
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Engine and shell configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one subdirectory per database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// `fsync` table files before they replace the old contents
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Shell history file; no history is kept when unset
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_sync_writes() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sync_writes: default_sync_writes(),
            output_format: OutputFormat::default(),
            history_file: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}
