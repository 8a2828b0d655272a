//! PlainDB - a file-backed relational store written in Rust
//!
//! Every database is a directory and every table a plain text file inside
//! it. This library provides:
//! - Statement parsing (AST, parser)
//! - Storage (values, the table file codec, atomic file rewrites)
//! - Statement execution (definitions, mutations, filtered and joined reads)
//! - Transactions backed by per-table lock files
//!
//! ```no_run
//! use plaindb::Session;
//!
//! let mut session = Session::new("/var/lib/plaindb");
//! session.execute("CREATE DATABASE shop;")?;
//! session.execute("USE shop;")?;
//! let result = session.execute("SELECT * FROM items;")?;
//! println!("{}", result);
//! # Ok::<(), plaindb::Error>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod session;
pub mod sql;
pub mod storage;
pub mod transaction;

pub use config::{Config, OutputFormat};
pub use error::{Error, Result};
pub use executor::QueryResult;
pub use session::Session;
