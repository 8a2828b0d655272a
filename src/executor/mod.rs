//! Query execution module
//!
//! This module contains the statement dispatcher and the executors behind
//! it.

pub mod ddl;
pub mod dml;
pub mod executor;
pub mod join;
pub mod predicate;
pub mod select;

pub use executor::QueryResult;
pub use join::{nested_loop_join, JoinedRows};
pub use predicate::{where_applies, Predicate};
