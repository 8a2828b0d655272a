//! Transaction module
//!
//! Queued updates and the lock files that guard them.

pub mod lock;
pub mod transaction;

pub use transaction::{release_locks, PendingUpdate, Transaction};
