//! Persistent store of watchlist items, notifications, and admin accounts.
//!
//! All operations are single statements; the pipeline relies on row-level
//! idempotence instead of transactions.

pub mod db;
pub mod error;

pub use db::{Database, WatchStore};
pub use error::StoreError;
