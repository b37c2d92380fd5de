//! Database layer for Trialgate state.
//!
//! A thin synchronous wrapper over SQLite. Domain code builds SQL against
//! [`DbConnection`] and reads results through [`DbRow`] / [`FromDbValue`];
//! nothing outside this crate touches `rusqlite` directly.

mod backend;

pub use backend::{BackendError, DbConnection, DbRow, DbTimestamp, DbTimestampError, DbValue, FromDbValue};
