//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod bot;
pub mod credential;
pub mod job;
pub mod pool;
