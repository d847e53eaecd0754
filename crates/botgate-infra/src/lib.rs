//! Infrastructure layer for botgate.
//!
//! Contains implementations of the ports defined in `botgate-core`:
//! SQLite storage and job queue, AES-256-GCM token vault with file or OS
//! keychain key sources, SHA-256 token digests, and the local avatar store.

pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod sqlite;
