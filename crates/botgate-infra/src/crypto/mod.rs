//! Cryptographic operations for botgate.
//!
//! - `hash`: SHA-256 digests used to look tokens up
//! - `token`: token generation and sealing (`TokenVault`)
//! - `vault`: AES-256-GCM encryption for tokens at rest

pub mod hash;
pub mod token;
pub mod vault;
