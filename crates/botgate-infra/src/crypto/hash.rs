//! SHA-256 `TokenHasher`.

use sha2::{Digest, Sha256};

use botgate_core::service::hash::TokenHasher;

use super::vault::hex_encode;

/// Lowercase hex SHA-256 of the token's UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256TokenHasher;

impl Sha256TokenHasher {
    pub fn new() -> Self {
        Self
    }
}

impl TokenHasher for Sha256TokenHasher {
    fn hash_token(&self, token: &str) -> String {
        hex_encode(&Sha256::digest(token.as_bytes()))
    }
}
