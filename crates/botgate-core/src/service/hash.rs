//! One-way token digests.

/// Digest used as the lookup key for credentials.
///
/// Implementations must be deterministic: `verify` recomputes the digest of
/// the presented token and looks it up verbatim.
pub trait TokenHasher: Send + Sync {
    fn hash_token(&self, token: &str) -> String;
}
