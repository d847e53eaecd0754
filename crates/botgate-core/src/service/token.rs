//! TokenVault trait: token generation and reversible sealing.
//!
//! The AES-256-GCM implementation lives in botgate-infra.

use botgate_types::credential::Redacted;
use botgate_types::error::CredentialError;

/// Generates access tokens and seals them for storage at rest.
pub trait TokenVault: Send + Sync {
    /// Produce a new unpredictable token from a cryptographically secure source.
    fn generate(&self) -> Redacted;

    /// Encrypt a token for storage.
    fn seal(&self, token: &Redacted) -> Result<Vec<u8>, CredentialError>;

    /// Decrypt a token sealed by [`TokenVault::seal`].
    fn open(&self, sealed: &[u8]) -> Result<Redacted, CredentialError>;
}
