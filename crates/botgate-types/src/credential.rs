use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bot::BotId;

use std::fmt;

/// A wrapper that redacts secret values in Debug and Display output.
///
/// Serialization still writes the real value: only serialize a `Redacted`
/// into responses meant for the credential's owner.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redacted(String);

impl Redacted {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Show masked representation: last 4 chars visible.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            "****".to_string()
        } else {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("****{tail}")
        }
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Redacted(\"***\")")
    }
}

impl fmt::Display for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Persisted form of a bot's access credential.
///
/// The plaintext token is never stored: `token_hash` (hex SHA-256) serves
/// lookups and `sealed_token` (AES-256-GCM, `nonce || ciphertext`) lets the
/// owning tenant see the live value again.
#[derive(Clone)]
pub struct StoredCredential {
    pub bot_id: BotId,
    pub token_hash: String,
    pub sealed_token: Vec<u8>,
    pub issued_at: DateTime<Utc>,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("bot_id", &self.bot_id)
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

/// A freshly generated credential, returned only at issue/rotation time.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub bot_id: BotId,
    pub access_token: Redacted,
    pub issued_at: DateTime<Utc>,
}

/// Outward view of a credential.
///
/// `access_token` is omitted from the serialized form (not `null`) when the
/// requester does not own the bot.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialView {
    pub bot_id: BotId,
    pub issued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<Redacted>,
}

impl From<IssuedCredential> for CredentialView {
    fn from(issued: IssuedCredential) -> Self {
        Self {
            bot_id: issued.bot_id,
            issued_at: issued.issued_at,
            access_token: Some(issued.access_token),
        }
    }
}
