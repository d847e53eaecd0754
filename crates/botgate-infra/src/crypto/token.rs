//! `TokenVault` backed by the OS CSPRNG and [`VaultCrypto`].

use botgate_core::service::token::TokenVault;
use botgate_types::config::CredentialConfig;
use botgate_types::credential::Redacted;
use botgate_types::error::CredentialError;

use super::vault::{VaultCrypto, hex_encode, rand_bytes};

/// Generates `<prefix><hex>` tokens and seals them with AES-256-GCM.
pub struct SealedTokenVault {
    crypto: VaultCrypto,
    prefix: String,
    token_bytes: usize,
}

/// Below this, tokens become guessable.
const MIN_TOKEN_BYTES: usize = 16;

impl SealedTokenVault {
    pub fn new(crypto: VaultCrypto, config: &CredentialConfig) -> Self {
        Self {
            crypto,
            prefix: config.token_prefix.clone(),
            token_bytes: config.token_bytes.max(MIN_TOKEN_BYTES),
        }
    }
}

impl TokenVault for SealedTokenVault {
    fn generate(&self) -> Redacted {
        let mut raw = Vec::with_capacity(self.token_bytes);
        while raw.len() < self.token_bytes {
            let chunk = rand_bytes::<32>();
            let take = (self.token_bytes - raw.len()).min(chunk.len());
            raw.extend_from_slice(&chunk[..take]);
        }
        Redacted::new(format!("{}{}", self.prefix, hex_encode(&raw)))
    }

    fn seal(&self, token: &Redacted) -> Result<Vec<u8>, CredentialError> {
        self.crypto
            .encrypt(token.expose().as_bytes())
            .map_err(|_| CredentialError::Sealing)
    }

    fn open(&self, sealed: &[u8]) -> Result<Redacted, CredentialError> {
        let plaintext = self
            .crypto
            .decrypt(sealed)
            .map_err(|_| CredentialError::Sealing)?;
        String::from_utf8(plaintext)
            .map(Redacted::new)
            .map_err(|_| CredentialError::Sealing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(config: &CredentialConfig) -> SealedTokenVault {
        SealedTokenVault::new(VaultCrypto::new(&[7u8; 32]), config)
    }

    #[test]
    fn test_token_shape() {
        let token = vault(&CredentialConfig::default()).generate();
        let hex = token.expose().strip_prefix("bgt_").unwrap();

        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let vault = vault(&CredentialConfig::default());
        let tokens: std::collections::HashSet<String> = (0..100)
            .map(|_| vault.generate().expose().to_string())
            .collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_custom_prefix_and_length() {
        let config = CredentialConfig {
            token_prefix: "acme_".to_string(),
            token_bytes: 48,
            ..Default::default()
        };
        let token = vault(&config).generate();
        assert!(token.expose().starts_with("acme_"));
        assert_eq!(token.expose().len(), "acme_".len() + 96);
    }

    #[test]
    fn test_short_length_is_raised_to_minimum() {
        let config = CredentialConfig {
            token_bytes: 4,
            ..Default::default()
        };
        let token = vault(&config).generate();
        assert_eq!(token.expose().len(), "bgt_".len() + MIN_TOKEN_BYTES * 2);
    }

    #[test]
    fn test_seal_and_open() {
        let vault = vault(&CredentialConfig::default());
        let token = vault.generate();

        let sealed = vault.seal(&token).unwrap();
        assert_ne!(sealed.as_slice(), token.expose().as_bytes());
        assert_eq!(vault.open(&sealed).unwrap(), token);
    }

    #[test]
    fn test_open_with_other_key_fails() {
        let config = CredentialConfig::default();
        let sealed = vault(&config).seal(&Redacted::new("bgt_x")).unwrap();
        let other = SealedTokenVault::new(VaultCrypto::new(&[9u8; 32]), &config);

        assert!(matches!(other.open(&sealed), Err(CredentialError::Sealing)));
    }
}
