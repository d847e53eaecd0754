//! Master-key handling and AES-256-GCM sealing of tokens at rest.
//!
//! Sealed layout is `nonce (12 bytes) || ciphertext+tag`. The 32-byte master
//! key lives either in `{data_dir}/vault.key` or in the OS keychain, stored
//! as 64 hex characters in both cases and created on first use.
//!
//! Errors never carry plaintext, ciphertext or key material.

use std::path::Path;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use thiserror::Error;

use botgate_types::config::KeySource;

const NONCE_LEN: usize = 12;
const KEY_FILE_NAME: &str = "vault.key";
const KEYCHAIN_SERVICE: &str = "botgate";
const KEYCHAIN_ACCOUNT: &str = "vault-master-key";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid ciphertext: too short")]
    CiphertextTooShort,

    #[error("key file error: {0}")]
    KeyFile(String),

    #[error("keychain unavailable: {0}")]
    KeychainUnavailable(String),

    #[error("keychain error: {0}")]
    KeychainError(String),
}

/// Symmetric cipher keyed by the botgate master key.
///
/// Every `encrypt` draws a fresh nonce, so sealing the same token twice
/// yields different bytes.
pub struct VaultCrypto {
    cipher: Aes256Gcm,
}

impl VaultCrypto {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Open the master key from the configured source.
    pub async fn load(source: KeySource, data_dir: &Path) -> Result<Self, VaultError> {
        match source {
            KeySource::File => Self::from_key_file(&data_dir.join(KEY_FILE_NAME)).await,
            KeySource::Keychain => Self::from_keychain(),
        }
    }

    /// Read the hex key at `path`, creating it (mode 0600 on Unix) when absent.
    ///
    /// The file only ever appears under `path` complete and owner-only. When
    /// two processes race to create it, both end up with the winner's key.
    pub async fn from_key_file(path: &Path) -> Result<Self, VaultError> {
        if let Some(key) = read_key_file(path).await? {
            return Ok(Self::new(&key));
        }

        let key = rand_bytes::<32>();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(key_file_err)?;
        }
        if !publish_key_file(path, &key).await.map_err(key_file_err)? {
            let existing = read_key_file(path)
                .await?
                .ok_or_else(|| VaultError::KeyFile("key file vanished".to_string()))?;
            return Ok(Self::new(&existing));
        }

        tracing::info!(path = %path.display(), "generated vault master key");
        Ok(Self::new(&key))
    }

    /// Read the hex key from the OS keychain, creating the entry when absent.
    pub fn from_keychain() -> Result<Self, VaultError> {
        let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
            .map_err(|e| VaultError::KeychainUnavailable(e.to_string()))?;

        let key = match entry.get_password() {
            Ok(stored) => decode_key(&stored).ok_or_else(|| {
                VaultError::KeychainError("corrupted key in keychain".to_string())
            })?,
            Err(keyring::Error::NoEntry) => {
                let key = rand_bytes::<32>();
                entry
                    .set_password(&hex_encode(&key))
                    .map_err(|e| VaultError::KeychainError(e.to_string()))?;
                tracing::info!("generated vault master key in keychain");
                key
            }
            Err(e) => return Err(VaultError::KeychainUnavailable(e.to_string())),
        };

        Ok(Self::new(&key))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let body = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VaultError::EncryptionFailed)?;

        Ok([nonce.as_slice(), body.as_slice()].concat())
    }

    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, VaultError> {
        let (nonce, body) = sealed
            .split_at_checked(NONCE_LEN)
            .ok_or(VaultError::CiphertextTooShort)?;

        self.cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| VaultError::DecryptionFailed)
    }
}

fn key_file_err(e: std::io::Error) -> VaultError {
    VaultError::KeyFile(e.to_string())
}

async fn read_key_file(path: &Path) -> Result<Option<[u8; 32]>, VaultError> {
    match tokio::fs::read_to_string(path).await {
        Ok(stored) => decode_key(stored.trim())
            .map(Some)
            .ok_or_else(|| VaultError::KeyFile("corrupted key file".to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(key_file_err(e)),
    }
}

/// Write `key` to a private temp file, then link it into place.
/// Returns false if `path` already existed.
async fn publish_key_file(path: &Path, key: &[u8; 32]) -> std::io::Result<bool> {
    use tokio::io::AsyncWriteExt;

    let staging = path.with_extension(format!("{}.tmp", hex_encode(&rand_bytes::<8>())));

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let written: std::io::Result<()> = async {
        let mut file = options.open(&staging).await?;
        file.write_all(hex_encode(key).as_bytes()).await?;
        file.sync_all().await?;
        tokio::fs::hard_link(&staging, path).await
    }
    .await;
    let _ = tokio::fs::remove_file(&staging).await;

    match written {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

fn decode_key(hex: &str) -> Option<[u8; 32]> {
    hex_decode(hex)?.try_into().ok()
}

pub(crate) fn rand_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if !hex.is_ascii() || hex.len() % 2 != 0 {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}
