//! Global configuration types for botgate.
//!
//! `BotgateConfig` represents the `config.toml` in the data directory.
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotgateConfig {
    /// SQLite URL override. Defaults to `{data_dir}/botgate.db`.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub credentials: CredentialConfig,

    #[serde(default)]
    pub avatars: AvatarConfig,
}

/// Where the vault master key that seals stored tokens lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// `{data_dir}/vault.key`, generated on first use.
    #[default]
    File,
    /// OS keychain (macOS Keychain / Linux Secret Service).
    Keychain,
}

/// Access token generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Prefix prepended to every generated token.
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,

    /// Random bytes per token (hex-encoded after the prefix).
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,

    #[serde(default)]
    pub key_source: KeySource,
}

fn default_token_prefix() -> String {
    "bgt_".to_string()
}

fn default_token_bytes() -> usize {
    32
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            token_prefix: default_token_prefix(),
            token_bytes: default_token_bytes(),
            key_source: KeySource::default(),
        }
    }
}

/// Avatar upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Largest inline avatar accepted, in bytes.
    #[serde(default = "default_max_avatar_bytes")]
    pub max_bytes: usize,
}

fn default_max_avatar_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_avatar_bytes(),
        }
    }
}
