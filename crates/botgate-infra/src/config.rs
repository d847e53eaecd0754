//! Configuration loader for botgate.
//!
//! Reads `config.toml` from the data directory (`~/.botgate/` in production)
//! and deserializes it into [`BotgateConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use botgate_types::config::BotgateConfig;

use crate::sqlite::pool::database_url_in;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`BotgateConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> BotgateConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return BotgateConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return BotgateConfig::default();
        }
    };

    match toml::from_str::<BotgateConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            BotgateConfig::default()
        }
    }
}

/// The database URL to open: the configured override, else `{data_dir}/botgate.db`.
pub fn resolve_database_url(config: &BotgateConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| database_url_in(data_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use botgate_types::config::KeySource;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.credentials.token_prefix, "bgt_");
        assert_eq!(config.credentials.key_source, KeySource::File);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
database_url = "sqlite:///srv/botgate/db.sqlite"

[credentials]
token_prefix = "acme_"
token_bytes = 24

[avatars]
max_bytes = 2048
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.credentials.token_prefix, "acme_");
        assert_eq!(config.credentials.token_bytes, 24);
        assert_eq!(config.avatars.max_bytes, 2048);
        assert_eq!(
            resolve_database_url(&config, tmp.path()),
            "sqlite:///srv/botgate/db.sqlite"
        );
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.credentials.token_bytes, 32);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn resolve_database_url_defaults_to_data_dir() {
        let config = BotgateConfig::default();
        let url = resolve_database_url(&config, Path::new("/data"));
        assert_eq!(url, "sqlite:///data/botgate.db?mode=rwc");
    }
}
