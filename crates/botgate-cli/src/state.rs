//! Application state wiring the identity service to the local adapters.
//!
//! `IdentityService` is generic over repositories, vault, hasher, asset
//! pipeline and job queue; AppState pins it to the SQLite/filesystem
//! implementations in `botgate-infra`.

use std::path::PathBuf;
use std::sync::Arc;

use botgate_core::service::credential::CredentialService;
use botgate_core::service::identity::IdentityService;
use botgate_core::service::registry::BotRegistry;
use botgate_infra::config::{load_config, resolve_database_url};
use botgate_infra::crypto::hash::Sha256TokenHasher;
use botgate_infra::crypto::token::SealedTokenVault;
use botgate_infra::crypto::vault::VaultCrypto;
use botgate_infra::filesystem::asset::LocalAssetStore;
use botgate_infra::filesystem::resolve_data_dir;
use botgate_infra::sqlite::bot::SqliteBotRepository;
use botgate_infra::sqlite::credential::SqliteCredentialRepository;
use botgate_infra::sqlite::job::SqliteJobQueue;
use botgate_infra::sqlite::pool::DatabasePool;
use botgate_types::config::BotgateConfig;

pub type ConcreteIdentityService = IdentityService<
    SqliteBotRepository,
    SqliteCredentialRepository,
    SealedTokenVault,
    Sha256TokenHasher,
    LocalAssetStore,
    SqliteJobQueue,
>;

/// Shared state for every command.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<ConcreteIdentityService>,
    /// Direct handle on the queue for the `jobs` commands.
    pub jobs: SqliteJobQueue,
    pub config: BotgateConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, open the database and wire the service.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let db_url = resolve_database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;

        let crypto = VaultCrypto::load(config.credentials.key_source, &data_dir).await?;

        let credentials = CredentialService::new(
            SqliteCredentialRepository::new(db_pool.clone()),
            SealedTokenVault::new(crypto, &config.credentials),
            Sha256TokenHasher::new(),
        );
        let jobs = SqliteJobQueue::new(db_pool.clone());

        let identity = IdentityService::new(
            BotRegistry::new(SqliteBotRepository::new(db_pool)),
            credentials,
            LocalAssetStore::new(data_dir.clone()),
            jobs.clone(),
            config.avatars.clone(),
        );

        tracing::debug!(data_dir = %data_dir.display(), "botgate state initialized");

        Ok(Self {
            identity: Arc::new(identity),
            jobs,
            config,
            data_dir,
        })
    }
}
