//! Bot repository trait definition.

use botgate_types::bot::{Bot, BotId, TenantId};
use botgate_types::credential::StoredCredential;
use botgate_types::error::RepositoryError;

use super::SortOrder;

/// Which slice of the two identity pools a query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotScope {
    /// Global bots only.
    Global,
    /// Bots a tenant may read: its own plus every global bot.
    VisibleTo(TenantId),
}

/// Filter criteria for listing bots.
#[derive(Debug, Clone)]
pub struct BotFilter {
    pub scope: BotScope,
    /// Field to sort by ("created_at", "name", "updated_at").
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl BotFilter {
    pub fn scoped(scope: BotScope) -> Self {
        Self {
            scope,
            sort_by: None,
            sort_order: None,
        }
    }
}

/// Repository trait for bot persistence.
///
/// Implementations live in botgate-infra (e.g., SqliteBotRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait BotRepository: Send + Sync {
    /// Insert a bot together with its first credential, atomically.
    fn create(
        &self,
        bot: &Bot,
        credential: &StoredCredential,
    ) -> impl std::future::Future<Output = Result<Bot, RepositoryError>> + Send;

    /// Get a bot by its unique ID, regardless of owner.
    fn get_by_id(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<Option<Bot>, RepositoryError>> + Send;

    /// List bots with scoping and sorting.
    fn list(
        &self,
        filter: &BotFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Bot>, RepositoryError>> + Send;

    /// Update an existing bot. `NotFound` if it no longer exists.
    fn update(
        &self,
        bot: &Bot,
    ) -> impl std::future::Future<Output = Result<Bot, RepositoryError>> + Send;

    /// Permanently delete a bot, cascading to its credential.
    fn delete(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
