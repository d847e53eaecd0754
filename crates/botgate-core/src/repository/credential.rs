//! Credential repository trait definition.

use botgate_types::bot::BotId;
use botgate_types::credential::StoredCredential;
use botgate_types::error::RepositoryError;

/// Storage for bot credentials. At most one row per bot.
///
/// Rows are only ever inserted together with their bot (see
/// `BotRepository::create`).
pub trait CredentialRepository: Send + Sync {
    /// Get the active credential of a bot.
    fn get(
        &self,
        bot_id: &BotId,
    ) -> impl std::future::Future<Output = Result<Option<StoredCredential>, RepositoryError>> + Send;

    /// Look a credential up by the digest of its token.
    fn get_by_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<StoredCredential>, RepositoryError>> + Send;

    /// Replace an existing credential in a single atomic write.
    /// `NotFound` if there is no credential to replace (never inserts).
    fn replace(
        &self,
        credential: &StoredCredential,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the credential. Returns whether a row was removed.
    fn delete(
        &self,
        bot_id: &BotId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
