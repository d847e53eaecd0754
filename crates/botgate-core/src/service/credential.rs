//! Credential service: issue, rotate, reveal, revoke and verify bot tokens.
//!
//! The plaintext token exists only in the `IssuedCredential` returned at
//! issue/rotation time and in owner-facing reveals. Storage holds a digest
//! (for lookups) and a sealed copy (for reveals).

use chrono::Utc;
use tracing::{debug, info};

use botgate_types::bot::BotId;
use botgate_types::credential::{CredentialView, IssuedCredential, StoredCredential};
use botgate_types::error::CredentialError;

use crate::repository::credential::CredentialRepository;
use crate::service::hash::TokenHasher;
use crate::service::token::TokenVault;

/// Service owning the credential lifecycle.
///
/// Generic over its storage, vault and hasher so botgate-core never depends
/// on botgate-infra.
pub struct CredentialService<R: CredentialRepository, V: TokenVault, H: TokenHasher> {
    repo: R,
    vault: V,
    hasher: H,
}

impl<R: CredentialRepository, V: TokenVault, H: TokenHasher> CredentialService<R, V, H> {
    pub fn new(repo: R, vault: V, hasher: H) -> Self {
        Self {
            repo,
            vault,
            hasher,
        }
    }

    /// Issue a fresh token for `bot_id`.
    ///
    /// Returns the plaintext credential and the form to store. Nothing is
    /// written here: the stored form goes to `BotRepository::create` so bot
    /// and credential land in one transaction.
    pub fn issue(
        &self,
        bot_id: &BotId,
    ) -> Result<(IssuedCredential, StoredCredential), CredentialError> {
        let token = self.vault.generate();
        let stored = StoredCredential {
            bot_id: bot_id.clone(),
            token_hash: self.hasher.hash_token(token.expose()),
            sealed_token: self.vault.seal(&token)?,
            issued_at: Utc::now(),
        };
        let issued = IssuedCredential {
            bot_id: bot_id.clone(),
            access_token: token,
            issued_at: stored.issued_at,
        };
        Ok((issued, stored))
    }

    /// Atomically replace the secret of an existing credential.
    ///
    /// The previous token stops verifying as soon as this returns. Fails with
    /// `NotFound` if the credential (or its bot) is gone.
    pub async fn rotate(&self, bot_id: &BotId) -> Result<IssuedCredential, CredentialError> {
        let (issued, stored) = self.issue(bot_id)?;
        self.repo.replace(&stored).await?;
        info!(bot_id = %bot_id, "rotated credential");
        Ok(issued)
    }

    /// Describe the credential of `bot_id`, including the live token only
    /// when the requester owns the bot.
    pub async fn reveal(
        &self,
        bot_id: &BotId,
        requester_is_owner: bool,
    ) -> Result<CredentialView, CredentialError> {
        let stored = self
            .repo
            .get(bot_id)
            .await?
            .ok_or(CredentialError::NotFound)?;

        let access_token = if requester_is_owner {
            Some(self.vault.open(&stored.sealed_token)?)
        } else {
            None
        };

        Ok(CredentialView {
            bot_id: stored.bot_id,
            issued_at: stored.issued_at,
            access_token,
        })
    }

    /// Delete the credential. Revoking an absent credential is not an error.
    pub async fn revoke(&self, bot_id: &BotId) -> Result<(), CredentialError> {
        let removed = self.repo.delete(bot_id).await?;
        debug!(bot_id = %bot_id, removed, "revoked credential");
        Ok(())
    }

    /// Resolve a presented token to the bot it belongs to.
    pub async fn verify(&self, token: &str) -> Result<Option<BotId>, CredentialError> {
        if token.is_empty() {
            return Ok(None);
        }
        let digest = self.hasher.hash_token(token);
        let found = self.repo.get_by_hash(&digest).await?;
        Ok(found.map(|c| c.bot_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{FakeHasher, FakeVault, MemoryStore, tenant_bot};
    use botgate_types::bot::TenantId;

    type Service = CredentialService<MemoryStore, FakeVault, FakeHasher>;

    fn service(store: &MemoryStore) -> Service {
        CredentialService::new(store.clone(), FakeVault::default(), FakeHasher)
    }

    /// Issue a credential and store it next to an existing bot.
    fn seed(store: &MemoryStore, credentials: &Service, bot_id: &BotId) -> IssuedCredential {
        let (issued, stored) = credentials.issue(bot_id).unwrap();
        store.insert_credential(stored);
        issued
    }

    #[tokio::test]
    async fn test_issued_token_verifies() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);

        let issued = seed(&store, &credentials, &bot.id);
        let verified = credentials.verify(issued.access_token.expose()).await.unwrap();

        assert_eq!(verified, Some(bot.id));
    }

    #[tokio::test]
    async fn test_issue_alone_persists_nothing() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);

        let (issued, stored) = credentials.issue(&bot.id).unwrap();

        assert_eq!(stored.bot_id, bot.id);
        assert_eq!(stored.issued_at, issued.issued_at);
        assert!(store.credential(&bot.id).is_none());
        assert_eq!(credentials.verify(issued.access_token.expose()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stored_form_never_holds_plaintext() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);

        let issued = seed(&store, &credentials, &bot.id);
        let stored = store.credential(&bot.id).unwrap();

        assert_ne!(stored.token_hash, issued.access_token.expose());
        assert_ne!(stored.sealed_token, issued.access_token.expose().as_bytes());
    }

    #[tokio::test]
    async fn test_rotate_invalidates_previous_token() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);

        let first = seed(&store, &credentials, &bot.id);
        let second = credentials.rotate(&bot.id).await.unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_eq!(credentials.verify(first.access_token.expose()).await.unwrap(), None);
        assert_eq!(
            credentials.verify(second.access_token.expose()).await.unwrap(),
            Some(bot.id.clone())
        );

        let revealed = credentials.reveal(&bot.id, true).await.unwrap();
        assert_eq!(revealed.access_token, Some(second.access_token));
    }

    #[tokio::test]
    async fn test_rotate_without_credential_is_not_found() {
        let store = MemoryStore::default();
        let credentials = service(&store);

        let err = credentials.rotate(&BotId::new()).await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound));
    }

    #[tokio::test]
    async fn test_rotate_after_bot_delete_does_not_resurrect() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);
        seed(&store, &credentials, &bot.id);

        store.remove_bot(&bot.id);

        assert!(matches!(
            credentials.rotate(&bot.id).await.unwrap_err(),
            CredentialError::NotFound
        ));
        assert!(store.credential(&bot.id).is_none());
    }

    #[tokio::test]
    async fn test_reveal_for_non_owner_omits_token() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);
        seed(&store, &credentials, &bot.id);

        let view = credentials.reveal(&bot.id, false).await.unwrap();
        assert!(view.access_token.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("access_token").is_none());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);
        let issued = seed(&store, &credentials, &bot.id);

        credentials.revoke(&bot.id).await.unwrap();
        credentials.revoke(&bot.id).await.unwrap();

        assert_eq!(credentials.verify(issued.access_token.expose()).await.unwrap(), None);
        assert!(matches!(
            credentials.reveal(&bot.id, true).await.unwrap_err(),
            CredentialError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_empty_and_unknown_tokens() {
        let store = MemoryStore::default();
        let credentials = service(&store);

        assert_eq!(credentials.verify("").await.unwrap(), None);
        assert_eq!(credentials.verify("bgt_unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_rotations_yield_distinct_tokens() {
        let store = MemoryStore::default();
        let bot = store.insert_bot(tenant_bot(&TenantId::new(), "Helper"));
        let credentials = service(&store);
        seed(&store, &credentials, &bot.id);

        let (a, b) = tokio::join!(credentials.rotate(&bot.id), credentials.rotate(&bot.id));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.access_token, b.access_token);

        // Exactly one of the two is the live token, never neither.
        let live_a = credentials.verify(a.access_token.expose()).await.unwrap().is_some();
        let live_b = credentials.verify(b.access_token.expose()).await.unwrap().is_some();
        assert!(live_a ^ live_b);
    }
}
