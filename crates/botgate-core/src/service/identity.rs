//! Identity service: the public surface of botgate.
//!
//! Every tenant-scoped operation runs the same pipeline: membership check,
//! scoped lookup, policy decision, then the registry/credential work and the
//! response shaping. Internal failures are logged here and leave as
//! `IdentityError::Internal` without their payload.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use botgate_types::actor::Actor;
use botgate_types::bot::{
    AvatarSource, Bot, BotId, BotOwner, CreateBotRequest, TenantId, UpdateBotRequest,
    validate_http_url,
};
use botgate_types::config::AvatarConfig;
use botgate_types::credential::{CredentialView, Redacted};
use botgate_types::error::{AssetError, BotError, CredentialError, JobError};
use botgate_types::job::Job;
use botgate_types::view::BotView;

use crate::policy::{self, Decision, DenyReason, Operation, Target};
use crate::repository::bot::BotRepository;
use crate::repository::credential::CredentialRepository;
use crate::service::asset::AssetPipeline;
use crate::service::credential::CredentialService;
use crate::service::hash::TokenHasher;
use crate::service::job::JobQueue;
use crate::service::registry::BotRegistry;
use crate::service::token::TokenVault;

/// Errors surfaced by the identity service.
///
/// `Unauthorized` and `NotFound` carry nothing about the target.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("not permitted")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error")]
    Internal,
}

impl From<DenyReason> for IdentityError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthorized => IdentityError::Unauthorized,
            DenyReason::NotFound => IdentityError::NotFound,
        }
    }
}

impl From<BotError> for IdentityError {
    fn from(e: BotError) -> Self {
        match e {
            BotError::NotFound => IdentityError::NotFound,
            BotError::InvalidName(_) | BotError::InvalidUrl(_) | BotError::InvalidAvatar(_) => {
                IdentityError::Validation(e.to_string())
            }
            BotError::Conflict(msg) => IdentityError::Conflict(msg),
            BotError::StorageError(msg) => {
                error!(error = %msg, "bot storage failure");
                IdentityError::Internal
            }
        }
    }
}

impl From<CredentialError> for IdentityError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NotFound => IdentityError::NotFound,
            CredentialError::Conflict(msg) => IdentityError::Conflict(msg),
            CredentialError::Sealing => {
                error!("credential sealing failure");
                IdentityError::Internal
            }
            CredentialError::StorageError(msg) => {
                error!(error = %msg, "credential storage failure");
                IdentityError::Internal
            }
        }
    }
}

impl From<AssetError> for IdentityError {
    fn from(e: AssetError) -> Self {
        match e {
            AssetError::NotFound => IdentityError::NotFound,
            AssetError::Unsupported(_) => IdentityError::Validation(e.to_string()),
            AssetError::Storage(msg) => {
                error!(error = %msg, "asset pipeline failure");
                IdentityError::Internal
            }
        }
    }
}

impl From<JobError> for IdentityError {
    fn from(e: JobError) -> Self {
        error!(error = %e, "job queue failure");
        IdentityError::Internal
    }
}

/// A freshly provisioned global bot and its only copy of the token.
#[derive(Debug, Serialize)]
pub struct ProvisionedBot {
    pub bot: BotView,
    pub credential: CredentialView,
}

/// Façade over registry, credentials, policy and the external pipelines.
pub struct IdentityService<B, R, V, H, A, J>
where
    B: BotRepository,
    R: CredentialRepository,
    V: TokenVault,
    H: TokenHasher,
    A: AssetPipeline,
    J: JobQueue,
{
    registry: BotRegistry<B>,
    credentials: CredentialService<R, V, H>,
    assets: A,
    jobs: J,
    avatars: AvatarConfig,
}

impl<B, R, V, H, A, J> IdentityService<B, R, V, H, A, J>
where
    B: BotRepository,
    R: CredentialRepository,
    V: TokenVault,
    H: TokenHasher,
    A: AssetPipeline,
    J: JobQueue,
{
    pub fn new(
        registry: BotRegistry<B>,
        credentials: CredentialService<R, V, H>,
        assets: A,
        jobs: J,
        avatars: AvatarConfig,
    ) -> Self {
        Self {
            registry,
            credentials,
            assets,
            jobs,
            avatars,
        }
    }

    pub fn credentials(&self) -> &CredentialService<R, V, H> {
        &self.credentials
    }

    // --- tenant-scoped operations ---

    /// Bots visible to the tenant, oldest first, without tokens.
    pub async fn list_bots(
        &self,
        actor: &Actor,
        tenant: &TenantId,
    ) -> Result<Vec<BotView>, IdentityError> {
        authorize(actor, tenant, Operation::List, Target::Collection)?;
        let bots = self.registry.list_visible(tenant).await?;
        Ok(bots.iter().map(BotView::metadata).collect())
    }

    /// One visible bot, without its token.
    pub async fn get_bot(
        &self,
        actor: &Actor,
        tenant: &TenantId,
        id: &BotId,
    ) -> Result<BotView, IdentityError> {
        let bot = self.resolve(actor, tenant, id, Operation::Read).await?;
        Ok(BotView::metadata(&bot))
    }

    /// Create a tenant-owned bot and its first credential in one write.
    pub async fn create_bot(
        &self,
        actor: &Actor,
        tenant: &TenantId,
        request: CreateBotRequest,
    ) -> Result<BotView, IdentityError> {
        authorize(actor, tenant, Operation::Create, Target::Collection)?;

        let bot = self
            .registry
            .build(BotOwner::Tenant(tenant.clone()), request)?;
        let (issued, stored) = self.credentials.issue(&bot.id)?;
        let created = self.registry.create(&bot, &stored).await?;

        Ok(BotView::with_token(&created, Some(issued.access_token)))
    }

    /// Update metadata and/or the avatar of an owned bot.
    ///
    /// Inline bytes go straight to the asset pipeline. A URL is handed to the
    /// job system and this returns without waiting for the fetch.
    pub async fn update_bot(
        &self,
        actor: &Actor,
        tenant: &TenantId,
        id: &BotId,
        patch: UpdateBotRequest,
    ) -> Result<BotView, IdentityError> {
        let mut bot = self.resolve(actor, tenant, id, Operation::Update).await?;

        let avatar = self.avatar_source(&patch)?;
        self.registry.apply(&mut bot, &patch)?;

        let mut deferred = None;
        let mut attached = false;
        match avatar {
            Some(source @ AvatarSource::Bytes(_)) => {
                bot.avatar = Some(self.assets.attach(&bot.id, &source).await?);
                attached = true;
            }
            Some(AvatarSource::Url(url)) => deferred = Some(url),
            None => {}
        }

        let saved = match self.registry.save(&mut bot).await {
            Ok(saved) => saved,
            Err(e) => {
                // The bot may have been deleted since it was resolved.
                if attached {
                    self.discard_avatar(&bot.id).await;
                }
                return Err(e.into());
            }
        };

        if let Some(url) = deferred {
            let job = Job::FetchAvatar {
                bot_id: saved.id.clone(),
                url,
            };
            self.jobs.enqueue(&job).await?;
            info!(bot_id = %saved.id, kind = %job.kind(), "enqueued avatar fetch");
        }

        let token = self.owner_token(&saved.id).await?;
        Ok(BotView::with_token(&saved, token))
    }

    /// Delete an owned bot, its credential and its avatar.
    pub async fn delete_bot(
        &self,
        actor: &Actor,
        tenant: &TenantId,
        id: &BotId,
    ) -> Result<(), IdentityError> {
        let bot = self.resolve(actor, tenant, id, Operation::Delete).await?;
        self.purge(&bot).await
    }

    /// Detach the avatar of an owned bot.
    ///
    /// Whether a second call succeeds depends on the asset pipeline: a
    /// pipeline reporting detach-of-absent surfaces here as `NotFound`.
    pub async fn remove_avatar(
        &self,
        actor: &Actor,
        tenant: &TenantId,
        id: &BotId,
    ) -> Result<(), IdentityError> {
        let mut bot = self
            .resolve(actor, tenant, id, Operation::RemoveAvatar)
            .await?;

        self.assets.detach(&bot.id).await?;
        if bot.avatar.is_some() {
            self.registry.set_avatar(&mut bot, None).await?;
        }
        info!(bot_id = %bot.id, "removed avatar");
        Ok(())
    }

    /// Rotate the credential of an owned bot. The previous token is dead on
    /// return.
    pub async fn reset_credential(
        &self,
        actor: &Actor,
        tenant: &TenantId,
        id: &BotId,
    ) -> Result<BotView, IdentityError> {
        let bot = self
            .resolve(actor, tenant, id, Operation::ResetCredential)
            .await?;
        let issued = self.credentials.rotate(&bot.id).await?;
        Ok(BotView::with_token(&bot, Some(issued.access_token)))
    }

    /// Resolve a presented bot token to its bot.
    pub async fn authenticate_bot(&self, token: &str) -> Result<Bot, IdentityError> {
        let bot_id = self
            .credentials
            .verify(token)
            .await?
            .ok_or(IdentityError::Unauthorized)?;

        // A credential outliving its bot is treated like an unknown token.
        match self.registry.find_any(&bot_id).await {
            Ok(bot) => Ok(bot),
            Err(BotError::NotFound) => Err(IdentityError::Unauthorized),
            Err(e) => Err(e.into()),
        }
    }

    // --- system provisioning (no tenant scope) ---

    pub async fn provision_global_bot(
        &self,
        request: CreateBotRequest,
    ) -> Result<ProvisionedBot, IdentityError> {
        let bot = self.registry.build(BotOwner::Global, request)?;
        let (issued, stored) = self.credentials.issue(&bot.id)?;
        let created = self.registry.create(&bot, &stored).await?;

        Ok(ProvisionedBot {
            bot: BotView::metadata(&created),
            credential: CredentialView::from(issued),
        })
    }

    pub async fn list_global_bots(&self) -> Result<Vec<BotView>, IdentityError> {
        let bots = self.registry.list_global().await?;
        Ok(bots.iter().map(BotView::metadata).collect())
    }

    pub async fn rotate_global_credential(
        &self,
        id: &BotId,
    ) -> Result<CredentialView, IdentityError> {
        let bot = self.registry.find_global(id).await?;
        let issued = self.credentials.rotate(&bot.id).await?;
        Ok(CredentialView::from(issued))
    }

    pub async fn retire_global_bot(&self, id: &BotId) -> Result<(), IdentityError> {
        let bot = self.registry.find_global(id).await?;
        self.purge(&bot).await
    }

    /// Record the avatar a completed `Job::FetchAvatar` left in the asset
    /// pipeline, so the bot's thumbnail shows up in its views.
    ///
    /// If the bot was deleted while the fetch ran, the fetched avatar is
    /// detached and this reports `NotFound`. `NotFound` is also returned when
    /// the pipeline holds no avatar for the bot.
    pub async fn record_fetched_avatar(&self, id: &BotId) -> Result<BotView, IdentityError> {
        let mut bot = match self.registry.find_any(id).await {
            Ok(bot) => bot,
            Err(BotError::NotFound) => {
                self.discard_avatar(id).await;
                return Err(IdentityError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let avatar = self
            .assets
            .attached(id)
            .await?
            .ok_or(IdentityError::NotFound)?;

        match self.registry.set_avatar(&mut bot, Some(avatar)).await {
            Ok(saved) => {
                info!(bot_id = %id, "recorded fetched avatar");
                Ok(BotView::metadata(&saved))
            }
            Err(BotError::NotFound) => {
                self.discard_avatar(id).await;
                Err(IdentityError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    // --- helpers ---

    /// Look up `id` within the tenant's read scope and run the policy on it.
    ///
    /// Membership is checked before the lookup, so outsiders learn nothing
    /// about which ids exist.
    async fn resolve(
        &self,
        actor: &Actor,
        tenant: &TenantId,
        id: &BotId,
        operation: Operation,
    ) -> Result<Bot, IdentityError> {
        if !actor.is_member_of(tenant) {
            debug!(tenant = %tenant, role = %actor.role, %operation, "not a member");
            return Err(IdentityError::Unauthorized);
        }

        let bot = match self.registry.find(tenant, id).await {
            Ok(bot) => Some(bot),
            Err(BotError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        let target = bot.as_ref().map_or(Target::Missing, |b| Target::Bot(&b.owner));
        authorize(actor, tenant, operation, target)?;

        bot.ok_or(IdentityError::NotFound)
    }

    fn avatar_source(&self, patch: &UpdateBotRequest) -> Result<Option<AvatarSource>, IdentityError> {
        match (&patch.avatar_bytes, &patch.avatar_url) {
            (Some(_), Some(_)) => Err(IdentityError::Validation(
                "supply either avatar bytes or an avatar url, not both".to_string(),
            )),
            (Some(bytes), None) => {
                if bytes.is_empty() {
                    return Err(BotError::InvalidAvatar("avatar is empty".to_string()).into());
                }
                if bytes.len() > self.avatars.max_bytes {
                    return Err(BotError::InvalidAvatar(format!(
                        "avatar exceeds {} bytes",
                        self.avatars.max_bytes
                    ))
                    .into());
                }
                Ok(Some(AvatarSource::Bytes(bytes.clone())))
            }
            (None, Some(url)) => Ok(Some(AvatarSource::Url(validate_http_url(url)?))),
            (None, None) => Ok(None),
        }
    }

    /// The live token for an owned bot, `None` if it has no credential.
    async fn owner_token(&self, id: &BotId) -> Result<Option<Redacted>, IdentityError> {
        match self.credentials.reveal(id, true).await {
            Ok(view) => Ok(view.access_token),
            Err(CredentialError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a bot and everything hanging off it.
    async fn purge(&self, bot: &Bot) -> Result<(), IdentityError> {
        self.registry.delete(&bot.id).await?;
        self.credentials.revoke(&bot.id).await?;

        match self.jobs.cancel_for_bot(&bot.id).await {
            Ok(0) => {}
            Ok(cancelled) => debug!(bot_id = %bot.id, cancelled, "cancelled pending jobs"),
            Err(e) => warn!(bot_id = %bot.id, error = %e, "job cancel failed after delete"),
        }
        self.discard_avatar(&bot.id).await;
        Ok(())
    }

    /// Best-effort detach of an avatar whose bot is gone.
    async fn discard_avatar(&self, id: &BotId) {
        match self.assets.detach(id).await {
            Ok(()) | Err(AssetError::NotFound) => {}
            Err(e) => warn!(bot_id = %id, error = %e, "avatar detach failed"),
        }
    }
}

fn authorize(
    actor: &Actor,
    tenant: &TenantId,
    operation: Operation,
    target: Target<'_>,
) -> Result<(), IdentityError> {
    match policy::decide(actor, tenant, operation, target) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            debug!(tenant = %tenant, role = %actor.role, %operation, ?reason, "denied");
            Err(reason.into())
        }
    }
}
