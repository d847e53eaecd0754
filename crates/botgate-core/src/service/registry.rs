//! Bot registry: scoped reads and validated writes over the bot store.
//!
//! Reads widen to global bots, writes narrow to strict ownership. Both
//! report a bot outside the scope exactly like a missing one.

use chrono::Utc;
use tracing::{debug, info};

use botgate_types::bot::{
    AvatarRef, Bot, BotId, BotOwner, CreateBotRequest, TenantId, UpdateBotRequest,
    normalize_name, validate_http_url,
};
use botgate_types::credential::StoredCredential;
use botgate_types::error::BotError;

use crate::repository::SortOrder;
use crate::repository::bot::{BotFilter, BotRepository, BotScope};

pub struct BotRegistry<B: BotRepository> {
    repo: B,
}

impl<B: BotRepository> BotRegistry<B> {
    pub fn new(repo: B) -> Self {
        Self { repo }
    }

    /// Bots the tenant may see, oldest first.
    pub async fn list_visible(&self, tenant: &TenantId) -> Result<Vec<Bot>, BotError> {
        self.list(BotScope::VisibleTo(tenant.clone())).await
    }

    /// Global bots only, oldest first.
    pub async fn list_global(&self) -> Result<Vec<Bot>, BotError> {
        self.list(BotScope::Global).await
    }

    async fn list(&self, scope: BotScope) -> Result<Vec<Bot>, BotError> {
        let filter = BotFilter {
            scope,
            sort_by: Some("created_at".to_string()),
            sort_order: Some(SortOrder::Asc),
        };
        Ok(self.repo.list(&filter).await?)
    }

    /// A bot the tenant may see. Another tenant's bot is `NotFound`.
    pub async fn find(&self, tenant: &TenantId, id: &BotId) -> Result<Bot, BotError> {
        self.get(id)
            .await?
            .filter(|bot| bot.owner.is_visible_to(tenant))
            .ok_or(BotError::NotFound)
    }

    /// A global bot by id, for system provisioning.
    pub async fn find_global(&self, id: &BotId) -> Result<Bot, BotError> {
        self.get(id)
            .await?
            .filter(Bot::is_global)
            .ok_or(BotError::NotFound)
    }

    /// Any bot by id, ignoring tenant scope. Used to resolve verified tokens.
    pub async fn find_any(&self, id: &BotId) -> Result<Bot, BotError> {
        self.get(id).await?.ok_or(BotError::NotFound)
    }

    async fn get(&self, id: &BotId) -> Result<Option<Bot>, BotError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Validate a creation request into a new, not yet persisted bot.
    pub fn build(&self, owner: BotOwner, request: CreateBotRequest) -> Result<Bot, BotError> {
        let name = normalize_name(&request.name)?;
        let outgoing_url = match non_blank(request.outgoing_url) {
            Some(_) if owner.is_global() => {
                return Err(BotError::InvalidUrl(
                    "global bots have no outgoing url".to_string(),
                ));
            }
            Some(url) => Some(validate_http_url(&url)?),
            None => None,
        };

        let now = Utc::now();
        Ok(Bot {
            id: BotId::new(),
            owner,
            name,
            description: non_blank(request.description),
            outgoing_url,
            avatar: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Persist a new bot together with its first credential.
    pub async fn create(&self, bot: &Bot, credential: &StoredCredential) -> Result<Bot, BotError> {
        let created = self.repo.create(bot, credential).await?;
        info!(bot_id = %created.id, owner = %created.owner, "created bot");
        Ok(created)
    }

    /// Apply the metadata part of `patch` to `bot`. Avatar fields are
    /// handled by the caller.
    pub fn apply(&self, bot: &mut Bot, patch: &UpdateBotRequest) -> Result<(), BotError> {
        if let Some(name) = &patch.name {
            bot.name = normalize_name(name)?;
        }
        if let Some(description) = &patch.description {
            bot.description = non_blank(Some(description.clone()));
        }
        if let Some(url) = &patch.outgoing_url {
            bot.outgoing_url = if url.trim().is_empty() {
                None
            } else if bot.is_global() {
                return Err(BotError::InvalidUrl(
                    "global bots have no outgoing url".to_string(),
                ));
            } else {
                Some(validate_http_url(url)?)
            };
        }
        Ok(())
    }

    /// Write back a modified bot, refreshing `updated_at`.
    pub async fn save(&self, bot: &mut Bot) -> Result<Bot, BotError> {
        bot.updated_at = Utc::now();
        let saved = self.repo.update(bot).await?;
        debug!(bot_id = %saved.id, "saved bot");
        Ok(saved)
    }

    /// Record (or forget) the avatar reference of a bot.
    pub async fn set_avatar(
        &self,
        bot: &mut Bot,
        avatar: Option<AvatarRef>,
    ) -> Result<Bot, BotError> {
        bot.avatar = avatar;
        self.save(bot).await
    }

    /// Delete a bot. The store cascades to its credential.
    pub async fn delete(&self, id: &BotId) -> Result<(), BotError> {
        self.repo.delete(id).await?;
        info!(bot_id = %id, "deleted bot");
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
