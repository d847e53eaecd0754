//! Outward representation of a bot.

use serde::Serialize;

use crate::bot::{Bot, BotId};
use crate::credential::Redacted;

/// The shape every bot takes when it leaves the identity service.
///
/// - `thumbnail` is always present (`null` without an avatar).
/// - `outgoing_url` is present only for tenant-owned bots, `null` when unset.
/// - `access_token` is present only on create/update/reset responses of
///   tenant-owned bots.
#[derive(Debug, Clone, Serialize)]
pub struct BotView {
    pub id: BotId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub system_bot: bool,
    pub thumbnail: Option<String>,
    // Outer `None` drops the key, `Some(None)` writes `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<Redacted>,
}

impl BotView {
    /// Metadata-only view, as returned by list and show.
    pub fn metadata(bot: &Bot) -> Self {
        let system_bot = bot.is_global();
        Self {
            id: bot.id.clone(),
            name: bot.name.clone(),
            description: bot.description.clone(),
            system_bot,
            thumbnail: bot.avatar.as_ref().map(|a| a.thumbnail.clone()),
            outgoing_url: (!system_bot).then(|| bot.outgoing_url.clone()),
            access_token: None,
        }
    }

    /// View carrying the live token. Global bots never carry one.
    pub fn with_token(bot: &Bot, access_token: Option<Redacted>) -> Self {
        let mut view = Self::metadata(bot);
        if !view.system_bot {
            view.access_token = access_token;
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{AvatarRef, BotOwner, TenantId};
    use chrono::Utc;

    fn make_bot(owner: BotOwner) -> Bot {
        let now = Utc::now();
        Bot {
            id: BotId::new(),
            owner,
            name: "Helper".to_string(),
            description: None,
            outgoing_url: None,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_global_view_omits_endpoint_and_token() {
        let bot = make_bot(BotOwner::Global);
        let view = BotView::with_token(&bot, Some(Redacted::new("bgt_secret")));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["system_bot"], true);
        assert!(json.get("outgoing_url").is_none());
        assert!(json.get("access_token").is_none());
        assert!(json.get("thumbnail").is_some());
        assert!(!json.to_string().contains("bgt_secret"));
    }

    #[test]
    fn test_owned_view_includes_null_endpoint() {
        let bot = make_bot(BotOwner::Tenant(TenantId::new()));
        let json = serde_json::to_value(BotView::metadata(&bot)).unwrap();

        assert_eq!(json["system_bot"], false);
        assert!(json.get("outgoing_url").is_some());
        assert!(json["outgoing_url"].is_null());
        assert!(json.get("access_token").is_none());
    }

    #[test]
    fn test_owned_view_with_token_and_avatar() {
        let mut bot = make_bot(BotOwner::Tenant(TenantId::new()));
        bot.outgoing_url = Some("https://example.com/hook".to_string());
        bot.avatar = Some(AvatarRef {
            thumbnail: "avatars/x/thumbnail".to_string(),
        });

        let view = BotView::with_token(&bot, Some(Redacted::new("bgt_live")));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["outgoing_url"], "https://example.com/hook");
        assert_eq!(json["access_token"], "bgt_live");
        assert_eq!(json["thumbnail"], "avatars/x/thumbnail");
    }
}
