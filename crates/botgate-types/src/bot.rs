use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::BotError;

/// Maximum length of a bot display name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Unique identifier for a bot, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotId(pub Uuid);

impl BotId {
    /// Create a new BotId using UUID v7 (time-sortable, guaranteed ordering).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a BotId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for BotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifier of a tenant (customer account). Tenants are managed outside
/// botgate; the id is trusted as supplied by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Who owns a bot.
///
/// Reads and writes are two different predicates over this one field:
/// a tenant can *see* its own bots plus every global bot, but can only
/// *mutate* the bots it owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tenant_id", rename_all = "lowercase")]
pub enum BotOwner {
    /// System bot, visible to every tenant and owned by none.
    Global,
    /// Bot owned by exactly one tenant.
    Tenant(TenantId),
}

impl BotOwner {
    pub fn is_global(&self) -> bool {
        matches!(self, BotOwner::Global)
    }

    /// Read predicate: own bots and global bots.
    pub fn is_visible_to(&self, tenant: &TenantId) -> bool {
        match self {
            BotOwner::Global => true,
            BotOwner::Tenant(owner) => owner == tenant,
        }
    }

    /// Write predicate: strictly own bots.
    pub fn is_owned_by(&self, tenant: &TenantId) -> bool {
        matches!(self, BotOwner::Tenant(owner) if owner == tenant)
    }

    /// The owning tenant, `None` for global bots.
    pub fn tenant_id(&self) -> Option<&TenantId> {
        match self {
            BotOwner::Global => None,
            BotOwner::Tenant(id) => Some(id),
        }
    }
}

impl fmt::Display for BotOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotOwner::Global => write!(f, "global"),
            BotOwner::Tenant(id) => write!(f, "tenant:{id}"),
        }
    }
}

/// Reference to an avatar held by the external asset pipeline.
///
/// botgate only tracks presence plus the derived thumbnail reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRef {
    pub thumbnail: String,
}

/// An automated identity usable by a tenant's integrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    pub owner: BotOwner,
    /// Freeform display name.
    pub name: String,
    pub description: Option<String>,
    /// Webhook delivery endpoint. Always `None` for global bots.
    pub outgoing_url: Option<String>,
    pub avatar: Option<AvatarRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bot {
    pub fn is_global(&self) -> bool {
        self.owner.is_global()
    }
}

/// Request to create a bot. Only `name` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBotRequest {
    pub name: String,
    pub description: Option<String>,
    pub outgoing_url: Option<String>,
}

/// Request to update a bot. Absent fields are left untouched.
///
/// `outgoing_url: Some("")` clears the endpoint. At most one of
/// `avatar_bytes` / `avatar_url` may be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBotRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub outgoing_url: Option<String>,
    #[serde(skip)]
    pub avatar_bytes: Option<Vec<u8>>,
    pub avatar_url: Option<String>,
}

/// Where a new avatar comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum AvatarSource {
    Bytes(Vec<u8>),
    Url(String),
}

impl fmt::Debug for AvatarSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvatarSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            AvatarSource::Url(url) => write!(f, "Url({url:?})"),
        }
    }
}

/// Trim and validate a display name.
pub fn normalize_name(name: &str) -> Result<String, BotError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BotError::InvalidName("name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(BotError::InvalidName(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an absolute http(s) URL.
///
/// Only the shape is checked: scheme, a non-empty host part and no whitespace.
pub fn validate_http_url(url: &str) -> Result<String, BotError> {
    let trimmed = url.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| BotError::InvalidUrl(format!("'{trimmed}' is not an http(s) URL")))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(BotError::InvalidUrl(format!("'{trimmed}' is not a valid URL")));
    }
    Ok(trimmed.to_string())
}
