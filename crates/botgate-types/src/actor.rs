//! The caller context attached to every tenant-scoped request.
//!
//! Actors are produced by the session layer and trusted verbatim.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::bot::TenantId;

/// Role of the caller within its tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Administrator,
    Agent,
    Unauthenticated,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Administrator => write!(f, "administrator"),
            ActorRole::Agent => write!(f, "agent"),
            ActorRole::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "administrator" | "admin" => Ok(ActorRole::Administrator),
            "agent" => Ok(ActorRole::Agent),
            "unauthenticated" | "anonymous" => Ok(ActorRole::Unauthenticated),
            other => Err(format!("invalid actor role: '{other}'")),
        }
    }
}

/// An authenticated (or unauthenticated) caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    /// Tenant the actor is operating under. `None` when unauthenticated.
    pub tenant_id: Option<TenantId>,
}

impl Actor {
    pub fn administrator(tenant_id: TenantId) -> Self {
        Self {
            role: ActorRole::Administrator,
            tenant_id: Some(tenant_id),
        }
    }

    pub fn agent(tenant_id: TenantId) -> Self {
        Self {
            role: ActorRole::Agent,
            tenant_id: Some(tenant_id),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            role: ActorRole::Unauthenticated,
            tenant_id: None,
        }
    }

    /// Whether this actor is an authenticated member of `tenant`.
    pub fn is_member_of(&self, tenant: &TenantId) -> bool {
        self.role != ActorRole::Unauthenticated && self.tenant_id.as_ref() == Some(tenant)
    }
}
