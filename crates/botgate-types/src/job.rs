//! Work handed to the external job system.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::bot::BotId;

/// A deferred task. botgate only enqueues these; an external worker runs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    /// Download the avatar at `url` and attach it to `bot_id`.
    FetchAvatar { bot_id: BotId, url: String },
}

impl Job {
    /// Stable kind name used as the queue routing key.
    pub fn kind(&self) -> JobKind {
        match self {
            Job::FetchAvatar { .. } => JobKind::FetchAvatar,
        }
    }

    /// The bot this job concerns.
    pub fn bot_id(&self) -> &BotId {
        match self {
            Job::FetchAvatar { bot_id, .. } => bot_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    FetchAvatar,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::FetchAvatar => write!(f, "fetch_avatar"),
        }
    }
}
