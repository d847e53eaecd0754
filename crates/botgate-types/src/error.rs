use thiserror::Error;

/// Errors related to bot registry operations.
#[derive(Debug, Error)]
pub enum BotError {
    /// Absent, or present but outside the caller's scope.
    #[error("bot not found")]
    NotFound,

    #[error("invalid bot name: {0}")]
    InvalidName(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid avatar: {0}")]
    InvalidAvatar(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to credential operations.
///
/// Never carries token values or key material.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential not found")]
    NotFound,

    #[error("credential sealing failed")]
    Sealing,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors reported by the external asset pipeline.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("attachment not found")]
    NotFound,

    #[error("unsupported avatar source: {0}")]
    Unsupported(String),

    #[error("asset storage error: {0}")]
    Storage(String),
}

/// Errors reported by the external job system.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job queue unavailable: {0}")]
    Unavailable(String),
}

/// Errors from repository operations (used by trait definitions in botgate-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for BotError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => BotError::NotFound,
            RepositoryError::Conflict(msg) => BotError::Conflict(msg),
            other => BotError::StorageError(other.to_string()),
        }
    }
}

impl From<RepositoryError> for CredentialError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => CredentialError::NotFound,
            RepositoryError::Conflict(msg) => CredentialError::Conflict(msg),
            other => CredentialError::StorageError(other.to_string()),
        }
    }
}
