//! Asset pipeline port.
//!
//! Avatar bytes, storage and thumbnail rendering belong to an external
//! pipeline. botgate hands it sources and keeps only the returned reference.

use botgate_types::bot::{AvatarRef, AvatarSource, BotId};
use botgate_types::error::AssetError;

/// External avatar storage.
pub trait AssetPipeline: Send + Sync {
    /// Store an avatar for `bot_id`, replacing any previous one, and trigger
    /// thumbnail generation.
    fn attach(
        &self,
        bot_id: &BotId,
        source: &AvatarSource,
    ) -> impl std::future::Future<Output = Result<AvatarRef, AssetError>> + Send;

    /// Remove the avatar of `bot_id`. Implementations either treat a missing
    /// attachment as a no-op or report `AssetError::NotFound`.
    fn detach(
        &self,
        bot_id: &BotId,
    ) -> impl std::future::Future<Output = Result<(), AssetError>> + Send;

    /// The reference of the avatar currently stored for `bot_id`, if any.
    ///
    /// Used to pick up avatars the pipeline fetched on its own after a
    /// deferred `Job::FetchAvatar`.
    fn attached(
        &self,
        bot_id: &BotId,
    ) -> impl std::future::Future<Output = Result<Option<AvatarRef>, AssetError>> + Send;
}
