//! Local filesystem avatar store.
//!
//! Implements the `AssetPipeline` port with originals kept at
//! `{data_dir}/avatars/{bot_id}/original`. Thumbnails are rendered by the
//! external pipeline into the same directory; this store only hands out the
//! reference.

use std::path::PathBuf;

use botgate_core::service::asset::AssetPipeline;
use botgate_types::bot::{AvatarRef, AvatarSource, BotId};
use botgate_types::error::AssetError;

const ORIGINAL: &str = "original";
const THUMBNAIL: &str = "thumbnail";

/// Avatar storage under the data directory.
///
/// Detaching an absent avatar is a no-op. Remote sources are rejected:
/// those are fetched by the job system, which then attaches the bytes.
#[derive(Clone)]
pub struct LocalAssetStore {
    data_dir: PathBuf,
}

impl LocalAssetStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn bot_dir(&self, bot_id: &BotId) -> PathBuf {
        self.data_dir.join("avatars").join(bot_id.to_string())
    }

    fn thumbnail_ref(bot_id: &BotId) -> String {
        format!("avatars/{bot_id}/{THUMBNAIL}")
    }
}

impl AssetPipeline for LocalAssetStore {
    async fn attach(&self, bot_id: &BotId, source: &AvatarSource) -> Result<AvatarRef, AssetError> {
        let bytes = match source {
            AvatarSource::Bytes(bytes) => bytes,
            AvatarSource::Url(_) => {
                return Err(AssetError::Unsupported(
                    "remote avatars are fetched by the job system".to_string(),
                ));
            }
        };

        let dir = self.bot_dir(bot_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AssetError::Storage(e.to_string()))?;
        // A stale thumbnail must not outlive its original.
        match tokio::fs::remove_file(dir.join(THUMBNAIL)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AssetError::Storage(e.to_string())),
        }
        tokio::fs::write(dir.join(ORIGINAL), bytes)
            .await
            .map_err(|e| AssetError::Storage(e.to_string()))?;

        tracing::debug!(bot_id = %bot_id, size = bytes.len(), "stored avatar");
        Ok(AvatarRef {
            thumbnail: Self::thumbnail_ref(bot_id),
        })
    }

    async fn detach(&self, bot_id: &BotId) -> Result<(), AssetError> {
        match tokio::fs::remove_dir_all(self.bot_dir(bot_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AssetError::Storage(e.to_string())),
        }
    }

    async fn attached(&self, bot_id: &BotId) -> Result<Option<AvatarRef>, AssetError> {
        let present = tokio::fs::try_exists(self.bot_dir(bot_id).join(ORIGINAL))
            .await
            .map_err(|e| AssetError::Storage(e.to_string()))?;

        Ok(present.then(|| AvatarRef {
            thumbnail: Self::thumbnail_ref(bot_id),
        }))
    }
}
