//! SQLite-backed job queue.
//!
//! botgate only produces jobs. Rows are written as `pending` and picked up
//! by the external worker, which reports back through [`SqliteJobQueue::finish`].
//! Deleting a bot cancels its pending jobs; settled rows are removed with
//! [`SqliteJobQueue::prune`].

use botgate_core::service::job::JobQueue;
use botgate_types::bot::BotId;
use botgate_types::error::JobError;
use botgate_types::job::Job;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use uuid::Uuid;

use super::bot::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// A job row as stored in the queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedJob {
    pub id: Uuid,
    pub job: Job,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SqliteJobQueue {
    pool: DatabasePool,
}

impl SqliteJobQueue {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Pending jobs, oldest first.
    pub async fn pending(&self) -> Result<Vec<QueuedJob>, JobError> {
        let rows = sqlx::query(
            "SELECT id, payload, created_at FROM jobs WHERE status = 'pending' ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| JobError::Unavailable(e.to_string()))?;

        rows.iter().map(queued_from_row).collect()
    }

    /// A pending job by id.
    pub async fn get_pending(&self, id: &Uuid) -> Result<Option<QueuedJob>, JobError> {
        let row = sqlx::query(
            "SELECT id, payload, created_at FROM jobs WHERE id = ? AND status = 'pending'",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| JobError::Unavailable(e.to_string()))?;

        row.as_ref().map(queued_from_row).transpose()
    }

    /// Mark a job as done (`succeeded`) or failed. Returns false if the job
    /// was not pending.
    pub async fn finish(&self, id: &Uuid, succeeded: bool) -> Result<bool, JobError> {
        let status = if succeeded { "done" } else { "failed" };
        let result = sqlx::query("UPDATE jobs SET status = ? WHERE id = ? AND status = 'pending'")
            .bind(status)
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| JobError::Unavailable(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete settled (done, failed or cancelled) jobs created before
    /// `cutoff`. Pending jobs are never pruned.
    pub async fn prune(&self, cutoff: DateTime<Utc>) -> Result<u64, JobError> {
        let result = sqlx::query("DELETE FROM jobs WHERE status != 'pending' AND created_at < ?")
            .bind(format_datetime(&cutoff))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| JobError::Unavailable(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

fn queued_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<QueuedJob, JobError> {
    let corrupt = |e: String| JobError::Unavailable(format!("corrupt job row: {e}"));

    let id: String = row.try_get("id").map_err(|e| corrupt(e.to_string()))?;
    let payload: String = row.try_get("payload").map_err(|e| corrupt(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| corrupt(e.to_string()))?;

    Ok(QueuedJob {
        id: Uuid::parse_str(&id).map_err(|e| corrupt(e.to_string()))?,
        job: serde_json::from_str(&payload).map_err(|e| corrupt(e.to_string()))?,
        created_at: parse_datetime(&created_at).map_err(|e| corrupt(e.to_string()))?,
    })
}

impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: &Job) -> Result<(), JobError> {
        let payload =
            serde_json::to_string(job).map_err(|e| JobError::Unavailable(e.to_string()))?;
        let id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO jobs (id, kind, bot_id, payload, status, created_at)
             VALUES (?, ?, ?, ?, 'pending', ?)",
        )
        .bind(id.to_string())
        .bind(job.kind().to_string())
        .bind(job.bot_id().to_string())
        .bind(&payload)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| JobError::Unavailable(e.to_string()))?;

        tracing::debug!(job_id = %id, kind = %job.kind(), "job enqueued");
        Ok(())
    }

    async fn cancel_for_bot(&self, bot_id: &BotId) -> Result<u64, JobError> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'cancelled' WHERE bot_id = ? AND status = 'pending'",
        )
        .bind(bot_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| JobError::Unavailable(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::bot::tests::test_pool;
    use chrono::Duration;

    fn fetch(bot_id: &BotId, url: &str) -> Job {
        Job::FetchAvatar {
            bot_id: bot_id.clone(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_enqueue_then_pending() {
        let queue = SqliteJobQueue::new(test_pool().await);
        let bot_id = BotId::new();

        queue.enqueue(&fetch(&bot_id, "https://example.com/a.png")).await.unwrap();
        queue.enqueue(&fetch(&bot_id, "https://example.com/b.png")).await.unwrap();

        let pending = queue.pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].job, fetch(&bot_id, "https://example.com/a.png"));
        assert_eq!(pending[1].job, fetch(&bot_id, "https://example.com/b.png"));
    }

    #[tokio::test]
    async fn test_finish_removes_from_pending() {
        let queue = SqliteJobQueue::new(test_pool().await);
        queue
            .enqueue(&fetch(&BotId::new(), "https://example.com/a.png"))
            .await
            .unwrap();
        let id = queue.pending().await.unwrap()[0].id;

        assert!(queue.finish(&id, true).await.unwrap());
        assert!(!queue.finish(&id, false).await.unwrap());
        assert!(queue.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_pending_only_sees_pending_jobs() {
        let queue = SqliteJobQueue::new(test_pool().await);
        let bot_id = BotId::new();
        queue.enqueue(&fetch(&bot_id, "https://example.com/a.png")).await.unwrap();
        let id = queue.pending().await.unwrap()[0].id;

        let found = queue.get_pending(&id).await.unwrap().unwrap();
        assert_eq!(found.job.bot_id(), &bot_id);
        assert!(queue.get_pending(&Uuid::now_v7()).await.unwrap().is_none());

        queue.finish(&id, false).await.unwrap();
        assert!(queue.get_pending(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_for_bot_leaves_other_bots_alone() {
        let queue = SqliteJobQueue::new(test_pool().await);
        let gone = BotId::new();
        let kept = BotId::new();
        queue.enqueue(&fetch(&gone, "https://example.com/a.png")).await.unwrap();
        queue.enqueue(&fetch(&gone, "https://example.com/b.png")).await.unwrap();
        queue.enqueue(&fetch(&kept, "https://example.com/c.png")).await.unwrap();

        assert_eq!(queue.cancel_for_bot(&gone).await.unwrap(), 2);
        assert_eq!(queue.cancel_for_bot(&gone).await.unwrap(), 0);

        let pending = queue.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].job.bot_id(), &kept);

        let status: Vec<String> = sqlx::query_scalar("SELECT status FROM jobs WHERE bot_id = ?")
            .bind(gone.to_string())
            .fetch_all(&queue.pool.reader)
            .await
            .unwrap();
        assert_eq!(status, vec!["cancelled", "cancelled"]);

        // A late worker cannot settle a cancelled job.
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM jobs WHERE bot_id = ?")
            .bind(gone.to_string())
            .fetch_all(&queue.pool.reader)
            .await
            .unwrap();
        let id = Uuid::parse_str(&ids[0]).unwrap();
        assert!(!queue.finish(&id, true).await.unwrap());
    }

    #[tokio::test]
    async fn test_prune_removes_only_settled_jobs() {
        let queue = SqliteJobQueue::new(test_pool().await);
        let bot_id = BotId::new();
        for url in ["https://example.com/a.png", "https://example.com/b.png"] {
            queue.enqueue(&fetch(&bot_id, url)).await.unwrap();
        }
        let settled = queue.pending().await.unwrap()[0].id;
        queue.finish(&settled, true).await.unwrap();

        // Nothing is old enough yet.
        let an_hour_ago = Utc::now() - Duration::hours(1);
        assert_eq!(queue.prune(an_hour_ago).await.unwrap(), 0);

        let later = Utc::now() + Duration::seconds(1);
        assert_eq!(queue.prune(later).await.unwrap(), 1);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&queue.pool.reader)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
        assert_eq!(queue.pending().await.unwrap().len(), 1);
    }
}
