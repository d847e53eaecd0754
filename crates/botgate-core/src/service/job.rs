//! Job queue port.

use botgate_types::bot::BotId;
use botgate_types::error::JobError;
use botgate_types::job::Job;

/// Hand-off point to the external job system.
///
/// `enqueue` returns as soon as the job is accepted; it never waits for the
/// job to run.
pub trait JobQueue: Send + Sync {
    fn enqueue(
        &self,
        job: &Job,
    ) -> impl std::future::Future<Output = Result<(), JobError>> + Send;

    /// Drop every job still waiting for `bot_id`. Returns how many were
    /// cancelled. Jobs already picked up are left alone.
    fn cancel_for_bot(
        &self,
        bot_id: &BotId,
    ) -> impl std::future::Future<Output = Result<u64, JobError>> + Send;
}
