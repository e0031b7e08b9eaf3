/// Scheduled maintenance jobs
///
/// A job does one bounded unit of work per call to [`Job::run`]; the
/// [`Scheduler`](crate::scheduler::Scheduler) decides when to call it.

use std::time::Duration;

use async_trait::async_trait;

pub mod prune_pending_users;

pub use prune_pending_users::PrunePendingUsers;

/// Job error types
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Job failed: {0}")]
    Failed(String),
}

/// Result of a single job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobOutcome {
    /// Rows created, changed or deleted
    pub affected: u64,
}

#[async_trait]
pub trait Job: Send + Sync {
    /// Stable name used in logs
    fn name(&self) -> &str;

    /// Pause between the start of two runs
    fn interval(&self) -> Duration;

    async fn run(&self) -> Result<JobOutcome, JobError>;
}
