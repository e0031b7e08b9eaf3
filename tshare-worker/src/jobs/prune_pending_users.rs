/// Deletes accounts that stayed `pending` for too long
///
/// Registrations nobody approves would otherwise pile up forever. Only
/// `pending` users are removed; `active` and `suspended` accounts are kept
/// regardless of age.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tshare_shared::models::user::User;

use super::{Job, JobError, JobOutcome};

pub struct PrunePendingUsers {
    pool: PgPool,
    max_age_days: i64,
    interval: Duration,
}

impl PrunePendingUsers {
    pub fn new(pool: PgPool, max_age_days: i64, interval: Duration) -> Self {
        Self {
            pool,
            max_age_days,
            interval,
        }
    }

    /// Accounts created before this instant are stale
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::days(self.max_age_days)
    }
}

#[async_trait]
impl Job for PrunePendingUsers {
    fn name(&self) -> &str {
        "prune_pending_users"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<JobOutcome, JobError> {
        let cutoff = self.cutoff(Utc::now());
        let deleted = User::delete_stale_pending(&self.pool, cutoff).await?;

        if deleted > 0 {
            tracing::info!(deleted, %cutoff, "Pruned stale pending users");
        } else {
            tracing::debug!(%cutoff, "No stale pending users");
        }

        Ok(JobOutcome { affected: deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;

    fn job(max_age_days: i64) -> PrunePendingUsers {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        PrunePendingUsers::new(pool, max_age_days, Duration::from_secs(86_400))
    }

    #[tokio::test]
    async fn test_cutoff_is_max_age_before_now() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();

        assert_eq!(
            job(7).cutoff(now),
            Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap()
        );
        assert_eq!(
            job(1).cutoff(now),
            Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_name_and_interval() {
        let job = job(7);
        assert_eq!(job.name(), "prune_pending_users");
        assert_eq!(job.interval(), Duration::from_secs(86_400));
    }
}
