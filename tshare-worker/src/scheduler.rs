/// Interval scheduler for maintenance jobs
///
/// Each registered job gets its own loop: it runs once immediately, then
/// again every [`Job::interval`]. A failed run is logged and retried at the
/// next tick. Cancelling the shutdown token stops every loop after the run
/// in progress finishes.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use tshare_worker::{jobs::Job, scheduler::{cancel_on_signal, Scheduler}};
/// # async fn example(job: Arc<dyn Job>) {
/// let mut scheduler = Scheduler::new();
/// scheduler.register(job);
///
/// tokio::spawn(cancel_on_signal(
///     tokio::signal::ctrl_c(),
///     scheduler.shutdown_token(),
/// ));
///
/// scheduler.run().await;
/// # }
/// ```

use std::{future::Future, io, sync::Arc};

use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::jobs::Job;

pub struct Scheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_token: CancellationToken,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn register(&mut self, job: Arc<dyn Job>) {
        tracing::info!(
            job = job.name(),
            interval_secs = job.interval().as_secs(),
            "Registering job"
        );
        self.jobs.push(job);
    }

    /// Token that stops the scheduler when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs every job loop until shutdown
    pub async fn run(self) {
        let mut loops = JoinSet::new();
        for job in self.jobs {
            loops.spawn(run_job_loop(job, self.shutdown_token.clone()));
        }

        while let Some(result) = loops.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Job loop terminated abnormally");
            }
        }

        tracing::info!("Scheduler stopped");
    }
}

/// Cancels `shutdown` once `signal` fires
///
/// A signal listener that fails to install leaves the token alone, so the
/// worker keeps running instead of stopping right after start.
pub async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Shutdown signal received, finishing running jobs...");
            shutdown.cancel();
        }
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

async fn run_job_loop(job: Arc<dyn Job>, shutdown: CancellationToken) {
    let mut ticker = interval(job.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => run_once(job.as_ref()).await,
        }
    }

    tracing::debug!(job = job.name(), "Job loop stopped");
}

async fn run_once(job: &dyn Job) {
    let started = tokio::time::Instant::now();

    match job.run().await {
        Ok(outcome) => tracing::info!(
            job = job.name(),
            affected = outcome.affected,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job finished"
        ),
        Err(e) => tracing::error!(job = job.name(), error = %e, "Job failed"),
    }
}
