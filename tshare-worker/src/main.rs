//! # Template Share Worker
//!
//! Runs scheduled maintenance against the Template Share database:
//!
//! - Deletes accounts still `pending` approval after
//!   `PENDING_USER_MAX_AGE_DAYS` (default 7), every `PRUNE_INTERVAL_SECS`
//!   (default one day) and once at startup
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tshare-worker
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tshare_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool},
};
use tshare_worker::{
    config::WorkerConfig,
    jobs::PrunePendingUsers,
    scheduler::{cancel_on_signal, Scheduler},
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tshare_worker=debug,tshare_shared=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Template Share Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(config.database.clone()).await?;
    run_migrations(&pool).await?;

    let mut scheduler = Scheduler::new();
    scheduler.register(Arc::new(PrunePendingUsers::new(
        pool.clone(),
        config.jobs.pending_user_max_age_days,
        config.jobs.prune_interval,
    )));

    tokio::spawn(cancel_on_signal(
        tokio::signal::ctrl_c(),
        scheduler.shutdown_token(),
    ));

    scheduler.run().await;

    close_pool(pool).await;
    tracing::info!("Worker stopped");

    Ok(())
}
