/// Worker configuration
///
/// Loaded from environment variables:
///
/// - `DATABASE_URL` (required), `DATABASE_MAX_CONNECTIONS` (default 10)
/// - `PRUNE_INTERVAL_SECS` (default 86400)
/// - `PENDING_USER_MAX_AGE_DAYS` (default 7)

use std::str::FromStr;
use std::time::Duration;

use tshare_shared::db::pool::DatabaseConfig;

/// Default pause between two prune runs (one day)
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 86_400;

/// Default age after which a pending account is deleted
pub const DEFAULT_PENDING_USER_MAX_AGE_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database: DatabaseConfig,
    pub jobs: JobsConfig,
}

/// Schedule and thresholds for the maintenance jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsConfig {
    pub prune_interval: Duration,
    pub pending_user_max_age_days: i64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            prune_interval: Duration::from_secs(DEFAULT_PRUNE_INTERVAL_SECS),
            pending_user_max_age_days: DEFAULT_PENDING_USER_MAX_AGE_DAYS,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            jobs: JobsConfig::from_lookup(|key| std::env::var(key).ok())?,
        })
    }
}

impl JobsConfig {
    /// Builds the job settings from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let interval_secs: u64 = positive(
            "PRUNE_INTERVAL_SECS",
            lookup("PRUNE_INTERVAL_SECS"),
            DEFAULT_PRUNE_INTERVAL_SECS,
        )?;
        let max_age_days: i64 = positive(
            "PENDING_USER_MAX_AGE_DAYS",
            lookup("PENDING_USER_MAX_AGE_DAYS"),
            DEFAULT_PENDING_USER_MAX_AGE_DAYS,
        )?;

        Ok(Self {
            prune_interval: Duration::from_secs(interval_secs),
            pending_user_max_age_days: max_age_days,
        })
    }
}

fn positive<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };

    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::NotANumber { name, value: raw.clone() })?;

    if value <= T::default() {
        return Err(ConfigError::NotPositive { name });
    }

    Ok(value)
}
