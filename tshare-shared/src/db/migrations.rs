/// Embedded schema migrations
///
/// The SQL files under `tshare-shared/migrations/` are compiled into every
/// binary. Both the API server and the worker apply them at start-up; sqlx
/// serializes concurrent runs with an advisory lock.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;
use tracing::{info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applied vs embedded migrations, as reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SchemaStatus {
    pub applied: usize,
    pub embedded: usize,
}

impl SchemaStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Brings the database schema up to date
///
/// # Errors
///
/// Fails if a migration does not apply or an already-applied file changed.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(embedded = MIGRATOR.iter().count(), "Applying database migrations");

    MIGRATOR.run(pool).await.inspect_err(|e| {
        warn!(error = %e, "Database migration failed");
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Counts successfully applied migrations
///
/// A database that was never migrated reports zero applied.
pub async fn schema_status(pool: &PgPool) -> Result<SchemaStatus, sqlx::Error> {
    let embedded = MIGRATOR.iter().count();

    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    if !tracked {
        return Ok(SchemaStatus { applied: 0, embedded });
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await?;

    Ok(SchemaStatus {
        applied: applied.max(0) as usize,
        embedded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_schema_is_embedded() {
        assert!(MIGRATOR
            .iter()
            .any(|m| m.description.contains("initial schema")));
    }

    #[test]
    fn test_schema_status_is_current() {
        let behind = SchemaStatus { applied: 0, embedded: 1 };
        let current = SchemaStatus { applied: 1, embedded: 1 };

        assert!(!behind.is_current());
        assert!(current.is_current());
    }
}
