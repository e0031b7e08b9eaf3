/// Liveness and readiness probe
///
/// `GET /health` sits outside `/api` and needs no token.
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "schema": { "applied": 1, "embedded": 1 },
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 }
/// }
/// ```
///
/// Answers 503 `degraded` when the database is unreachable or the schema is
/// behind the migrations compiled into this binary.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tshare_shared::db::{
    migrations::{schema_status, SchemaStatus},
    pool::{get_pool_stats, health_check as ping, PoolStats},
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaStatus>,

    pub pool: PoolStats,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let schema = match ping(&state.db).await {
        Ok(()) => schema_status(&state.db)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Schema status query failed"))
            .ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            None
        }
    };

    let healthy = schema.is_some_and(|s| s.is_current());
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: if schema.is_some() { "connected" } else { "disconnected" },
            schema,
            pool: get_pool_stats(&state.db),
        }),
    )
}
