/// Admin endpoints
///
/// # Endpoints
///
/// - `GET /api/admin/dashboard` - Aggregated statistics
/// - `GET /api/admin/export` - Download the whole database as JSON
/// - `POST /api/admin/import?clear_existing=&disable_foreign_keys=&preserve_ids=`
/// - `GET /api/admin/oauth` - OAuth providers, secrets masked
/// - `PUT /api/admin/oauth` - Replace OAuth providers
///
/// The router only lets admins reach these handlers.

use std::collections::HashSet;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery, ValidatedJson},
    oauth::OAuthSettings,
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use tshare_shared::{
    auth::middleware::AuthContext,
    dashboard::DashboardStats,
    transfer::{export_database, export_filename, import_database, ImportOptions, ImportReport},
};

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(DashboardStats::collect(&state.db).await?))
}

/// Streams the export envelope as a pretty-printed attachment
pub async fn export(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    let envelope = export_database(&state.db).await?;

    let body = serde_json::to_vec_pretty(&envelope)
        .map_err(|e| ApiError::InternalError(format!("Failed to serialize export: {}", e)))?;

    let filename = export_filename(Utc::now());

    info!(
        admin_id = %auth.user_id,
        rows = envelope.data.counts().total(),
        bytes = body.len(),
        filename = %filename,
        "Database export downloaded"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// Restores an export envelope
///
/// Runs in a single transaction: a bad file or a failing row leaves the
/// database untouched.
pub async fn import(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(options): ApiQuery<ImportOptions>,
    ApiJson(payload): ApiJson<Value>,
) -> ApiResult<Json<ImportReport>> {
    info!(admin_id = %auth.user_id, ?options, "Database import requested");

    let report = import_database(&state.db, &payload, options).await?;

    info!(admin_id = %auth.user_id, rows = report.total(), "Database import finished");

    Ok(Json(report))
}

pub async fn get_oauth(State(state): State<AppState>) -> Json<OAuthSettings> {
    Json(state.oauth.read().await.masked())
}

/// Replaces the provider list
///
/// Secrets sent back as the mask keep their stored value.
pub async fn update_oauth(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(update): ValidatedJson<OAuthSettings>,
) -> ApiResult<Json<OAuthSettings>> {
    let mut names = HashSet::new();
    if let Some(dup) = update.providers.iter().find(|p| !names.insert(p.name.as_str())) {
        return Err(ApiError::BadRequest(format!(
            "Provider {} is listed more than once",
            dup.name
        )));
    }

    let mut settings = state.oauth.write().await;
    settings.replace(update);

    info!(
        admin_id = %auth.user_id,
        enabled = ?settings.enabled_names(),
        "OAuth settings updated"
    );

    Ok(Json(settings.masked()))
}
