/// Auto-saved project documents
///
/// Each project has one shared document and one personal memo per user.
/// Both are created empty on first read. The editor debounces keystrokes
/// client-side and PUTs the whole text; the last write wins.
///
/// - `GET/PUT /api/projects/:id/document`
/// - `GET/PUT /api/projects/:id/memo`

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidatedJson,
    routes::projects::load_project,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::debug;
use tshare_shared::{
    auth::middleware::AuthContext,
    models::document::{Document, DocumentSlot},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SaveDocumentRequest {
    #[validate(length(max = 1000000, message = "Document must be at most 1000000 characters"))]
    pub content: String,
}

async fn open(state: &AppState, slot: DocumentSlot) -> ApiResult<Json<Document>> {
    load_project(state, slot.project_id()).await?;
    Ok(Json(Document::get_or_create(&state.db, slot).await?))
}

async fn save(
    state: &AppState,
    slot: DocumentSlot,
    content: &str,
    editor: Uuid,
) -> ApiResult<Json<Document>> {
    load_project(state, slot.project_id()).await?;

    let document = Document::save(&state.db, slot, content, editor).await?;
    debug!(
        document_id = %document.id,
        project_id = %document.project_id,
        bytes = content.len(),
        "Document saved"
    );

    Ok(Json(document))
}

pub async fn get_shared_document(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    open(&state, DocumentSlot::Shared { project_id }).await
}

pub async fn save_shared_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SaveDocumentRequest>,
) -> ApiResult<Json<Document>> {
    save(
        &state,
        DocumentSlot::Shared { project_id },
        &req.content,
        auth.user_id,
    )
    .await
}

pub async fn get_memo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    open(
        &state,
        DocumentSlot::Memo {
            project_id,
            owner_id: auth.user_id,
        },
    )
    .await
}

pub async fn save_memo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SaveDocumentRequest>,
) -> ApiResult<Json<Document>> {
    save(
        &state,
        DocumentSlot::Memo {
            project_id,
            owner_id: auth.user_id,
        },
        &req.content,
        auth.user_id,
    )
    .await
}
