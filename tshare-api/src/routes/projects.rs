/// Project endpoints
///
/// Projects are team-wide workspaces: every user can read them, only the
/// owner or an admin can change or delete one.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use tshare_shared::{
    auth::{authorization::require_owner_or_admin, middleware::AuthContext},
    models::{
        pagination::{Page, PageParams},
        project::{Project, ProjectInput},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl From<ProjectRequest> for ProjectInput {
    fn from(req: ProjectRequest) -> Self {
        ProjectInput {
            name: req.name.trim().to_string(),
            description: req.description,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnerFilter {
    /// Only projects owned by this user
    pub owner_id: Option<Uuid>,
}

/// Loads a project or fails with 404
pub(crate) async fn load_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

pub async fn list_projects(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<OwnerFilter>,
) -> ApiResult<Json<Page<Project>>> {
    let (projects, total) = Project::list(&state.db, &params, filter.owner_id).await?;
    Ok(Json(Page::new(projects, total, &params)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    Ok(Json(load_project(&state, id).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = Project::create(&state.db, req.into(), auth.user_id).await?;
    info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project = load_project(&state, id).await?;
    require_owner_or_admin(&auth, Some(project.owner_id))?;

    let project = Project::update(&state.db, id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(Json(project))
}

/// Deletes a project with its variables and documents
///
/// Templates attached to the project are kept and detached.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let project = load_project(&state, id).await?;
    require_owner_or_admin(&auth, Some(project.owner_id))?;

    Project::delete(&state.db, id).await?;

    info!(project_id = %id, user_id = %auth.user_id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
