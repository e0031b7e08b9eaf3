/// Scene endpoints
///
/// Any authenticated user can read scenes; writes are admin-only.
///
/// - `GET    /api/scenes`
/// - `POST   /api/scenes`
/// - `GET    /api/scenes/:id`
/// - `PUT    /api/scenes/:id`
/// - `DELETE /api/scenes/:id`

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
    auth::{authorization::require_admin, middleware::AuthContext},
    models::{
        pagination::{Page, PageParams},
        scene::{Scene, SceneInput},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SceneRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub sort_order: i32,
}

impl From<SceneRequest> for SceneInput {
    fn from(req: SceneRequest) -> Self {
        SceneInput {
            name: req.name.trim().to_string(),
            description: req.description,
            sort_order: req.sort_order,
        }
    }
}

fn scene_not_found() -> ApiError {
    ApiError::NotFound("Scene not found".to_string())
}

pub async fn list_scenes(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<Scene>>> {
    let (scenes, total) = Scene::list(&state.db, &params).await?;
    Ok(Json(Page::new(scenes, total, &params)))
}

pub async fn get_scene(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Scene>> {
    let scene = Scene::find_by_id(&state.db, id)
        .await?
        .ok_or_else(scene_not_found)?;
    Ok(Json(scene))
}

pub async fn create_scene(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<SceneRequest>,
) -> ApiResult<(StatusCode, Json<Scene>)> {
    require_admin(&auth)?;

    let scene = Scene::create(&state.db, req.into(), auth.user_id).await?;
    info!(scene_id = %scene.id, name = %scene.name, "Scene created");

    Ok((StatusCode::CREATED, Json(scene)))
}

pub async fn update_scene(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SceneRequest>,
) -> ApiResult<Json<Scene>> {
    require_admin(&auth)?;

    let scene = Scene::update(&state.db, id, req.into())
        .await?
        .ok_or_else(scene_not_found)?;
    Ok(Json(scene))
}

/// Deletes a scene; templates in it become uncategorized
pub async fn delete_scene(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !Scene::delete(&state.db, id).await? {
        return Err(scene_not_found());
    }

    info!(scene_id = %id, "Scene deleted");
    Ok(StatusCode::NO_CONTENT)
}
