/// User administration endpoints (admin only)
///
/// # Endpoints
///
/// - `GET    /api/users?q=&status=&page=&per_page=` - List accounts
/// - `GET    /api/users/:id` - Get one account
/// - `PUT    /api/users/:id` - Change name, role or status
/// - `POST   /api/users/:id/approve` - Activate a pending account
/// - `DELETE /api/users/:id` - Delete an account

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
    auth::middleware::AuthContext,
    models::{
        pagination::{Page, PageParams},
        user::{UpdateUser, User, UserProfile, UserRole, UserStatus},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<UserStatus>,
}

/// Admin edit of an account; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New display name; an empty string clears it
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    pub role: Option<UserRole>,

    pub status: Option<UserStatus>,
}

impl UpdateUserRequest {
    fn into_update(self) -> UpdateUser {
        UpdateUser {
            name: self.name.map(|n| {
                let n = n.trim();
                (!n.is_empty()).then(|| n.to_string())
            }),
            role: self.role,
            status: self.status,
            password_hash: None,
        }
    }
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> ApiResult<Json<Page<UserProfile>>> {
    let (users, total) = User::list(&state.db, &params, filter.status).await?;
    Ok(Json(Page::new(users, total, &params).map(UserProfile::from)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

/// Updates name, role or status
///
/// Admins cannot demote or suspend themselves, so at least one active admin
/// always remains reachable.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserProfile>> {
    if id == auth.user_id
        && (matches!(req.role, Some(role) if role != UserRole::Admin)
            || matches!(req.status, Some(status) if status != UserStatus::Active))
    {
        return Err(ApiError::BadRequest(
            "You cannot demote or deactivate your own account".to_string(),
        ));
    }

    let update = req.into_update();
    if update.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let user = User::update(&state.db, id, update)
        .await?
        .ok_or_else(user_not_found)?;

    info!(
        user_id = %user.id,
        admin_id = %auth.user_id,
        role = user.role.as_str(),
        status = user.status.as_str(),
        "User updated"
    );

    Ok(Json(user.into()))
}

pub async fn approve_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    let user = User::approve(&state.db, id)
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, admin_id = %auth.user_id, "User approved");

    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !User::delete(&state.db, id).await? {
        return Err(user_not_found());
    }

    info!(user_id = %id, admin_id = %auth.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
