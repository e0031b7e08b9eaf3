/// Variable endpoints
///
/// User variables belong to the caller and are never visible to others.
/// Project variables are readable by everyone and writable by the project's
/// owner or an admin.
///
/// - `GET/POST       /api/variables`
/// - `PUT/DELETE     /api/variables/:id`
/// - `GET/POST       /api/projects/:id/variables`
/// - `PUT/DELETE     /api/projects/:id/variables/:var_id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, ValidatedJson},
    routes::projects::load_project,
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
        project_variable::ProjectVariable,
        user_variable::{UserVariable, VariableInput},
    },
    variables::validate_variable_name,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct VariableRequest {
    #[validate(custom(function = "placeholder_name"))]
    pub name: String,

    #[validate(length(max = 10000, message = "Value must be at most 10000 characters"))]
    pub value: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

fn placeholder_name(name: &str) -> Result<(), ValidationError> {
    validate_variable_name(name).map_err(|message| {
        ValidationError::new("variable_name").with_message(message.into())
    })
}

impl From<VariableRequest> for VariableInput {
    fn from(req: VariableRequest) -> Self {
        VariableInput {
            name: req.name,
            value: req.value,
            description: req.description,
        }
    }
}

fn variable_not_found() -> ApiError {
    ApiError::NotFound("Variable not found".to_string())
}

// User scope

pub async fn list_user_variables(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<UserVariable>>> {
    let (vars, total) = UserVariable::list(&state.db, auth.user_id, &params).await?;
    Ok(Json(Page::new(vars, total, &params)))
}

pub async fn create_user_variable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<VariableRequest>,
) -> ApiResult<(StatusCode, Json<UserVariable>)> {
    let var = UserVariable::create(&state.db, auth.user_id, req.into()).await?;
    info!(variable_id = %var.id, user_id = %auth.user_id, name = %var.name, "User variable created");

    Ok((StatusCode::CREATED, Json(var)))
}

pub async fn update_user_variable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<VariableRequest>,
) -> ApiResult<Json<UserVariable>> {
    let var = UserVariable::update(&state.db, auth.user_id, id, req.into())
        .await?
        .ok_or_else(variable_not_found)?;
    Ok(Json(var))
}

pub async fn delete_user_variable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !UserVariable::delete(&state.db, auth.user_id, id).await? {
        return Err(variable_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

// Project scope

pub async fn list_project_variables(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<ProjectVariable>>> {
    load_project(&state, project_id).await?;

    let (vars, total) = ProjectVariable::list(&state.db, project_id, &params).await?;
    Ok(Json(Page::new(vars, total, &params)))
}

pub async fn create_project_variable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<VariableRequest>,
) -> ApiResult<(StatusCode, Json<ProjectVariable>)> {
    let project = load_project(&state, project_id).await?;
    require_owner_or_admin(&auth, Some(project.owner_id))?;

    let var = ProjectVariable::create(&state.db, project_id, req.into()).await?;
    info!(variable_id = %var.id, project_id = %project_id, name = %var.name, "Project variable created");

    Ok((StatusCode::CREATED, Json(var)))
}

pub async fn update_project_variable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, var_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<VariableRequest>,
) -> ApiResult<Json<ProjectVariable>> {
    let project = load_project(&state, project_id).await?;
    require_owner_or_admin(&auth, Some(project.owner_id))?;

    let var = ProjectVariable::update(&state.db, project_id, var_id, req.into())
        .await?
        .ok_or_else(variable_not_found)?;
    Ok(Json(var))
}

pub async fn delete_project_variable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, var_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let project = load_project(&state, project_id).await?;
    require_owner_or_admin(&auth, Some(project.owner_id))?;

    if !ProjectVariable::delete(&state.db, project_id, var_id).await? {
        return Err(variable_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> VariableRequest {
        VariableRequest {
            name: name.to_string(),
            value: "value".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_variable_name_rules() {
        assert!(request("client_name").validate().is_ok());
        assert!(request("Date2").validate().is_ok());

        let errors = request("client name").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        assert!(request("").validate().is_err());
        assert!(request("名前").validate().is_err());
    }
}
