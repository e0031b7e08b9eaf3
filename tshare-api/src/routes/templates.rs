/// Template endpoints
///
/// # Endpoints
///
/// - `GET    /api/templates?q=&scene_id=&project_id=&tag_id=&page=&per_page=`
/// - `POST   /api/templates`
/// - `GET    /api/templates/:id`
/// - `PUT    /api/templates/:id`
/// - `DELETE /api/templates/:id`
/// - `GET    /api/templates/:id/versions`
/// - `POST   /api/templates/:id/versions/:version/restore`
/// - `PUT    /api/templates/:id/tags`
/// - `GET    /api/templates/:id/variables`
/// - `POST   /api/templates/:id/render`
///
/// # Access
///
/// A user can read public templates, their own, and templates attached to
/// a project. Admins read everything. Only the creator or an admin can
/// modify a template. Templates the caller cannot read answer 404.

use std::collections::HashMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery, ValidatedJson},
    routes::projects::load_project,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tshare_shared::{
    auth::{authorization::require_owner_or_admin, middleware::AuthContext},
    models::{
        pagination::{Page, PageParams},
        project_variable::ProjectVariable,
        tag::Tag,
        template::{Template, TemplateFilter, TemplateInput},
        template_tag::TemplateTag,
        template_usage::TemplateUsage,
        template_version::TemplateVersion,
        user_variable::UserVariable,
    },
    variables::{extract_variables, substitute, Rendered, VariableScopes},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TemplateRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200000, message = "Content must be at most 200000 characters"))]
    pub content: String,

    pub scene_id: Option<Uuid>,
    pub project_id: Option<Uuid>,

    #[serde(default)]
    pub is_public: bool,
}

impl From<TemplateRequest> for TemplateInput {
    fn from(req: TemplateRequest) -> Self {
        TemplateInput {
            title: req.title.trim().to_string(),
            description: req.description,
            content: req.content,
            scene_id: req.scene_id,
            project_id: req.project_id,
            is_public: req.is_public,
        }
    }
}

/// Template with its tags and placeholder names
#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: Template,
    pub tags: Vec<Tag>,
    pub variables: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetTagsRequest {
    pub tag_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TemplateVariables {
    pub variables: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenderRequest {
    /// Project whose variables apply
    pub project_id: Option<Uuid>,

    /// Values typed into the form, highest precedence
    #[serde(default)]
    pub values: HashMap<String, String>,
}

/// Loads a template the caller may read
async fn load_visible(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Template> {
    Template::find_by_id(&state.db, id)
        .await?
        .filter(|t| t.is_visible_to(auth.user_id, auth.is_admin()))
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))
}

/// Loads a template the caller may modify
async fn load_editable(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Template> {
    let template = load_visible(state, auth, id).await?;
    require_owner_or_admin(auth, template.created_by)?;
    Ok(template)
}

pub async fn list_templates(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<TemplateFilter>,
) -> ApiResult<Json<Page<Template>>> {
    let viewer = (!auth.is_admin()).then_some(auth.user_id);
    let (templates, total) = Template::list(&state.db, &params, filter, viewer).await?;
    Ok(Json(Page::new(templates, total, &params)))
}

pub async fn get_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TemplateDetail>> {
    let template = load_visible(&state, &auth, id).await?;
    let tags = Tag::list_for_template(&state.db, id).await?;
    let variables = extract_variables(&template.content);

    Ok(Json(TemplateDetail {
        template,
        tags,
        variables,
    }))
}

/// Creates a template; version 1 is recorded with it
pub async fn create_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<TemplateRequest>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    let template = Template::create(&state.db, req.into(), auth.user_id).await?;
    info!(template_id = %template.id, user_id = %auth.user_id, "Template created");

    Ok((StatusCode::CREATED, Json(template)))
}

/// Replaces a template
///
/// A changed title or content is recorded as a new version.
pub async fn update_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<TemplateRequest>,
) -> ApiResult<Json<Template>> {
    load_editable(&state, &auth, id).await?;

    let template = Template::update(&state.db, id, req.into(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    info!(
        template_id = %id,
        user_id = %auth.user_id,
        version = template.current_version,
        "Template updated"
    );

    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_editable(&state, &auth, id).await?;

    Template::delete(&state.db, id).await?;

    info!(template_id = %id, user_id = %auth.user_id, "Template deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_versions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TemplateVersion>>> {
    load_visible(&state, &auth, id).await?;
    Ok(Json(TemplateVersion::list_for_template(&state.db, id).await?))
}

/// Copies an old version back as the newest version
pub async fn restore_version(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, version)): Path<(Uuid, i32)>,
) -> ApiResult<Json<Template>> {
    load_editable(&state, &auth, id).await?;

    let template = Template::restore_version(&state.db, id, version, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Version {} not found", version)))?;

    info!(
        template_id = %id,
        restored = version,
        version = template.current_version,
        "Template version restored"
    );

    Ok(Json(template))
}

/// Replaces the template's tag set and returns the resulting tags
pub async fn set_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<SetTagsRequest>,
) -> ApiResult<Json<Vec<Tag>>> {
    load_editable(&state, &auth, id).await?;

    TemplateTag::set_for_template(&state.db, id, &req.tag_ids).await?;
    Ok(Json(Tag::list_for_template(&state.db, id).await?))
}

pub async fn template_variables(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TemplateVariables>> {
    let template = load_visible(&state, &auth, id).await?;
    Ok(Json(TemplateVariables {
        variables: extract_variables(&template.content),
    }))
}

/// Fills a template's placeholders and records one use
///
/// Values come from the request first, then the project's variables, then
/// the caller's own variables. Unresolved placeholders stay in the text and
/// are listed in `missing`.
pub async fn render_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<RenderRequest>,
) -> ApiResult<Json<Rendered>> {
    let template = load_visible(&state, &auth, id).await?;

    let user_values = UserVariable::as_map(&state.db, auth.user_id).await?;
    let project_values = match req.project_id {
        Some(project_id) => {
            load_project(&state, project_id).await?;
            ProjectVariable::as_map(&state.db, project_id).await?
        }
        None => HashMap::new(),
    };

    let rendered = substitute(
        &template.content,
        &VariableScopes {
            user: &user_values,
            project: &project_values,
            explicit: &req.values,
        },
    );

    TemplateUsage::record(&state.db, template.id, auth.user_id, req.project_id).await?;

    info!(
        template_id = %template.id,
        user_id = %auth.user_id,
        resolved = rendered.resolved.len(),
        missing = rendered.missing.len(),
        "Template rendered"
    );

    Ok(Json(rendered))
}
