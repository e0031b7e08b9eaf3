/// Tag endpoints
///
/// Any authenticated user can list and create tags; renaming and deleting
/// are admin-only since tags are shared by every template.

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
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::info;
use tshare_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::{
        pagination::{Page, PageParams},
        tag::{CreateTag, Tag},
    },
};
use uuid::Uuid;
use validator::Validate;

/// `#rgb` or `#rrggbb`
static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").expect("valid color regex")
});

#[derive(Debug, Deserialize, Validate)]
pub struct TagRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[validate(regex(path = *COLOR_RE, message = "Color must be a hex code like #ff8800"))]
    pub color: Option<String>,
}

impl From<TagRequest> for CreateTag {
    fn from(req: TagRequest) -> Self {
        CreateTag {
            name: req.name.trim().to_string(),
            color: req.color,
        }
    }
}

pub async fn list_tags(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<Tag>>> {
    let (tags, total) = Tag::list(&state.db, &params).await?;
    Ok(Json(Page::new(tags, total, &params)))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<TagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let tag = Tag::create(&state.db, req.into()).await?;
    info!(tag_id = %tag.id, user_id = %auth.user_id, name = %tag.name, "Tag created");

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<TagRequest>,
) -> ApiResult<Json<Tag>> {
    require_admin(&auth)?;

    let tag = Tag::update(&state.db, id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !Tag::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Tag not found".to_string()));
    }

    info!(tag_id = %id, "Tag deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, color: Option<&str>) -> TagRequest {
        TagRequest {
            name: name.to_string(),
            color: color.map(String::from),
        }
    }

    #[test]
    fn test_color_validation() {
        assert!(tag("weekly", Some("#ff8800")).validate().is_ok());
        assert!(tag("weekly", Some("#F80")).validate().is_ok());
        assert!(tag("weekly", None).validate().is_ok());
        assert!(tag("weekly", Some("orange")).validate().is_err());
        assert!(tag("weekly", Some("#ff88001")).validate().is_err());
    }

    #[test]
    fn test_name_required() {
        assert!(tag("", None).validate().is_err());
    }
}
