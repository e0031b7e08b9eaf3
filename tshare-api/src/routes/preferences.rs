/// Per-user preferences
///
/// - `GET /api/preferences` - Stored preferences, or defaults when none exist
/// - `PUT /api/preferences` - Create or replace

use crate::{app::AppState, error::ApiResult, extract::ValidatedJson};
use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use tshare_shared::{
    auth::middleware::AuthContext,
    models::user_preference::{PreferenceInput, UserPreference, DEFAULT_LOCALE, DEFAULT_THEME},
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

const THEMES: [&str; 3] = ["light", "dark", "system"];

#[derive(Debug, Deserialize, Validate)]
pub struct PreferenceRequest {
    #[serde(default = "default_theme")]
    #[validate(custom(function = "known_theme"))]
    pub theme: String,

    #[serde(default = "default_locale")]
    #[validate(length(min = 2, max = 10, message = "Locale must be 2-10 characters"))]
    pub locale: String,

    pub default_scene_id: Option<Uuid>,
    pub default_project_id: Option<Uuid>,

    /// Free-form client settings; must be a JSON object
    #[serde(default = "empty_object")]
    #[validate(custom(function = "json_object"))]
    pub settings: serde_json::Value,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

fn known_theme(theme: &str) -> Result<(), ValidationError> {
    if THEMES.contains(&theme) {
        Ok(())
    } else {
        Err(ValidationError::new("theme").with_message("Theme must be light, dark or system".into()))
    }
}

fn json_object(settings: &serde_json::Value) -> Result<(), ValidationError> {
    if settings.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("settings").with_message("Settings must be a JSON object".into()))
    }
}

impl From<PreferenceRequest> for PreferenceInput {
    fn from(req: PreferenceRequest) -> Self {
        PreferenceInput {
            theme: req.theme,
            locale: req.locale,
            default_scene_id: req.default_scene_id,
            default_project_id: req.default_project_id,
            settings: req.settings,
        }
    }
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserPreference>> {
    let prefs = UserPreference::find_for_user(&state.db, auth.user_id)
        .await?
        .unwrap_or_else(|| UserPreference::defaults(auth.user_id));
    Ok(Json(prefs))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<PreferenceRequest>,
) -> ApiResult<Json<UserPreference>> {
    Ok(Json(
        UserPreference::upsert(&state.db, auth.user_id, req.into()).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let req: PreferenceRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.theme, DEFAULT_THEME);
        assert_eq!(req.locale, DEFAULT_LOCALE);
        assert!(req.settings.is_object());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_theme_and_non_object_settings() {
        let req: PreferenceRequest =
            serde_json::from_str(r#"{"theme":"neon","settings":[1,2]}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("theme"));
        assert!(fields.contains_key("settings"));
    }
}
