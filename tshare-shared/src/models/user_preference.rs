/// Per-user settings
///
/// A user without a row gets [`UserPreference::defaults`]; the first `PUT`
/// creates the row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::transfer::{IdMap, TransferRecord};

const COLUMNS: &str = "id, user_id, theme, locale, default_scene_id, default_project_id, \
     settings, created_at, updated_at";

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_LOCALE: &str = "ja";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPreference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub theme: String,
    pub locale: String,
    pub default_scene_id: Option<Uuid>,
    pub default_project_id: Option<Uuid>,

    /// Free-form client settings
    pub settings: serde_json::Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceInput {
    pub theme: String,
    pub locale: String,
    pub default_scene_id: Option<Uuid>,
    pub default_project_id: Option<Uuid>,
    pub settings: serde_json::Value,
}

impl UserPreference {
    /// Unsaved defaults for a user with no stored preferences
    pub fn defaults(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            user_id,
            theme: DEFAULT_THEME.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            default_scene_id: None,
            default_project_id: None,
            settings: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn find_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM user_preferences WHERE user_id = $1");

        sqlx::query_as::<_, UserPreference>(&sql)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Creates or replaces the user's preferences
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        data: PreferenceInput,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO user_preferences (user_id, theme, locale, default_scene_id,
                                           default_project_id, settings)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id) DO UPDATE
             SET theme = EXCLUDED.theme,
                 locale = EXCLUDED.locale,
                 default_scene_id = EXCLUDED.default_scene_id,
                 default_project_id = EXCLUDED.default_project_id,
                 settings = EXCLUDED.settings,
                 updated_at = NOW()
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, UserPreference>(&sql)
            .bind(user_id)
            .bind(data.theme)
            .bind(data.locale)
            .bind(data.default_scene_id)
            .bind(data.default_project_id)
            .bind(data.settings)
            .fetch_one(pool)
            .await
    }
}

#[async_trait]
impl TransferRecord for UserPreference {
    const TABLE: &'static str = "user_preferences";
    const KEY: &'static str = "userPreferences";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("users", &mut self.user_id);
        ids.remap_opt("scenes", &mut self.default_scene_id);
        ids.remap_opt("projects", &mut self.default_project_id);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (id, user_id, theme, locale, default_scene_id,
                                          default_project_id, settings, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.theme)
        .bind(&self.locale)
        .bind(self.default_scene_id)
        .bind(self.default_project_id)
        .bind(&self.settings)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
