/// Scene model: named categories ("meeting minutes", "daily report") that
/// group templates
///
/// Scenes are shared by everyone; only admins change them. Deleting a scene
/// keeps its templates and clears their `scene_id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::pagination::PageParams;
use crate::transfer::{IdMap, TransferRecord};

const SCENE_COLUMNS: &str = "id, name, description, sort_order, created_by, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Scene {
    pub id: Uuid,

    /// Unique display name
    pub name: String,

    pub description: Option<String>,

    /// Ascending display order
    pub sort_order: i32,

    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneInput {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

impl Scene {
    pub async fn create(
        pool: &PgPool,
        data: SceneInput,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO scenes (name, description, sort_order, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {SCENE_COLUMNS}"
        );

        sqlx::query_as::<_, Scene>(&sql)
            .bind(data.name)
            .bind(data.description)
            .bind(data.sort_order)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {SCENE_COLUMNS} FROM scenes WHERE id = $1");

        sqlx::query_as::<_, Scene>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replaces name, description and sort order
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: SceneInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE scenes
             SET name = $2, description = $3, sort_order = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {SCENE_COLUMNS}"
        );

        sqlx::query_as::<_, Scene>(&sql)
            .bind(id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.sort_order)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scenes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists scenes in display order, filtered by name/description
    pub async fn list(pool: &PgPool, params: &PageParams) -> Result<(Vec<Self>, i64), sqlx::Error> {
        const FILTER: &str = "($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)";

        let pattern = params.search_pattern();

        let sql = format!(
            "SELECT {SCENE_COLUMNS} FROM scenes WHERE {FILTER}
             ORDER BY sort_order, name
             LIMIT $2 OFFSET $3"
        );
        let scenes = sqlx::query_as::<_, Scene>(&sql)
            .bind(pattern.as_deref())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM scenes WHERE {FILTER}"))
            .bind(pattern.as_deref())
            .fetch_one(pool)
            .await?;

        Ok((scenes, total))
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM scenes")
            .fetch_one(pool)
            .await
    }
}

#[async_trait]
impl TransferRecord for Scene {
    const TABLE: &'static str = "scenes";
    const KEY: &'static str = "scenes";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap_opt("users", &mut self.created_by);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO scenes (id, name, description, sort_order, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.sort_order)
        .bind(self.created_by)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
