/// Tag model: free-form labels attached to templates through `template_tags`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::pagination::PageParams;
use crate::transfer::{IdMap, TransferRecord};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,

    /// Unique label
    pub name: String,

    /// Display color, e.g. `#3366ff`
    pub color: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub color: Option<String>,
}

impl Tag {
    pub async fn create(pool: &PgPool, data: CreateTag) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, color)
            VALUES ($1, $2)
            RETURNING id, name, color, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.color)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT id, name, color, created_at FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: CreateTag,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags SET name = $2, color = $3
            WHERE id = $1
            RETURNING id, name, color, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.color)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &PgPool, params: &PageParams) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let pattern = params.search_pattern();

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, color, created_at FROM tags
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern.as_deref())
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE ($1::text IS NULL OR name ILIKE $1)")
                .bind(pattern.as_deref())
                .fetch_one(pool)
                .await?;

        Ok((tags, total))
    }

    /// Tags attached to a template, by name
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.color, t.created_at
            FROM tags t
            JOIN template_tags tt ON tt.tag_id = t.id
            WHERE tt.template_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(template_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(pool)
            .await
    }
}

#[async_trait]
impl TransferRecord for Tag {
    const TABLE: &'static str = "tags";
    const KEY: &'static str = "tags";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, _ids: &IdMap) {}

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO tags (id, name, color, created_at) VALUES ($1, $2, $3, $4)")
            .bind(self.id)
            .bind(&self.name)
            .bind(&self.color)
            .bind(self.created_at)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
