/// Project model
///
/// Projects are team-wide workspaces: every user can see them and attach
/// templates to them, while only the owner or an admin may edit or delete one.
/// Deleting a project removes its variables and documents and detaches its
/// templates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::pagination::PageParams;
use crate::transfer::{IdMap, TransferRecord};

const PROJECT_COLUMNS: &str = "id, name, description, owner_id, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
}

impl Project {
    pub async fn create(
        pool: &PgPool,
        data: ProjectInput,
        owner_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO projects (name, description, owner_id)
             VALUES ($1, $2, $3)
             RETURNING {PROJECT_COLUMNS}"
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(data.name)
            .bind(data.description)
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: ProjectInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE projects SET name = $2, description = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {PROJECT_COLUMNS}"
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(data.name)
            .bind(data.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists projects, most recently updated first
    ///
    /// `owner_id` narrows the list to one owner's projects.
    pub async fn list(
        pool: &PgPool,
        params: &PageParams,
        owner_id: Option<Uuid>,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        const FILTER: &str = "($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)
             AND ($2::uuid IS NULL OR owner_id = $2)";

        let pattern = params.search_pattern();

        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE {FILTER}
             ORDER BY updated_at DESC, id
             LIMIT $3 OFFSET $4"
        );
        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(pattern.as_deref())
            .bind(owner_id)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM projects WHERE {FILTER}"))
                .bind(pattern.as_deref())
                .bind(owner_id)
                .fetch_one(pool)
                .await?;

        Ok((projects, total))
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await
    }
}

#[async_trait]
impl TransferRecord for Project {
    const TABLE: &'static str = "projects";
    const KEY: &'static str = "projects";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("users", &mut self.owner_id);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, description, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.owner_id)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
