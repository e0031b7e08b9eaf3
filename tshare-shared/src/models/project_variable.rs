/// Per-project substitution variables
///
/// Override user variables of the same name when a template is rendered in
/// the context of the project.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::pagination::PageParams;
use super::user_variable::VariableInput;
use crate::transfer::{IdMap, TransferRecord};

const COLUMNS: &str = "id, project_id, name, value, description, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectVariable {
    pub id: Uuid,
    pub project_id: Uuid,

    /// Placeholder name, unique per project
    pub name: String,

    pub value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectVariable {
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        data: VariableInput,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO project_variables (project_id, name, value, description)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, ProjectVariable>(&sql)
            .bind(project_id)
            .bind(data.name)
            .bind(data.value)
            .bind(data.description)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        project_id: Uuid,
        id: Uuid,
        data: VariableInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE project_variables
             SET name = $3, value = $4, description = $5, updated_at = NOW()
             WHERE id = $1 AND project_id = $2
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, ProjectVariable>(&sql)
            .bind(id)
            .bind(project_id)
            .bind(data.name)
            .bind(data.value)
            .bind(data.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, project_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_variables WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        project_id: Uuid,
        params: &PageParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        const FILTER: &str = "project_id = $1
             AND ($2::text IS NULL OR name ILIKE $2 OR value ILIKE $2 OR description ILIKE $2)";

        let pattern = params.search_pattern();

        let sql = format!(
            "SELECT {COLUMNS} FROM project_variables WHERE {FILTER}
             ORDER BY name
             LIMIT $3 OFFSET $4"
        );
        let variables = sqlx::query_as::<_, ProjectVariable>(&sql)
            .bind(project_id)
            .bind(pattern.as_deref())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM project_variables WHERE {FILTER}"))
                .bind(project_id)
                .bind(pattern.as_deref())
                .fetch_one(pool)
                .await?;

        Ok((variables, total))
    }

    pub async fn as_map(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<HashMap<String, String>, sqlx::Error> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, value FROM project_variables WHERE project_id = $1")
                .bind(project_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl TransferRecord for ProjectVariable {
    const TABLE: &'static str = "project_variables";
    const KEY: &'static str = "projectVariables";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("projects", &mut self.project_id);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO project_variables (id, project_id, name, value, description,
                                           created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.project_id)
        .bind(&self.name)
        .bind(&self.value)
        .bind(&self.description)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
