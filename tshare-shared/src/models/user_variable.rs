/// Per-user substitution variables
///
/// Lowest precedence when rendering: project variables and request values
/// override them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::pagination::PageParams;
use crate::transfer::{IdMap, TransferRecord};

const COLUMNS: &str = "id, user_id, name, value, description, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserVariable {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Placeholder name, unique per user
    pub name: String,

    pub value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a variable, shared with project variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInput {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
}

impl UserVariable {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        data: VariableInput,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO user_variables (user_id, name, value, description)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, UserVariable>(&sql)
            .bind(user_id)
            .bind(data.name)
            .bind(data.value)
            .bind(data.description)
            .fetch_one(pool)
            .await
    }

    /// Replaces a variable owned by `user_id`
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: VariableInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE user_variables
             SET name = $3, value = $4, description = $5, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, UserVariable>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(data.name)
            .bind(data.value)
            .bind(data.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_variables WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        params: &PageParams,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        const FILTER: &str = "user_id = $1
             AND ($2::text IS NULL OR name ILIKE $2 OR value ILIKE $2 OR description ILIKE $2)";

        let pattern = params.search_pattern();

        let sql = format!(
            "SELECT {COLUMNS} FROM user_variables WHERE {FILTER}
             ORDER BY name
             LIMIT $3 OFFSET $4"
        );
        let variables = sqlx::query_as::<_, UserVariable>(&sql)
            .bind(user_id)
            .bind(pattern.as_deref())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM user_variables WHERE {FILTER}"))
                .bind(user_id)
                .bind(pattern.as_deref())
                .fetch_one(pool)
                .await?;

        Ok((variables, total))
    }

    /// All of a user's variables as a name to value map
    pub async fn as_map(pool: &PgPool, user_id: Uuid) -> Result<HashMap<String, String>, sqlx::Error> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, value FROM user_variables WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl TransferRecord for UserVariable {
    const TABLE: &'static str = "user_variables";
    const KEY: &'static str = "userVariables";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("users", &mut self.user_id);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_variables (id, user_id, name, value, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.user_id)
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
