/// Template version history
///
/// Every change to a template's title or content is snapshotted as a new row
/// with the next `version_number`; rows are never updated afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::transfer::{IdMap, TransferRecord};

const VERSION_COLUMNS: &str =
    "id, template_id, version_number, title, content, created_by, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TemplateVersion {
    pub id: Uuid,
    pub template_id: Uuid,

    /// 1-based, unique per template
    pub version_number: i32,

    pub title: String,
    pub content: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TemplateVersion {
    /// Appends a snapshot inside the caller's transaction
    pub async fn record(
        conn: &mut PgConnection,
        template_id: Uuid,
        version_number: i32,
        title: &str,
        content: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO template_versions (template_id, version_number, title, content, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {VERSION_COLUMNS}"
        );

        sqlx::query_as::<_, TemplateVersion>(&sql)
            .bind(template_id)
            .bind(version_number)
            .bind(title)
            .bind(content)
            .bind(created_by)
            .fetch_one(&mut *conn)
            .await
    }

    /// All versions of a template, newest first
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM template_versions
             WHERE template_id = $1
             ORDER BY version_number DESC"
        );

        sqlx::query_as::<_, TemplateVersion>(&sql)
            .bind(template_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find(
        conn: &mut PgConnection,
        template_id: Uuid,
        version_number: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM template_versions
             WHERE template_id = $1 AND version_number = $2"
        );

        sqlx::query_as::<_, TemplateVersion>(&sql)
            .bind(template_id)
            .bind(version_number)
            .fetch_optional(&mut *conn)
            .await
    }
}

#[async_trait]
impl TransferRecord for TemplateVersion {
    const TABLE: &'static str = "template_versions";
    const KEY: &'static str = "templateVersions";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("templates", &mut self.template_id);
        ids.remap_opt("users", &mut self.created_by);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO template_versions (id, template_id, version_number, title, content,
                                           created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.template_id)
        .bind(self.version_number)
        .bind(&self.title)
        .bind(&self.content)
        .bind(self.created_by)
        .bind(self.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
