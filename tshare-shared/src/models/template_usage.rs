/// Template usage log
///
/// One row is appended every time a template is rendered. The dashboard
/// aggregates these rows; nothing else reads them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::transfer::{IdMap, TransferRecord};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TemplateUsage {
    pub id: Uuid,
    pub template_id: Uuid,
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub used_at: DateTime<Utc>,
}

/// Usage count of one template
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TemplateUsageCount {
    pub template_id: Uuid,
    pub title: String,
    pub uses: i64,
}

/// Number of renders on one UTC day
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyUsage {
    pub day: NaiveDate,
    pub uses: i64,
}

impl TemplateUsage {
    pub async fn record(
        pool: &PgPool,
        template_id: Uuid,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TemplateUsage>(
            r#"
            INSERT INTO template_usage (template_id, user_id, project_id)
            VALUES ($1, $2, $3)
            RETURNING id, template_id, user_id, project_id, used_at
            "#,
        )
        .bind(template_id)
        .bind(user_id)
        .bind(project_id)
        .fetch_one(pool)
        .await
    }

    /// Most used templates, highest count first
    pub async fn top_templates(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<TemplateUsageCount>, sqlx::Error> {
        sqlx::query_as::<_, TemplateUsageCount>(
            r#"
            SELECT u.template_id, t.title, COUNT(*) AS uses
            FROM template_usage u
            JOIN templates t ON t.id = u.template_id
            GROUP BY u.template_id, t.title
            ORDER BY uses DESC, t.title
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Renders per day over the last `days` days, oldest first
    ///
    /// Days without any usage are omitted.
    pub async fn daily_counts(pool: &PgPool, days: i32) -> Result<Vec<DailyUsage>, sqlx::Error> {
        sqlx::query_as::<_, DailyUsage>(
            r#"
            SELECT (used_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS uses
            FROM template_usage
            WHERE used_at >= NOW() - make_interval(days => $1)
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(days)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM template_usage")
            .fetch_one(pool)
            .await
    }
}

#[async_trait]
impl TransferRecord for TemplateUsage {
    const TABLE: &'static str = "template_usage";
    const KEY: &'static str = "templateUsage";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("templates", &mut self.template_id);
        ids.remap_opt("users", &mut self.user_id);
        ids.remap_opt("projects", &mut self.project_id);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO template_usage (id, template_id, user_id, project_id, used_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(self.id)
        .bind(self.template_id)
        .bind(self.user_id)
        .bind(self.project_id)
        .bind(self.used_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
