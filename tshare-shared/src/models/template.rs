/// Template model and database operations
///
/// A template is a block of text with `{{variable}}` placeholders. Creating a
/// template writes version 1 to `template_versions`; any later change of title
/// or content appends the next version and bumps `current_version` in the same
/// transaction.
///
/// # Visibility
///
/// Non-admin users see public templates, templates they created and
/// templates attached to a project. Admins see everything.
///
/// # Example
///
/// ```no_run
/// use tshare_shared::models::template::{Template, TemplateInput};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, author: Uuid) -> Result<(), sqlx::Error> {
/// let template = Template::create(&pool, TemplateInput {
///     title: "Weekly report".to_string(),
///     description: None,
///     content: "Report for {{week}} by {{name}}".to_string(),
///     scene_id: None,
///     project_id: None,
///     is_public: true,
/// }, author).await?;
/// assert_eq!(template.current_version, 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::pagination::PageParams;
use super::template_version::TemplateVersion;
use crate::transfer::{IdMap, TransferRecord};

const TEMPLATE_COLUMNS: &str = "id, title, description, content, scene_id, project_id, \
     created_by, is_public, current_version, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,

    /// Body with `{{variable}}` placeholders
    pub content: String,

    pub scene_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub is_public: bool,

    /// Highest `template_versions.version_number` for this template
    pub current_version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateInput {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub scene_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub is_public: bool,
}

/// List filters; all optional and combined with AND
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TemplateFilter {
    pub scene_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
}

impl Template {
    /// Whether `user_id` may read this template
    pub fn is_visible_to(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.is_public || self.created_by == Some(user_id) || self.project_id.is_some()
    }

    /// Creates a template and its version 1 snapshot
    pub async fn create(
        pool: &PgPool,
        data: TemplateInput,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let sql = format!(
            "INSERT INTO templates (title, description, content, scene_id, project_id,
                                    created_by, is_public, current_version)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
             RETURNING {TEMPLATE_COLUMNS}"
        );

        let template = sqlx::query_as::<_, Template>(&sql)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.content)
            .bind(data.scene_id)
            .bind(data.project_id)
            .bind(created_by)
            .bind(data.is_public)
            .fetch_one(&mut *tx)
            .await?;

        TemplateVersion::record(
            &mut tx,
            template.id,
            1,
            &template.title,
            &template.content,
            created_by,
        )
        .await?;

        tx.commit().await?;

        Ok(template)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1");

        sqlx::query_as::<_, Template>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, Template>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Replaces every editable field
    ///
    /// A new version is recorded only when title or content actually change.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: TemplateInput,
        editor: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(current) = Self::lock(&mut tx, id).await? else {
            return Ok(None);
        };

        let changed = current.title != data.title || current.content != data.content;
        let version = if changed {
            current.current_version + 1
        } else {
            current.current_version
        };

        let sql = format!(
            "UPDATE templates
             SET title = $2, description = $3, content = $4, scene_id = $5,
                 project_id = $6, is_public = $7, current_version = $8, updated_at = NOW()
             WHERE id = $1
             RETURNING {TEMPLATE_COLUMNS}"
        );

        let template = sqlx::query_as::<_, Template>(&sql)
            .bind(id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.content)
            .bind(data.scene_id)
            .bind(data.project_id)
            .bind(data.is_public)
            .bind(version)
            .fetch_one(&mut *tx)
            .await?;

        if changed {
            TemplateVersion::record(&mut tx, id, version, &data.title, &data.content, editor)
                .await?;
        }

        tx.commit().await?;

        Ok(Some(template))
    }

    /// Copies a stored version back as the newest version
    ///
    /// Returns `None` when the template or the requested version does not exist.
    pub async fn restore_version(
        pool: &PgPool,
        id: Uuid,
        version_number: i32,
        editor: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(current) = Self::lock(&mut tx, id).await? else {
            return Ok(None);
        };
        let Some(source) = TemplateVersion::find(&mut tx, id, version_number).await? else {
            return Ok(None);
        };

        let version = current.current_version + 1;

        let sql = format!(
            "UPDATE templates
             SET title = $2, content = $3, current_version = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {TEMPLATE_COLUMNS}"
        );

        let template = sqlx::query_as::<_, Template>(&sql)
            .bind(id)
            .bind(&source.title)
            .bind(&source.content)
            .bind(version)
            .fetch_one(&mut *tx)
            .await?;

        TemplateVersion::record(&mut tx, id, version, &source.title, &source.content, editor)
            .await?;

        tx.commit().await?;

        Ok(Some(template))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists templates visible to `viewer`, most recently updated first
    ///
    /// `viewer` is `None` for admins, who see every template.
    pub async fn list(
        pool: &PgPool,
        params: &PageParams,
        filter: TemplateFilter,
        viewer: Option<Uuid>,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        const FILTER: &str = "($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1 OR content ILIKE $1)
             AND ($2::uuid IS NULL OR scene_id = $2)
             AND ($3::uuid IS NULL OR project_id = $3)
             AND ($4::uuid IS NULL OR EXISTS (
                 SELECT 1 FROM template_tags tt
                 WHERE tt.template_id = templates.id AND tt.tag_id = $4))
             AND ($5::uuid IS NULL OR is_public OR created_by = $5 OR project_id IS NOT NULL)";

        let pattern = params.search_pattern();

        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE {FILTER}
             ORDER BY updated_at DESC, id
             LIMIT $6 OFFSET $7"
        );
        let templates = sqlx::query_as::<_, Template>(&sql)
            .bind(pattern.as_deref())
            .bind(filter.scene_id)
            .bind(filter.project_id)
            .bind(filter.tag_id)
            .bind(viewer)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM templates WHERE {FILTER}"))
                .bind(pattern.as_deref())
                .bind(filter.scene_id)
                .bind(filter.project_id)
                .bind(filter.tag_id)
                .bind(viewer)
                .fetch_one(pool)
                .await?;

        Ok((templates, total))
    }

    /// Most recently updated templates
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates ORDER BY updated_at DESC, id LIMIT $1"
        );

        sqlx::query_as::<_, Template>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM templates")
            .fetch_one(pool)
            .await
    }
}

#[async_trait]
impl TransferRecord for Template {
    const TABLE: &'static str = "templates";
    const KEY: &'static str = "templates";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap_opt("scenes", &mut self.scene_id);
        ids.remap_opt("projects", &mut self.project_id);
        ids.remap_opt("users", &mut self.created_by);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, title, description, content, scene_id, project_id,
                                   created_by, is_public, current_version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.content)
        .bind(self.scene_id)
        .bind(self.project_id)
        .bind(self.created_by)
        .bind(self.is_public)
        .bind(self.current_version)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(created_by: Option<Uuid>, project_id: Option<Uuid>, is_public: bool) -> Template {
        Template {
            id: Uuid::new_v4(),
            title: "Minutes".to_string(),
            description: None,
            content: "{{date}}".to_string(),
            scene_id: None,
            project_id,
            created_by,
            is_public,
            current_version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_visibility() {
        let me = Uuid::new_v4();
        let someone = Uuid::new_v4();

        assert!(template(Some(someone), None, true).is_visible_to(me, false));
        assert!(template(Some(me), None, false).is_visible_to(me, false));
        assert!(template(Some(someone), Some(Uuid::new_v4()), false).is_visible_to(me, false));
        assert!(!template(Some(someone), None, false).is_visible_to(me, false));
        assert!(!template(None, None, false).is_visible_to(me, false));
        assert!(template(Some(someone), None, false).is_visible_to(me, true));
    }
}
