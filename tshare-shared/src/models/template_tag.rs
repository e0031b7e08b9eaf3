/// Template to tag links

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::transfer::{IdMap, TransferRecord};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TemplateTag {
    pub id: Uuid,
    pub template_id: Uuid,
    pub tag_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TemplateTag {
    /// Replaces the full tag set of a template
    ///
    /// Duplicate ids in `tag_ids` are ignored. Returns the number of links
    /// the template ends up with.
    pub async fn set_for_template(
        pool: &PgPool,
        template_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM template_tags WHERE template_id = $1")
            .bind(template_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO template_tags (template_id, tag_id)
            SELECT $1, tag_id FROM UNNEST($2::uuid[]) AS tag_id
            ON CONFLICT (template_id, tag_id) DO NOTHING
            "#,
        )
        .bind(template_id)
        .bind(tag_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TransferRecord for TemplateTag {
    const TABLE: &'static str = "template_tags";
    const KEY: &'static str = "templateTags";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("templates", &mut self.template_id);
        ids.remap("tags", &mut self.tag_id);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO template_tags (id, template_id, tag_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(self.id)
        .bind(self.template_id)
        .bind(self.tag_id)
        .bind(self.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
