/// Auto-saved documents
///
/// Two singleton kinds live in one table:
///
/// - **Shared document**: one per project, editable by every user
/// - **Personal memo**: one per (project, user), private to its owner
///
/// The editor saves on a debounce timer. Saves are last-write-wins: the
/// newest `PUT` overwrites the content with no conflict detection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::transfer::{IdMap, TransferRecord};

const DOCUMENT_COLUMNS: &str =
    "id, kind, project_id, owner_id, content, updated_by, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ProjectShared,
    PersonalMemo,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub project_id: Uuid,

    /// Memo owner; `None` for the shared document
    pub owner_id: Option<Uuid>,

    pub content: String,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identifies one singleton document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSlot {
    Shared { project_id: Uuid },
    Memo { project_id: Uuid, owner_id: Uuid },
}

impl DocumentSlot {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentSlot::Shared { .. } => DocumentKind::ProjectShared,
            DocumentSlot::Memo { .. } => DocumentKind::PersonalMemo,
        }
    }

    pub fn project_id(&self) -> Uuid {
        match *self {
            DocumentSlot::Shared { project_id } | DocumentSlot::Memo { project_id, .. } => {
                project_id
            }
        }
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        match *self {
            DocumentSlot::Shared { .. } => None,
            DocumentSlot::Memo { owner_id, .. } => Some(owner_id),
        }
    }

    /// `ON CONFLICT` target matching the partial unique index for this kind
    fn conflict_target(&self) -> &'static str {
        match self {
            DocumentSlot::Shared { .. } => "(project_id) WHERE kind = 'project_shared'",
            DocumentSlot::Memo { .. } => "(project_id, owner_id) WHERE kind = 'personal_memo'",
        }
    }
}

impl Document {
    /// Returns the document, creating an empty one on first access
    pub async fn get_or_create(pool: &PgPool, slot: DocumentSlot) -> Result<Self, sqlx::Error> {
        let insert = format!(
            "INSERT INTO documents (kind, project_id, owner_id)
             VALUES ($1, $2, $3)
             ON CONFLICT {} DO NOTHING",
            slot.conflict_target()
        );

        sqlx::query(&insert)
            .bind(slot.kind())
            .bind(slot.project_id())
            .bind(slot.owner_id())
            .execute(pool)
            .await?;

        let select = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE kind = $1 AND project_id = $2 AND owner_id IS NOT DISTINCT FROM $3"
        );

        sqlx::query_as::<_, Document>(&select)
            .bind(slot.kind())
            .bind(slot.project_id())
            .bind(slot.owner_id())
            .fetch_one(pool)
            .await
    }

    /// Overwrites the content, creating the document if needed
    pub async fn save(
        pool: &PgPool,
        slot: DocumentSlot,
        content: &str,
        editor: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO documents (kind, project_id, owner_id, content, updated_by)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT {} DO UPDATE
             SET content = EXCLUDED.content,
                 updated_by = EXCLUDED.updated_by,
                 updated_at = NOW()
             RETURNING {DOCUMENT_COLUMNS}",
            slot.conflict_target()
        );

        sqlx::query_as::<_, Document>(&sql)
            .bind(slot.kind())
            .bind(slot.project_id())
            .bind(slot.owner_id())
            .bind(content)
            .bind(editor)
            .fetch_one(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await
    }
}

#[async_trait]
impl TransferRecord for Document {
    const TABLE: &'static str = "documents";
    const KEY: &'static str = "documents";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn remap_references(&mut self, ids: &IdMap) {
        ids.remap("projects", &mut self.project_id);
        ids.remap_opt("users", &mut self.owner_id);
        ids.remap_opt("users", &mut self.updated_by);
    }

    async fn insert_exact(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, kind, project_id, owner_id, content, updated_by,
                                   created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(self.id)
        .bind(self.kind)
        .bind(self.project_id)
        .bind(self.owner_id)
        .bind(&self.content)
        .bind(self.updated_by)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
