/// Restores an export envelope into the database

use chrono::Utc;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    validate_envelope, ExportData, IdMap, ImportOptions, ImportReport, TableCounts,
    TransferError, TransferRecord,
};
use crate::models::{
    document::Document, project::Project, project_variable::ProjectVariable, scene::Scene,
    tag::Tag, template::Template, template_tag::TemplateTag, template_usage::TemplateUsage,
    template_version::TemplateVersion, user::User, user_preference::UserPreference,
    user_variable::UserVariable,
};

/// SQL tables in reverse dependency order
const CLEAR_ORDER: [&str; 12] = [
    UserPreference::TABLE,
    Document::TABLE,
    ProjectVariable::TABLE,
    UserVariable::TABLE,
    TemplateUsage::TABLE,
    TemplateTag::TABLE,
    TemplateVersion::TABLE,
    Template::TABLE,
    Project::TABLE,
    Tag::TABLE,
    Scene::TABLE,
    User::TABLE,
];

/// Imports an export envelope
///
/// The payload is validated and fully decoded before the transaction starts,
/// so a malformed file never writes anything. Inside the transaction:
///
/// 1. `disable_foreign_keys` defers every constraint check to commit
/// 2. `clear_existing` deletes all rows, children first
/// 3. rows are inserted parents first; with `preserve_ids = false` each row
///    gets a fresh id and references to re-keyed rows are rewritten
///
/// Any failing row rolls the whole import back and is reported with its
/// table and zero-based index.
pub async fn import_database(
    pool: &PgPool,
    payload: &Value,
    options: ImportOptions,
) -> Result<ImportReport, TransferError> {
    let data = validate_envelope(payload)?;
    let mut data = ExportData::decode(data)?;

    debug!(rows = data.counts().total(), ?options, "Import payload decoded");

    let mut tx = pool.begin().await?;

    if options.disable_foreign_keys {
        sqlx::query("SET CONSTRAINTS ALL DEFERRED")
            .execute(&mut *tx)
            .await?;
    }

    if options.clear_existing {
        for table in CLEAR_ORDER {
            let result = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
            debug!(table, deleted = result.rows_affected(), "Cleared table");
        }
    }

    let mut ids = IdMap::new();
    let keep = options.preserve_ids;

    let inserted = TableCounts {
        users: restore_table(&mut tx, &mut data.users, keep, &mut ids).await?,
        scenes: restore_table(&mut tx, &mut data.scenes, keep, &mut ids).await?,
        tags: restore_table(&mut tx, &mut data.tags, keep, &mut ids).await?,
        projects: restore_table(&mut tx, &mut data.projects, keep, &mut ids).await?,
        templates: restore_table(&mut tx, &mut data.templates, keep, &mut ids).await?,
        template_versions: restore_table(&mut tx, &mut data.template_versions, keep, &mut ids)
            .await?,
        template_tags: restore_table(&mut tx, &mut data.template_tags, keep, &mut ids).await?,
        template_usage: restore_table(&mut tx, &mut data.template_usage, keep, &mut ids).await?,
        user_variables: restore_table(&mut tx, &mut data.user_variables, keep, &mut ids).await?,
        project_variables: restore_table(&mut tx, &mut data.project_variables, keep, &mut ids)
            .await?,
        documents: restore_table(&mut tx, &mut data.documents, keep, &mut ids).await?,
        user_preferences: restore_table(&mut tx, &mut data.user_preferences, keep, &mut ids)
            .await?,
    };

    // Deferred foreign keys are checked here
    tx.commit().await.map_err(|e| {
        warn!(error = %e, "Import rejected at commit");
        TransferError::Database(e)
    })?;

    let report = ImportReport {
        inserted,
        options,
        imported_at: Utc::now(),
    };

    info!(
        rows = report.total(),
        clear_existing = options.clear_existing,
        disable_foreign_keys = options.disable_foreign_keys,
        preserve_ids = options.preserve_ids,
        "Database imported"
    );

    Ok(report)
}

/// Inserts one table's rows, re-keying them first when ids are not preserved
async fn restore_table<T: TransferRecord>(
    conn: &mut PgConnection,
    rows: &mut [T],
    preserve_ids: bool,
    ids: &mut IdMap,
) -> Result<usize, TransferError> {
    for (index, row) in rows.iter_mut().enumerate() {
        if !preserve_ids {
            let new_id = Uuid::new_v4();
            ids.insert(T::TABLE, row.id(), new_id);
            row.set_id(new_id);
            row.remap_references(ids);
        }

        row.insert_exact(&mut *conn)
            .await
            .map_err(|source| TransferError::RowInsert {
                table: T::TABLE,
                index,
                source,
            })?;
    }

    Ok(rows.len())
}
