/// Reads every exported table into an [`ExportEnvelope`]

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use super::{ExportData, ExportEnvelope, TransferError, TransferRecord, EXPORT_VERSION};
use crate::models::{
    document::Document, project::Project, project_variable::ProjectVariable, scene::Scene,
    tag::Tag, template::Template, template_tag::TemplateTag, template_usage::TemplateUsage,
    template_version::TemplateVersion, user::User, user_preference::UserPreference,
    user_variable::UserVariable,
};

/// Snapshots the whole database
///
/// All tables are read inside one `REPEATABLE READ` read-only transaction so
/// the export is consistent even while other requests write.
pub async fn export_database(pool: &PgPool) -> Result<ExportEnvelope, TransferError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let data = ExportData {
        users: User::fetch_all(&mut tx).await?,
        scenes: Scene::fetch_all(&mut tx).await?,
        tags: Tag::fetch_all(&mut tx).await?,
        projects: Project::fetch_all(&mut tx).await?,
        templates: Template::fetch_all(&mut tx).await?,
        template_versions: TemplateVersion::fetch_all(&mut tx).await?,
        template_tags: TemplateTag::fetch_all(&mut tx).await?,
        template_usage: TemplateUsage::fetch_all(&mut tx).await?,
        user_variables: UserVariable::fetch_all(&mut tx).await?,
        project_variables: ProjectVariable::fetch_all(&mut tx).await?,
        documents: Document::fetch_all(&mut tx).await?,
        user_preferences: UserPreference::fetch_all(&mut tx).await?,
    };

    tx.commit().await?;

    let counts = data.counts();
    info!(rows = counts.total(), ?counts, "Database exported");

    Ok(ExportEnvelope {
        exported_at: Utc::now(),
        version: EXPORT_VERSION.to_string(),
        data,
    })
}
