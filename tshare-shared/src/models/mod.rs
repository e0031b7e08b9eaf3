/// Database models for Template Share
///
/// One module per table, each with its CRUD operations and its
/// [`TransferRecord`](crate::transfer::TransferRecord) implementation used by
/// the bulk export/import.
///
/// # Models
///
/// - `user`: Accounts, roles and approval status
/// - `scene`: Categories for grouping templates
/// - `tag`: Free-form labels attached to templates
/// - `project`: Team workspaces owning variables and documents
/// - `template`: Text templates with `{{variable}}` placeholders
/// - `template_version`: Immutable snapshots of template title/content
/// - `template_tag`: Template to tag links
/// - `template_usage`: One row per render
/// - `user_variable` / `project_variable`: Named substitution values
/// - `document`: Auto-saved shared documents and personal memos
/// - `user_preference`: Per-user settings
/// - `pagination`: Shared list/search parameters
///
/// # Example
///
/// ```no_run
/// use tshare_shared::models::tag::{Tag, CreateTag};
/// use tshare_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_env()?).await?;
///
/// let tag = Tag::create(&pool, CreateTag {
///     name: "minutes".to_string(),
///     color: Some("#3366ff".to_string()),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod document;
pub mod pagination;
pub mod project;
pub mod project_variable;
pub mod scene;
pub mod tag;
pub mod template;
pub mod template_tag;
pub mod template_usage;
pub mod template_version;
pub mod user;
pub mod user_preference;
pub mod user_variable;
