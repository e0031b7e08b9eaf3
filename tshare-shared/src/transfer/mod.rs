/// Bulk export and import of the whole database
///
/// The twelve tables are exported into one JSON envelope and restored in a
/// fixed dependency order so that every foreign key points at a row that is
/// already present:
///
/// users → scenes → tags → projects → templates → template versions →
/// template tags → usage → user variables → project variables → documents →
/// preferences
///
/// Clearing runs in the reverse order. An import either applies completely
/// or not at all: it runs in a single transaction and any failing row rolls
/// everything back.
///
/// # Example
///
/// ```no_run
/// use tshare_shared::transfer::{export_database, import_database, ImportOptions};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let envelope = export_database(&pool).await?;
/// let payload = serde_json::to_value(&envelope)?;
///
/// let report = import_database(&pool, &payload, ImportOptions {
///     clear_existing: true,
///     disable_foreign_keys: true,
///     preserve_ids: true,
/// }).await?;
/// println!("Imported {} rows", report.total());
/// # Ok(())
/// # }
/// ```

pub mod envelope;
pub mod export;
pub mod import;
pub mod record;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use envelope::{validate_envelope, ExportData, ExportEnvelope, EXPORT_VERSION};
pub use export::export_database;
pub use import::import_database;
pub use record::{IdMap, TransferRecord};

/// Envelope keys in dependency order
pub const TABLE_ORDER: [&str; 12] = [
    "users",
    "scenes",
    "tags",
    "projects",
    "templates",
    "templateVersions",
    "templateTags",
    "templateUsage",
    "userVariables",
    "projectVariables",
    "documents",
    "userPreferences",
];

/// Error type for export/import
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Payload shape is wrong; nothing was written
    #[error("Invalid export file: {}", .0.join("; "))]
    InvalidEnvelope(Vec<String>),

    /// Envelope version this server cannot read
    #[error("Unsupported export version {0}")]
    UnsupportedVersion(String),

    /// A row could not be decoded into its record type; nothing was written
    #[error("Invalid row {index} in {table}: {message}")]
    RowDecode {
        table: &'static str,
        index: usize,
        message: String,
    },

    /// A row failed to insert; the whole import was rolled back
    #[error("Failed to import row {index} of {table}: {source}")]
    RowInsert {
        table: &'static str,
        index: usize,
        #[source]
        source: sqlx::Error,
    },

    /// Database error outside of a specific row
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Import switches, passed as query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Delete all existing rows first
    #[serde(default)]
    pub clear_existing: bool,

    /// Defer foreign key checks to commit time
    #[serde(default)]
    pub disable_foreign_keys: bool,

    /// Keep exported primary keys; when false every row gets a new id
    #[serde(default = "default_preserve_ids")]
    pub preserve_ids: bool,
}

fn default_preserve_ids() -> bool {
    true
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            clear_existing: false,
            disable_foreign_keys: false,
            preserve_ids: true,
        }
    }
}

/// Rows inserted per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub users: usize,
    pub scenes: usize,
    pub tags: usize,
    pub projects: usize,
    pub templates: usize,
    pub template_versions: usize,
    pub template_tags: usize,
    pub template_usage: usize,
    pub user_variables: usize,
    pub project_variables: usize,
    pub documents: usize,
    pub user_preferences: usize,
}

impl TableCounts {
    pub fn total(&self) -> usize {
        self.users
            + self.scenes
            + self.tags
            + self.projects
            + self.templates
            + self.template_versions
            + self.template_tags
            + self.template_usage
            + self.user_variables
            + self.project_variables
            + self.documents
            + self.user_preferences
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub inserted: TableCounts,
    pub options: ImportOptions,
    pub imported_at: DateTime<Utc>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.inserted.total()
    }
}

/// Japan Standard Time offset used in export file names
const JST_OFFSET_HOURS: i64 = 9;

/// Download name for an export taken at `at`
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tshare_shared::transfer::export_filename;
///
/// let at = Utc.with_ymd_and_hms(2025, 3, 31, 16, 5, 9).unwrap();
/// assert_eq!(export_filename(at), "t-share-export-20250401-010509.json");
/// ```
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!(
        "t-share-export-{}.json",
        (at.naive_utc() + Duration::hours(JST_OFFSET_HOURS)).format("%Y%m%d-%H%M%S")
    )
}
