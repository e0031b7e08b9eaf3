/// Export file format
///
/// ```json
/// {
///   "exportedAt": "2025-04-01T01:05:09Z",
///   "version": "1.0",
///   "data": { "users": [...], "scenes": [...], ..., "userPreferences": [...] }
/// }
/// ```
///
/// Rows use the column names of their table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{TableCounts, TransferError, TransferRecord, TABLE_ORDER};
use crate::models::{
    document::Document, project::Project, project_variable::ProjectVariable, scene::Scene,
    tag::Tag, template::Template, template_tag::TemplateTag, template_usage::TemplateUsage,
    template_version::TemplateVersion, user::User, user_preference::UserPreference,
    user_variable::UserVariable,
};

/// Version written into new exports
pub const EXPORT_VERSION: &str = "1.0";

/// Major version this server can import
const SUPPORTED_MAJOR: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub exported_at: DateTime<Utc>,
    pub version: String,
    pub data: ExportData,
}

/// All rows of every exported table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub users: Vec<User>,
    pub scenes: Vec<Scene>,
    pub tags: Vec<Tag>,
    pub projects: Vec<Project>,
    pub templates: Vec<Template>,
    pub template_versions: Vec<TemplateVersion>,
    pub template_tags: Vec<TemplateTag>,
    pub template_usage: Vec<TemplateUsage>,
    pub user_variables: Vec<UserVariable>,
    pub project_variables: Vec<ProjectVariable>,
    pub documents: Vec<Document>,
    pub user_preferences: Vec<UserPreference>,
}

impl ExportData {
    /// Decodes a validated `data` object table by table
    ///
    /// A row that does not fit its record type is reported with its table
    /// and zero-based index.
    pub fn decode(data: &Map<String, Value>) -> Result<Self, TransferError> {
        Ok(Self {
            users: decode_table(data)?,
            scenes: decode_table(data)?,
            tags: decode_table(data)?,
            projects: decode_table(data)?,
            templates: decode_table(data)?,
            template_versions: decode_table(data)?,
            template_tags: decode_table(data)?,
            template_usage: decode_table(data)?,
            user_variables: decode_table(data)?,
            project_variables: decode_table(data)?,
            documents: decode_table(data)?,
            user_preferences: decode_table(data)?,
        })
    }

    /// Number of rows per table
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            users: self.users.len(),
            scenes: self.scenes.len(),
            tags: self.tags.len(),
            projects: self.projects.len(),
            templates: self.templates.len(),
            template_versions: self.template_versions.len(),
            template_tags: self.template_tags.len(),
            template_usage: self.template_usage.len(),
            user_variables: self.user_variables.len(),
            project_variables: self.project_variables.len(),
            documents: self.documents.len(),
            user_preferences: self.user_preferences.len(),
        }
    }
}

fn decode_table<T: TransferRecord>(data: &Map<String, Value>) -> Result<Vec<T>, TransferError> {
    let rows = data
        .get(T::KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| TransferError::InvalidEnvelope(vec![format!("data.{} is missing", T::KEY)]))?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            T::deserialize(row).map_err(|e| TransferError::RowDecode {
                table: T::TABLE,
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Checks the envelope shape without touching the database
///
/// Reports every problem at once: a missing `version`, a missing `data`
/// object, and each of the twelve tables that is absent or not an array.
pub fn validate_envelope(payload: &Value) -> Result<&Map<String, Value>, TransferError> {
    let Some(root) = payload.as_object() else {
        return Err(TransferError::InvalidEnvelope(vec![
            "export file must be a JSON object".to_string(),
        ]));
    };

    let mut problems = Vec::new();

    match root.get("version") {
        Some(Value::String(version)) => {
            let major = version.split('.').next().unwrap_or_default();
            if major != SUPPORTED_MAJOR {
                return Err(TransferError::UnsupportedVersion(version.clone()));
            }
        }
        Some(_) => problems.push("version must be a string".to_string()),
        None => problems.push("version is missing".to_string()),
    }

    let data = match root.get("data") {
        Some(Value::Object(data)) => Some(data),
        Some(_) => {
            problems.push("data must be an object".to_string());
            None
        }
        None => {
            problems.push("data is missing".to_string());
            None
        }
    };

    if let Some(data) = data {
        for key in TABLE_ORDER {
            match data.get(key) {
                Some(Value::Array(_)) => {}
                Some(_) => problems.push(format!("data.{key} must be an array")),
                None => problems.push(format!("data.{key} is missing")),
            }
        }
    }

    match data {
        Some(data) if problems.is_empty() => Ok(data),
        _ => Err(TransferError::InvalidEnvelope(problems)),
    }
}
