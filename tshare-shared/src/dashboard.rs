/// Admin dashboard aggregation
///
/// Read-only summary queries; nothing here writes.

use serde::Serialize;
use sqlx::PgPool;

use crate::models::{
    document::Document,
    project::Project,
    scene::Scene,
    tag::Tag,
    template::Template,
    template_usage::{DailyUsage, TemplateUsage, TemplateUsageCount},
    user::{User, UserStatus},
};

/// Number of templates in the top-used list
pub const TOP_TEMPLATES: i64 = 10;

/// Number of templates in the recently-updated list
pub const RECENT_TEMPLATES: i64 = 10;

/// Days covered by the usage chart
pub const USAGE_DAYS: i32 = 30;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityCounts {
    pub users: i64,
    pub scenes: i64,
    pub tags: i64,
    pub projects: i64,
    pub templates: i64,
    pub documents: i64,
    pub template_uses: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UsersByStatus {
    pub pending: i64,
    pub active: i64,
    pub suspended: i64,
}

impl UsersByStatus {
    fn from_rows(rows: &[(UserStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, n) in rows {
            match status {
                UserStatus::Pending => counts.pending = *n,
                UserStatus::Active => counts.active = *n,
                UserStatus::Suspended => counts.suspended = *n,
            }
        }
        counts
    }
}

/// Recently updated template, without its content
#[derive(Debug, Clone, Serialize)]
pub struct RecentTemplate {
    pub id: uuid::Uuid,
    pub title: String,
    pub current_version: i32,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub counts: EntityCounts,
    pub users_by_status: UsersByStatus,
    pub top_templates: Vec<TemplateUsageCount>,
    pub daily_usage: Vec<DailyUsage>,
    pub recent_templates: Vec<RecentTemplate>,
}

impl DashboardStats {
    pub async fn collect(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let counts = EntityCounts {
            users: User::count(pool).await?,
            scenes: Scene::count(pool).await?,
            tags: Tag::count(pool).await?,
            projects: Project::count(pool).await?,
            templates: Template::count(pool).await?,
            documents: Document::count(pool).await?,
            template_uses: TemplateUsage::count(pool).await?,
        };

        let users_by_status = UsersByStatus::from_rows(&User::count_by_status(pool).await?);

        let recent_templates = Template::recent(pool, RECENT_TEMPLATES)
            .await?
            .into_iter()
            .map(|t| RecentTemplate {
                id: t.id,
                title: t.title,
                current_version: t.current_version,
                updated_at: t.updated_at,
            })
            .collect();

        Ok(Self {
            counts,
            users_by_status,
            top_templates: TemplateUsage::top_templates(pool, TOP_TEMPLATES).await?,
            daily_usage: TemplateUsage::daily_counts(pool, USAGE_DAYS).await?,
            recent_templates,
        })
    }
}
