/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use tshare_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = tshare_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{
        auth::{admin_only_layer, jwt_auth_layer},
        security::SecurityHeadersLayer,
    },
    oauth::OAuthSettings,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// OAuth providers, editable at runtime by admins
    pub oauth: Arc<RwLock<OAuthSettings>>,
}

impl AppState {
    /// Creates new application state, seeding OAuth settings from `config`
    pub fn new(db: PgPool, config: Config) -> Self {
        let oauth = config.oauth.clone();
        Self {
            db,
            config: Arc::new(config),
            oauth: Arc::new(RwLock::new(oauth)),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/
///     ├── /config                      # Client config (public)
///     ├── /auth/{register,login,refresh}   (public)
///     ├── /auth/{me,password}          # Authenticated
///     ├── /scenes, /tags, /projects, /templates, /variables, /preferences
///     ├── /projects/:id/{document,memo,variables}
///     ├── /users/...                   # Admin only
///     └── /admin/{dashboard,export,import,oauth}   # Admin only
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS
/// 3. Compression
/// 4. Logging (tower-http TraceLayer)
/// 5. Authentication and admin gate (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/config", get(routes::client_config::client_config))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let user_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/password", put(routes::auth::change_password))
        // Scenes
        .route(
            "/scenes",
            get(routes::scenes::list_scenes).post(routes::scenes::create_scene),
        )
        .route(
            "/scenes/:id",
            get(routes::scenes::get_scene)
                .put(routes::scenes::update_scene)
                .delete(routes::scenes::delete_scene),
        )
        // Tags
        .route(
            "/tags",
            get(routes::tags::list_tags).post(routes::tags::create_tag),
        )
        .route(
            "/tags/:id",
            put(routes::tags::update_tag).delete(routes::tags::delete_tag),
        )
        // Projects
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/document",
            get(routes::documents::get_shared_document).put(routes::documents::save_shared_document),
        )
        .route(
            "/projects/:id/memo",
            get(routes::documents::get_memo).put(routes::documents::save_memo),
        )
        .route(
            "/projects/:id/variables",
            get(routes::variables::list_project_variables)
                .post(routes::variables::create_project_variable),
        )
        .route(
            "/projects/:id/variables/:var_id",
            put(routes::variables::update_project_variable)
                .delete(routes::variables::delete_project_variable),
        )
        // Templates
        .route(
            "/templates",
            get(routes::templates::list_templates).post(routes::templates::create_template),
        )
        .route(
            "/templates/:id",
            get(routes::templates::get_template)
                .put(routes::templates::update_template)
                .delete(routes::templates::delete_template),
        )
        .route("/templates/:id/versions", get(routes::templates::list_versions))
        .route(
            "/templates/:id/versions/:version/restore",
            post(routes::templates::restore_version),
        )
        .route("/templates/:id/tags", put(routes::templates::set_tags))
        .route("/templates/:id/variables", get(routes::templates::template_variables))
        .route("/templates/:id/render", post(routes::templates::render_template))
        // User variables
        .route(
            "/variables",
            get(routes::variables::list_user_variables).post(routes::variables::create_user_variable),
        )
        .route(
            "/variables/:id",
            put(routes::variables::update_user_variable).delete(routes::variables::delete_user_variable),
        )
        // Preferences
        .route(
            "/preferences",
            get(routes::preferences::get_preferences).put(routes::preferences::update_preferences),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let admin_routes = Router::new()
        .route("/users", get(routes::users::list_users))
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/users/:id/approve", post(routes::users::approve_user))
        .route("/admin/dashboard", get(routes::admin::dashboard))
        .route("/admin/export", get(routes::admin::export))
        .route(
            "/admin/import",
            post(routes::admin::import)
                .layer(DefaultBodyLimit::max(state.config.api.import_max_bytes)),
        )
        .route(
            "/admin/oauth",
            get(routes::admin::get_oauth).put(routes::admin::update_oauth),
        )
        .route_layer(from_fn(admin_only_layer))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes);

    let cors = if state.config.cors_permissive() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([header::CONTENT_DISPOSITION])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
