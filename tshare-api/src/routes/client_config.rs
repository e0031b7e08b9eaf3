/// Public client configuration
///
/// # Endpoint
///
/// ```text
/// GET /api/config
/// ```
///
/// # Response
///
/// ```json
/// {
///   "autosave_debounce_ms": 3000,
///   "oauth_providers": ["google"],
///   "version": "0.1.0"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Delay the editor waits after the last keystroke before saving
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 3000;

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    pub autosave_debounce_ms: u64,

    /// Names of enabled OAuth providers (never secrets)
    pub oauth_providers: Vec<String>,

    pub version: String,
}

pub async fn client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    let oauth_providers = state.oauth.read().await.enabled_names();

    Json(ClientConfig {
        autosave_debounce_ms: AUTOSAVE_DEBOUNCE_MS,
        oauth_providers,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
