/// Runtime OAuth provider configuration
///
/// Providers are seeded from the environment at start-up and can be edited by
/// admins through `/api/admin/oauth`. The settings live in [`AppState`]
/// behind an `Arc<RwLock<_>>`, so edits are visible to every handler without
/// a restart and without process-global state.
///
/// # Environment Variables
///
/// For each known provider (`google`, `github`):
///
/// - `OAUTH_<NAME>_CLIENT_ID`
/// - `OAUTH_<NAME>_CLIENT_SECRET`
/// - `OAUTH_<NAME>_REDIRECT_URL`
/// - `OAUTH_<NAME>_ENABLED` (default: true when a client id is set)
///
/// [`AppState`]: crate::app::AppState

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Providers read from the environment
pub const KNOWN_PROVIDERS: [&str; 2] = ["google", "github"];

/// Placeholder returned instead of stored client secrets
pub const SECRET_MASK: &str = "********";

/// A single OAuth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OAuthProvider {
    /// Provider name (e.g., "google")
    #[validate(length(min = 1, max = 50, message = "Provider name must be 1-50 characters"))]
    pub name: String,

    #[serde(default)]
    pub client_id: String,

    /// Client secret; [`SECRET_MASK`] on the way out
    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub redirect_url: String,

    #[serde(default)]
    pub enabled: bool,
}

/// OAuth provider list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OAuthSettings {
    #[validate(nested)]
    pub providers: Vec<OAuthProvider>,
}

impl OAuthSettings {
    /// Seeds settings from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seeds settings from an arbitrary variable lookup
    ///
    /// Providers without a client id are skipped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let providers = KNOWN_PROVIDERS
            .iter()
            .filter_map(|name| {
                let prefix = format!("OAUTH_{}", name.to_uppercase());
                let client_id = lookup(&format!("{prefix}_CLIENT_ID")).filter(|v| !v.is_empty())?;

                let enabled = lookup(&format!("{prefix}_ENABLED"))
                    .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(true);

                Some(OAuthProvider {
                    name: name.to_string(),
                    client_id,
                    client_secret: lookup(&format!("{prefix}_CLIENT_SECRET")).unwrap_or_default(),
                    redirect_url: lookup(&format!("{prefix}_REDIRECT_URL")).unwrap_or_default(),
                    enabled,
                })
            })
            .collect();

        Self { providers }
    }

    /// Copy of the settings with every non-empty secret replaced by the mask
    pub fn masked(&self) -> Self {
        let providers = self
            .providers
            .iter()
            .map(|p| OAuthProvider {
                client_secret: if p.client_secret.is_empty() {
                    String::new()
                } else {
                    SECRET_MASK.to_string()
                },
                ..p.clone()
            })
            .collect();

        Self { providers }
    }

    /// Replaces the provider list with `update`
    ///
    /// A provider whose secret arrives as [`SECRET_MASK`] keeps the secret
    /// currently stored under the same name.
    pub fn replace(&mut self, update: OAuthSettings) {
        let providers = update
            .providers
            .into_iter()
            .map(|mut p| {
                if p.client_secret == SECRET_MASK {
                    p.client_secret = self
                        .providers
                        .iter()
                        .find(|old| old.name == p.name)
                        .map(|old| old.client_secret.clone())
                        .unwrap_or_default();
                }
                p
            })
            .collect();

        self.providers = providers;
    }

    /// Names of enabled providers, safe to publish
    pub fn enabled_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn provider(name: &str, secret: &str, enabled: bool) -> OAuthProvider {
        OAuthProvider {
            name: name.to_string(),
            client_id: format!("{name}-id"),
            client_secret: secret.to_string(),
            redirect_url: format!("https://example.com/auth/{name}/callback"),
            enabled,
        }
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("OAUTH_GOOGLE_CLIENT_ID", "g-id"),
            ("OAUTH_GOOGLE_CLIENT_SECRET", "g-secret"),
            ("OAUTH_GITHUB_CLIENT_ID", "gh-id"),
            ("OAUTH_GITHUB_ENABLED", "false"),
        ]
        .into_iter()
        .collect();

        let settings = OAuthSettings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(settings.providers.len(), 2);
        assert_eq!(settings.providers[0].name, "google");
        assert_eq!(settings.providers[0].client_secret, "g-secret");
        assert!(settings.providers[0].enabled);
        assert!(!settings.providers[1].enabled);
        assert_eq!(settings.enabled_names(), vec!["google".to_string()]);
    }

    #[test]
    fn test_from_lookup_skips_unconfigured() {
        let settings = OAuthSettings::from_lookup(|_| None);
        assert!(settings.providers.is_empty());
    }

    #[test]
    fn test_masked_hides_secrets() {
        let settings = OAuthSettings {
            providers: vec![provider("google", "s3cret", true), provider("github", "", false)],
        };

        let masked = settings.masked();
        assert_eq!(masked.providers[0].client_secret, SECRET_MASK);
        assert_eq!(masked.providers[1].client_secret, "");
        assert_eq!(masked.providers[0].client_id, "google-id");
    }

    #[test]
    fn test_replace_keeps_masked_secret() {
        let mut settings = OAuthSettings {
            providers: vec![provider("google", "old-secret", true)],
        };

        settings.replace(OAuthSettings {
            providers: vec![
                provider("google", SECRET_MASK, false),
                provider("github", "new-secret", true),
            ],
        });

        assert_eq!(settings.providers[0].client_secret, "old-secret");
        assert!(!settings.providers[0].enabled);
        assert_eq!(settings.providers[1].client_secret, "new-secret");
    }

    #[test]
    fn test_replace_mask_for_unknown_provider_clears_secret() {
        let mut settings = OAuthSettings::default();
        settings.replace(OAuthSettings {
            providers: vec![provider("github", SECRET_MASK, true)],
        });
        assert_eq!(settings.providers[0].client_secret, "");
    }
}
