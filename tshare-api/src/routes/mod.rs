/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `client_config`: Public settings for the web client
/// - `auth`: Registration, login, token refresh, password change
/// - `users`: Account administration and approval
/// - `scenes`, `tags`, `projects`, `templates`: Catalogue CRUD
/// - `variables`: User- and project-scoped placeholder values
/// - `documents`: Auto-saved shared documents and personal memos
/// - `preferences`: Per-user settings
/// - `admin`: Dashboard, export/import, OAuth configuration

pub mod admin;
pub mod auth;
pub mod client_config;
pub mod documents;
pub mod health;
pub mod preferences;
pub mod projects;
pub mod scenes;
pub mod tags;
pub mod templates;
pub mod users;
pub mod variables;
