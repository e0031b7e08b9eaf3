/// Access control and admin routes against a real database
///
/// Every authenticated request loads the caller's account, so these need a
/// seeded `users` row. Skipped unless `DATABASE_URL` is set.

mod common;

use axum::http::{Method, StatusCode};
use common::{seed_user, send, setup_db_app, token_for, TestApp};
use serde_json::json;
use tshare_shared::models::user::{UpdateUser, User, UserRole, UserStatus};
use uuid::Uuid;

async fn active_admin(app: &TestApp) -> (User, String) {
    seed_user(&app.pool, "admin@example.com", UserRole::Admin, UserStatus::Active).await
}

async fn active_member(app: &TestApp) -> (User, String) {
    seed_user(&app.pool, "member@example.com", UserRole::User, UserStatus::Active).await
}

#[tokio::test]
async fn test_suspended_account_loses_access_immediately() {
    let Some(app) = setup_db_app().await else { return };
    let (member, token) = active_member(&app).await;

    let before = send(&app.app, Method::GET, "/api/templates", Some(&token), None).await;
    assert_eq!(before.status, StatusCode::OK);

    User::update(
        &app.pool,
        member.id,
        UpdateUser {
            status: Some(UserStatus::Suspended),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let after = send(&app.app, Method::GET, "/api/templates", Some(&token), None).await;
    assert_eq!(after.status, StatusCode::FORBIDDEN);
    assert_eq!(after.body["message"], "Account is suspended");
}

#[tokio::test]
async fn test_pending_account_cannot_use_token() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) =
        seed_user(&app.pool, "new@example.com", UserRole::User, UserStatus::Pending).await;

    let res = send(&app.app, Method::GET, "/api/auth/me", Some(&token), None).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["message"], "Account is awaiting approval");
}

#[tokio::test]
async fn test_deleted_account_token_is_unauthorized() {
    let Some(app) = setup_db_app().await else { return };
    let (member, token) = active_member(&app).await;

    assert!(User::delete(&app.pool, member.id).await.unwrap());

    let res = send(&app.app, Method::GET, "/api/projects", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_account_cannot_change_oauth() {
    let Some(app) = setup_db_app().await else { return };
    let forged = token_for(Uuid::new_v4(), UserRole::Admin);

    let res = send(
        &app.app,
        Method::PUT,
        "/api/admin/oauth",
        Some(&forged),
        Some(json!({ "providers": [{ "name": "intruder", "enabled": true }] })),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let config = send(&app.app, Method::GET, "/api/config", None, None).await;
    assert_eq!(config.body["oauth_providers"], json!(["google"]));
}

#[tokio::test]
async fn test_demoted_admin_loses_admin_routes() {
    let Some(app) = setup_db_app().await else { return };
    let (admin, token) = active_admin(&app).await;

    User::update(
        &app.pool,
        admin.id,
        UpdateUser {
            role: Some(UserRole::User),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let res = send(&app.app, Method::GET, "/api/admin/export", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_comes_from_account_not_token() {
    let Some(app) = setup_db_app().await else { return };
    let (member, _) = active_member(&app).await;
    let inflated = token_for(member.id, UserRole::Admin);

    let res = send(&app.app, Method::GET, "/api/admin/dashboard", Some(&inflated), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_member(&app).await;

    for uri in [
        "/api/admin/dashboard",
        "/api/admin/export",
        "/api/admin/oauth",
        "/api/users",
    ] {
        let res = send(&app.app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(res.body["error"], "forbidden", "{uri}");
    }
}

#[tokio::test]
async fn test_tag_delete_is_admin_only() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_member(&app).await;

    let res = send(
        &app.app,
        Method::DELETE,
        &format!("/api/tags/{}", Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_path_id_is_rejected() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_member(&app).await;

    let res = send(&app.app, Method::GET, "/api/templates/not-a-uuid", Some(&token), None).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_rejects_incomplete_envelope() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;

    let res = send(
        &app.app,
        Method::POST,
        "/api/admin/import",
        Some(&token),
        Some(json!({ "version": "1.0", "data": { "users": [] } })),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let message = res.body["message"].as_str().unwrap();
    assert!(message.starts_with("Invalid export file"));
    assert!(message.contains("data.templates is missing"));
    assert!(message.contains("data.userPreferences is missing"));
    assert!(!message.contains("data.users is missing"));

    // Nothing was cleared or written
    assert_eq!(User::count(&app.pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_import_rejects_unknown_version() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;

    let res = send(
        &app.app,
        Method::POST,
        "/api/admin/import",
        Some(&token),
        Some(json!({ "version": "9.9", "data": {} })),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_rejects_bad_query_flag() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;

    let res = send(
        &app.app,
        Method::POST,
        "/api/admin/import?clear_existing=maybe",
        Some(&token),
        Some(json!({})),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "bad_request");
}

#[tokio::test]
async fn test_import_body_over_limit_is_rejected() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;
    let padding = "x".repeat(128 * 1024);

    let res = send(
        &app.app,
        Method::POST,
        "/api/admin/import",
        Some(&token),
        Some(json!({ "version": "1.0", "padding": padding })),
    )
    .await;

    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.body["error"], "payload_too_large");
}

#[tokio::test]
async fn test_oauth_settings_are_masked_for_admins() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;

    let res = send(&app.app, Method::GET, "/api/admin/oauth", Some(&token), None).await;

    assert_eq!(res.status, StatusCode::OK);
    let providers = res.body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 2);
    assert!(providers.iter().all(|p| p["client_secret"] == "********"));
    assert_eq!(providers[0]["client_id"], "google-client");
}

#[tokio::test]
async fn test_oauth_update_changes_published_providers() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;

    let res = send(
        &app.app,
        Method::PUT,
        "/api/admin/oauth",
        Some(&token),
        Some(json!({
            "providers": [
                {
                    "name": "github",
                    "client_id": "github-client",
                    "client_secret": "********",
                    "redirect_url": "http://localhost/callback/github",
                    "enabled": true
                }
            ]
        })),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["providers"][0]["client_secret"], "********");

    let config = send(&app.app, Method::GET, "/api/config", None, None).await;
    assert_eq!(config.body["oauth_providers"], json!(["github"]));
}

#[tokio::test]
async fn test_oauth_update_rejects_duplicates() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;

    let res = send(
        &app.app,
        Method::PUT,
        "/api/admin/oauth",
        Some(&token),
        Some(json!({
            "providers": [
                { "name": "google", "enabled": true },
                { "name": "google", "enabled": false }
            ]
        })),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oauth_update_validates_names() {
    let Some(app) = setup_db_app().await else { return };
    let (_, token) = active_admin(&app).await;

    let res = send(
        &app.app,
        Method::PUT,
        "/api/admin/oauth",
        Some(&token),
        Some(json!({ "providers": [{ "name": "", "enabled": true }] })),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["error"], "validation_error");
}
