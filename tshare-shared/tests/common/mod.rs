//! Shared setup for database integration tests
//!
//! Tests run only when `DATABASE_URL` points at a disposable PostgreSQL
//! database; every test truncates all tables. Without `DATABASE_URL` they
//! return early and pass.

#![allow(dead_code)]

use std::env;
use std::sync::OnceLock;

use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};
use tshare_shared::db::migrations::run_migrations;
use tshare_shared::db::pool::{create_pool, DatabaseConfig};
use tshare_shared::models::user::{CreateUser, User, UserRole, UserStatus};

/// Serializes tests inside one binary since they share the database
fn db_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Connects, migrates and empties the test database
pub async fn setup() -> Option<TestDb> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let guard = db_lock().lock().await;

    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 5,
        ..Default::default()
    })
    .await
    .expect("Failed to connect to test database");

    run_migrations(&pool).await.expect("Failed to run migrations");
    truncate_all(&pool).await;

    Some(TestDb {
        pool,
        _guard: guard,
    })
}

pub async fn truncate_all(pool: &PgPool) {
    sqlx::query(
        "TRUNCATE users, scenes, tags, projects, templates, template_versions, template_tags,
                  template_usage, user_variables, project_variables, documents, user_preferences
         CASCADE",
    )
    .execute(pool)
    .await
    .expect("Failed to truncate tables");
}

pub async fn create_user(pool: &PgPool, email: &str, role: UserRole, status: UserStatus) -> User {
    User::create(
        pool,
        CreateUser {
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            name: Some(email.split('@').next().unwrap_or_default().to_string()),
            role,
            status,
        },
    )
    .await
    .expect("Failed to create user")
}
