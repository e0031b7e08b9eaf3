/// Pruning job against a real database
///
/// Skipped unless `DATABASE_URL` points at a disposable PostgreSQL database.

use std::env;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};
use tshare_shared::db::migrations::run_migrations;
use tshare_shared::db::pool::{create_pool, DatabaseConfig};
use tshare_shared::models::user::{CreateUser, User, UserRole, UserStatus};
use tshare_worker::jobs::{Job, PrunePendingUsers};
use tshare_worker::scheduler::Scheduler;

/// Tests in this binary share one database
fn db_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

async fn setup() -> Option<(PgPool, MutexGuard<'static, ()>)> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let guard = db_lock().lock().await;

    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 2,
        ..Default::default()
    })
    .await
    .expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");

    sqlx::query("TRUNCATE users CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to truncate users");

    Some((pool, guard))
}

async fn user_aged(pool: &PgPool, email: &str, status: UserStatus, age_days: i32) -> User {
    let user = User::create(
        pool,
        CreateUser {
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            name: None,
            role: UserRole::User,
            status,
        },
    )
    .await
    .expect("Failed to create user");

    sqlx::query("UPDATE users SET created_at = NOW() - make_interval(days => $1) WHERE id = $2")
        .bind(age_days)
        .bind(user.id)
        .execute(pool)
        .await
        .expect("Failed to backdate user");

    user
}

async fn exists(pool: &PgPool, user: &User) -> bool {
    User::find_by_id(pool, user.id).await.unwrap().is_some()
}

#[tokio::test]
async fn test_prune_removes_only_stale_pending_users() {
    let Some((pool, _guard)) = setup().await else { return };

    let stale = user_aged(&pool, "stale@example.com", UserStatus::Pending, 8).await;
    let fresh = user_aged(&pool, "fresh@example.com", UserStatus::Pending, 2).await;
    let old_active = user_aged(&pool, "active@example.com", UserStatus::Active, 30).await;
    let old_suspended = user_aged(&pool, "suspended@example.com", UserStatus::Suspended, 30).await;

    let job = PrunePendingUsers::new(pool.clone(), 7, Duration::from_secs(86_400));
    let outcome = job.run().await.unwrap();

    assert_eq!(outcome.affected, 1);
    assert!(!exists(&pool, &stale).await);
    assert!(exists(&pool, &fresh).await);
    assert!(exists(&pool, &old_active).await);
    assert!(exists(&pool, &old_suspended).await);

    let again = job.run().await.unwrap();
    assert_eq!(again.affected, 0);
}

#[tokio::test]
async fn test_scheduler_prunes_at_startup() {
    let Some((pool, _guard)) = setup().await else { return };

    let stale = user_aged(&pool, "stale@example.com", UserStatus::Pending, 10).await;

    let mut scheduler = Scheduler::new();
    scheduler.register(Arc::new(PrunePendingUsers::new(
        pool.clone(),
        7,
        Duration::from_secs(86_400),
    )));
    let shutdown = scheduler.shutdown_token();
    let handle = tokio::spawn(scheduler.run());

    let mut pruned = false;
    for _ in 0..50 {
        if !exists(&pool, &stale).await {
            pruned = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    shutdown.cancel();
    handle.await.unwrap();

    assert!(pruned, "stale pending user should be deleted by the first run");
}
