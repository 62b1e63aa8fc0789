//! Shared helpers for tests: an in-memory database with migrations applied
//! and a fixed configuration that needs no environment.

use crate::config::Config;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

/// Connects an in-memory SQLite pool and applies the embedded migrations.
///
/// A single connection is required: every pooled connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations apply");

    pool
}

/// A fixed configuration for tests, no SMTP settings so email sending is
/// disabled (the notifier is best-effort, so nothing fails).
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_seconds: 3,
        jwt_secret: "test-secret".to_string(),
        jwt_expires_in_seconds: 86_400,
        reset_expiry_minutes: 1,
        frontend_base_url: "http://localhost:5173".to_string(),
        server_port: 0,
        smtp_host: None,
        smtp_port: 587,
        smtp_username: None,
        smtp_password: None,
        from_email: None,
        from_name: "Auth API".to_string(),
    }
}
