//! Database repository for user account operations.
//!
//! Provides lookups plus explicit atomic update operations. Every mutation is
//! a single UPDATE statement so callers never load-mutate-save a row and race
//! another writer; SQLite serializes writes per row.

use crate::database::models::{CreateUser, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, name, email, password_hash, session_token, role, \
     reset_token, reset_token_expiry, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// The UNIQUE constraint on `email` is the authoritative uniqueness
    /// check; a violation surfaces as a database error for the service layer
    /// to classify.
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Retrieves a user by their email.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks if an email already exists in the system.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Records the last-issued session token for a user.
    pub async fn update_session_token(&self, id: &str, token: &str) -> Result<()> {
        sqlx::query("UPDATE users SET session_token = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Sets both reset fields in one statement, overwriting any prior pending
    /// reset. Two concurrent writers end up last-writer-wins with exactly one
    /// token stored.
    pub async fn update_reset_fields(
        &self,
        id: &str,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET reset_token = ?, reset_token_expiry = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(token)
        .bind(expiry)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Sets the new password hash and clears both reset fields in one guarded
    /// statement. The `reset_token = ?` guard makes the token single-use: a
    /// caller that lost a race (token already consumed or overwritten) gets
    /// zero rows affected.
    ///
    /// # Returns
    /// `true` if the token was consumed, `false` if the guard did not match
    pub async fn consume_reset_token(
        &self,
        id: &str,
        token: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users \
             SET password_hash = ?, reset_token = NULL, reset_token_expiry = NULL, updated_at = ? \
             WHERE id = ? AND reset_token = ?",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .bind(token)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
