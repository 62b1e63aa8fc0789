//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per registered account.
///
/// `reset_token` and `reset_token_expiry` are either both set (a reset is
/// pending) or both NULL; no code path writes one without the other.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Last-issued session token. Not a revocation list: earlier tokens stay
    /// valid until their own expiry.
    pub session_token: Option<String>,
    pub role: UserRole,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account role. Single-valued for now, reserved for future expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
        }
    }
}

/// Insert DTO for a new user row. The password is already hashed by the time
/// this struct exists.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl User {
    /// Whether a reset request is currently stored, expired or not.
    pub fn has_pending_reset(&self) -> bool {
        self.reset_token.is_some() && self.reset_token_expiry.is_some()
    }
}
