//! Password-reset token lifecycle.
//!
//! Per account the two reset columns form a small state machine: no pending
//! reset, pending reset, or pending-but-expired. `initiate` moves any state
//! to pending (overwriting an earlier token, which becomes permanently
//! unusable), `validate` is a read-only check, and `complete` consumes the
//! token exactly once while swapping in the new password hash.

use crate::database::models::User;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::utils::generate_reset_token::generate_reset_token;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

/// A freshly initiated reset. The token is returned to the orchestrator for
/// out-of-band delivery only; it never appears in an API response.
#[derive(Debug)]
pub struct PendingReset {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct ResetTokenManager<'a> {
    pool: &'a SqlitePool,
    expiry_minutes: i64,
}

impl<'a> ResetTokenManager<'a> {
    pub fn new(pool: &'a SqlitePool, expiry_minutes: i64) -> Self {
        Self {
            pool,
            expiry_minutes,
        }
    }

    /// Starts (or restarts) a reset for the given user.
    ///
    /// Generates a fresh token, stamps the expiry, and persists both fields
    /// in a single statement. The caller has already confirmed the user
    /// exists.
    pub async fn initiate(&self, user_id: &str) -> ServiceResult<PendingReset> {
        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(self.expiry_minutes);

        let repo = UserRepository::new(self.pool);
        repo.update_reset_fields(user_id, &token, expires_at).await?;

        Ok(PendingReset { token, expires_at })
    }

    /// Read-only token check. Reports the remaining validity in whole
    /// seconds, rounded up.
    ///
    /// # Errors
    /// `NotFound` if no such user, `NoPendingReset` if the reset fields are
    /// absent, `InvalidToken` on mismatch, `Expired` at or past the expiry
    /// instant.
    pub async fn validate(&self, user_id: &str, token: &str) -> ServiceResult<i64> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;

        self.check_pending(&user, token)
    }

    /// Consumes the token: re-checks match and non-expiry, then sets the new
    /// password hash and clears both reset fields in one guarded statement.
    /// A token that was consumed or overwritten between the check and the
    /// update loses the guard and surfaces as `InvalidToken`; account state
    /// is unchanged on any failure.
    pub async fn complete(
        &self,
        user_id: &str,
        token: &str,
        new_password_hash: &str,
    ) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;

        check_consumable(&user, token)?;

        let consumed = repo
            .consume_reset_token(user_id, token, new_password_hash)
            .await?;

        if !consumed {
            return Err(ServiceError::InvalidToken);
        }

        Ok(())
    }

    fn check_pending(&self, user: &User, token: &str) -> ServiceResult<i64> {
        let (stored, expiry) = match (&user.reset_token, user.reset_token_expiry) {
            (Some(stored), Some(expiry)) => (stored, expiry),
            _ => return Err(ServiceError::NoPendingReset),
        };

        if stored != token {
            return Err(ServiceError::InvalidToken);
        }

        let remaining = remaining_seconds(expiry, Utc::now());
        if remaining <= 0 {
            return Err(ServiceError::Expired);
        }

        Ok(remaining)
    }
}

/// Completion-path check. Unlike the read-only validate, cleared reset
/// fields fail as `InvalidToken` rather than `NoPendingReset`: a replayed
/// token after a successful completion is indistinguishable from a wrong
/// one.
fn check_consumable(user: &User, token: &str) -> ServiceResult<()> {
    match (&user.reset_token, user.reset_token_expiry) {
        (Some(stored), Some(expiry)) => {
            if stored != token {
                return Err(ServiceError::InvalidToken);
            }
            if remaining_seconds(expiry, Utc::now()) <= 0 {
                return Err(ServiceError::Expired);
            }
            Ok(())
        }
        _ => Err(ServiceError::InvalidToken),
    }
}

/// Remaining validity in whole seconds, rounded up. Zero or negative means
/// expired; the boundary instant counts as expired.
fn remaining_seconds(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expiry - now).num_milliseconds();
    (millis + 999).div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CreateUser, UserRole};
    use crate::test_util::test_pool;

    async fn seed_user(pool: &SqlitePool, id: &str) {
        let repo = UserRepository::new(pool);
        repo.create_user(CreateUser {
            id: id.to_string(),
            name: "Sample".to_string(),
            email: format!("{id}@x.com"),
            password_hash: "hash".to_string(),
            role: UserRole::User,
        })
        .await
        .unwrap();
    }

    #[test]
    fn remaining_seconds_rounds_up() {
        let now = Utc::now();
        assert_eq!(remaining_seconds(now + Duration::seconds(1), now), 1);
        assert_eq!(remaining_seconds(now + Duration::milliseconds(1), now), 1);
        assert_eq!(remaining_seconds(now + Duration::seconds(60), now), 60);
        assert_eq!(
            remaining_seconds(now + Duration::milliseconds(59_001), now),
            60
        );
    }

    #[test]
    fn remaining_seconds_boundary_counts_as_expired() {
        let now = Utc::now();
        assert_eq!(remaining_seconds(now, now), 0);
        assert!(remaining_seconds(now - Duration::seconds(5), now) <= 0);
    }

    #[tokio::test]
    async fn initiate_sets_both_fields_and_validate_succeeds() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        let manager = ResetTokenManager::new(&pool, 1);

        let pending = manager.initiate("u1").await.unwrap();
        assert_eq!(pending.token.len(), 64);

        let user = UserRepository::new(&pool)
            .get_user_by_id("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.reset_token.as_deref(), Some(pending.token.as_str()));
        assert!(user.reset_token_expiry.is_some());

        let remaining = manager.validate("u1", &pending.token).await.unwrap();
        assert!(remaining > 0 && remaining <= 60);
    }

    #[tokio::test]
    async fn validate_error_taxonomy() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        let manager = ResetTokenManager::new(&pool, 1);

        assert!(matches!(
            manager.validate("missing", "t").await,
            Err(ServiceError::NotFound { .. })
        ));

        assert!(matches!(
            manager.validate("u1", "t").await,
            Err(ServiceError::NoPendingReset)
        ));

        let pending = manager.initiate("u1").await.unwrap();
        assert!(matches!(
            manager.validate("u1", "wrong-token").await,
            Err(ServiceError::InvalidToken)
        ));
        assert!(manager.validate("u1", &pending.token).await.is_ok());
    }

    #[tokio::test]
    async fn second_initiate_invalidates_first_token() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        let manager = ResetTokenManager::new(&pool, 1);

        let first = manager.initiate("u1").await.unwrap();
        let second = manager.initiate("u1").await.unwrap();
        assert_ne!(first.token, second.token);

        assert!(matches!(
            manager.validate("u1", &first.token).await,
            Err(ServiceError::InvalidToken)
        ));
        assert!(manager.validate("u1", &second.token).await.is_ok());
    }

    #[tokio::test]
    async fn expiry_boundary() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        let manager = ResetTokenManager::new(&pool, 1);
        let repo = UserRepository::new(&pool);

        // Stored expiry exactly now: boundary instant counts as expired.
        repo.update_reset_fields("u1", "tok", Utc::now()).await.unwrap();
        assert!(matches!(
            manager.validate("u1", "tok").await,
            Err(ServiceError::Expired)
        ));

        // Well past expiry stays expired, not invalid.
        repo.update_reset_fields("u1", "tok", Utc::now() - Duration::minutes(5))
            .await
            .unwrap();
        assert!(matches!(
            manager.validate("u1", "tok").await,
            Err(ServiceError::Expired)
        ));

        // One second before expiry reports exactly one second left.
        repo.update_reset_fields("u1", "tok", Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        let remaining = manager.validate("u1", "tok").await.unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn complete_is_single_use() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        let manager = ResetTokenManager::new(&pool, 1);

        let pending = manager.initiate("u1").await.unwrap();
        manager.complete("u1", &pending.token, "new-hash").await.unwrap();

        let user = UserRepository::new(&pool)
            .get_user_by_id("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.password_hash, "new-hash");
        assert!(!user.has_pending_reset());

        // Fields were cleared: a replay fails InvalidToken, not Expired.
        assert!(matches!(
            manager.complete("u1", &pending.token, "other-hash").await,
            Err(ServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn complete_failure_leaves_state_unchanged() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        let manager = ResetTokenManager::new(&pool, 1);

        let pending = manager.initiate("u1").await.unwrap();
        assert!(matches!(
            manager.complete("u1", "wrong-token", "h").await,
            Err(ServiceError::InvalidToken)
        ));

        let user = UserRepository::new(&pool)
            .get_user_by_id("u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.password_hash, "hash");
        assert_eq!(user.reset_token.as_deref(), Some(pending.token.as_str()));
    }

    #[tokio::test]
    async fn concurrent_initiates_leave_exactly_one_valid_token() {
        let pool = test_pool().await;
        seed_user(&pool, "u1").await;
        let manager = ResetTokenManager::new(&pool, 1);

        let (a, b) = tokio::join!(manager.initiate("u1"), manager.initiate("u1"));
        let (a, b) = (a.unwrap(), b.unwrap());

        let a_valid = manager.validate("u1", &a.token).await.is_ok();
        let b_valid = manager.validate("u1", &b.token).await.is_ok();
        assert!(a_valid ^ b_valid, "exactly one of the two tokens must remain valid");
    }
}
