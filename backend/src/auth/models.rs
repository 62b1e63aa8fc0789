//! Data structures for authentication-related entities.
//!
//! Request and response payloads for signup, signin, and the password-reset
//! flow, used for data transfer within the authentication flow. Sensitive
//! fields (password, password hash, stored reset token) never appear in a
//! response model.

use crate::database::models::UserRole;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request payload
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Non-sensitive account summary returned after signup
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Login request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response containing the session token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: UserRole,
}

/// Forgot-password request payload
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// Response carrying the reset-window duration; the token itself is only
/// delivered out-of-band.
#[derive(Debug, Serialize)]
pub struct ResetExpiryResponse {
    pub message: String,
    #[serde(rename = "expiresInSeconds")]
    pub expires_in_seconds: i64,
}

/// Reset-password request payload
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Plain message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
