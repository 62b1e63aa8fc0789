//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for signup, signin, and the
//! password-reset flow, parse request data, and interact with the
//! `auth::service` for core business logic.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::config::Config;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;

/// Handle user registration request
#[axum::debug_handler]
pub async fn signup(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<UserSummary>>), (StatusCode, String)> {
    let service = AuthService::new(&pool, &config);

    match service.register(payload).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(user, "User registered successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn signin(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<LoginResponse>, (StatusCode, String)> {
    let service = AuthService::new(&pool, &config);

    match service.login(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle password-reset initiation request
#[axum::debug_handler]
pub async fn forgot_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<ResponseJson<ResetExpiryResponse>, (StatusCode, String)> {
    let service = AuthService::new(&pool, &config);

    match service.initiate_reset(payload).await {
        Ok(expires_in_seconds) => Ok(ResponseJson(ResetExpiryResponse {
            message: "Reset link sent".to_string(),
            expires_in_seconds,
        })),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle reset-token validity check
#[axum::debug_handler]
pub async fn verify_reset_token(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Path((id, token)): Path<(String, String)>,
) -> Result<ResponseJson<ResetExpiryResponse>, (StatusCode, String)> {
    let service = AuthService::new(&pool, &config);

    match service.check_reset_token(&id, &token).await {
        Ok(expires_in_seconds) => Ok(ResponseJson(ResetExpiryResponse {
            message: "Token valid".to_string(),
            expires_in_seconds,
        })),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle password-reset completion request
#[axum::debug_handler]
pub async fn reset_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Path((id, token)): Path<(String, String)>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ResponseJson<MessageResponse>, (StatusCode, String)> {
    let service = AuthService::new(&pool, &config);

    match service.complete_reset(&id, &token, payload).await {
        Ok(()) => Ok(ResponseJson(MessageResponse {
            message: "Password reset successful".to_string(),
        })),
        Err(error) => Err(service_error_to_http(error)),
    }
}
