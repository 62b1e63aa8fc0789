//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle user signup, signin, and the password-reset flow.
//! They are designed to be integrated into the main Axum router.

use crate::auth::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/forgot-password", post(forgot_password))
        .route(
            "/reset/{id}/{token}",
            get(verify_reset_token).post(reset_password),
        )
}
