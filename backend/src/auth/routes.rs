//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle endpoints like account signup, signin, email
//! confirmation, password reset, and token refreshing. They are designed to
//! be integrated into the main Axum router.

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
        .route("/confirm", get(confirm))
        .route("/resend-verification", post(resend_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
}
