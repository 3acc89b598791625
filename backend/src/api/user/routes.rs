//! Defines the HTTP routes for user profile and management.
//!
//! These routes provide endpoints for accessing and updating user-specific
//! data beyond authentication credentials. Every route requires a valid
//! access token.

use super::handlers::{delete_user, me, update_password, update_user};
use crate::auth::middleware::jwt_auth;
use axum::{
    Router, middleware,
    routing::{get, patch, put},
};

pub fn user_router() -> Router {
    Router::new()
        .route("/me", get(me))
        .route("/{id}", put(update_user).delete(delete_user))
        .route("/{id}/reset", patch(update_password))
        .layer(middleware::from_fn(jwt_auth))
}
