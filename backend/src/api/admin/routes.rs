//! Defines the HTTP routes for administrative user management.
//!
//! Every route requires a valid access token. Role-based gating beyond that
//! is left to the deployment in front of this service.

use super::handlers::{get_user, list_users, update_user_status};
use crate::auth::middleware::jwt_auth;
use axum::{
    Router, middleware,
    routing::{get, patch},
};

pub fn admin_router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
        .route("/{id}/status", patch(update_user_status))
        .layer(middleware::from_fn(jwt_auth))
}
