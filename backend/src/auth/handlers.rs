//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for account signup, signin,
//! email confirmation, password reset, and token refresh, parse request data,
//! and interact with the `auth::service` for core business logic.

use crate::api::common::service_error_to_http;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::config::Config;
use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::Deserialize;
use sqlx::SqlitePool;

/// Handle new account registration
#[axum::debug_handler]
pub async fn signup(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<(StatusCode, ResponseJson<RegistrationResponse>), (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.signup(payload).await {
        Ok(response) => Ok((StatusCode::CREATED, ResponseJson(response))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user signin request
#[axum::debug_handler]
pub async fn signin(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<AuthenticationRequest>,
) -> Result<ResponseJson<AuthenticationResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.signin(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Query parameters for the emailed confirmation link
#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    pub token: String,
}

/// Handle email confirmation from the emailed link
#[axum::debug_handler]
pub async fn confirm(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Query(params): Query<ConfirmParams>,
) -> Result<ResponseJson<GeneralResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.confirm_token(&params.token).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle verification token resend request
#[axum::debug_handler]
pub async fn resend_verification(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<EmailRequest>,
) -> Result<ResponseJson<GeneralResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.resend_verification(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle password reset request redeemed with an emailed token
#[axum::debug_handler]
pub async fn forgot_password(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<ResponseJson<GeneralResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.forgot_password(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<ResponseJson<RefreshTokenResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.refresh_token(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout request by revoking the presented refresh token
#[axum::debug_handler]
pub async fn logout(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Config>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<ResponseJson<GeneralResponse>, (StatusCode, String)> {
    let auth_service = AuthService::new(&pool, &config);

    match auth_service.logout(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}
