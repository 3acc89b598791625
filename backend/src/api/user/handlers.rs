//! Handler functions for user profile and management API endpoints.
//!
//! These functions process requests for the authenticated user's own data,
//! interact with the user service, and return profile information.

use crate::api::common::{ApiResponse, service_error_to_http, validation_error_response};
use crate::auth::models::{GeneralResponse, UpdatePasswordRequest, UpdateUserRequest, UserResponse};
use crate::services::user_service::UserService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use sqlx::SqlitePool;
use validator::Validate;

/// Retrieves the authenticated user's own profile.
#[axum::debug_handler]
pub async fn me(
    Extension(claims): Extension<Claims>,
    Extension(pool): Extension<SqlitePool>,
) -> Result<Json<ApiResponse<UserResponse>>, (StatusCode, String)> {
    tracing::info!("Fetching profile for user: {}", claims.sub);

    let user_service = UserService::new(&pool);
    let user = user_service
        .get_current_user(&claims.sub)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        UserResponse::from(user),
        "User retrieved successfully",
    )))
}

/// Updates the authenticated user's profile fields.
#[axum::debug_handler]
pub async fn update_user(
    Extension(claims): Extension<Claims>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, (StatusCode, String)> {
    if let Err(errors) = payload.validate() {
        return Err(validation_error_response(errors));
    }

    tracing::info!("Updating profile {} requested by user: {}", id, claims.sub);

    let user_service = UserService::new(&pool);
    let user = user_service
        .update_user(&claims.sub, &id, payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        UserResponse::from(user),
        "User updated successfully",
    )))
}

/// Rotates the authenticated user's password.
#[axum::debug_handler]
pub async fn update_password(
    Extension(claims): Extension<Claims>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<ApiResponse<GeneralResponse>>, (StatusCode, String)> {
    if let Err(errors) = payload.validate() {
        return Err(validation_error_response(errors));
    }

    tracing::info!("Password change for {} requested by user: {}", id, claims.sub);

    let user_service = UserService::new(&pool);
    user_service
        .update_password(&claims.sub, &id, payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        GeneralResponse::new("Password updated successfully"),
        "Password updated successfully",
    )))
}

/// Soft-deletes the authenticated user's account.
#[axum::debug_handler]
pub async fn delete_user(
    Extension(claims): Extension<Claims>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GeneralResponse>>, (StatusCode, String)> {
    tracing::info!("Account deletion for {} requested by user: {}", id, claims.sub);

    let user_service = UserService::new(&pool);
    user_service
        .delete_user(&claims.sub, &id)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        GeneralResponse::new("Account deleted successfully"),
        "Account deleted successfully",
    )))
}
