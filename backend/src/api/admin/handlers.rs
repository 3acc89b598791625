//! Handler functions for administrative user-management API endpoints.

use crate::api::admin::models::{UserListFilter, UserStatusParams};
use crate::api::common::{ApiResponse, PaginatedData, service_error_to_http};
use crate::auth::models::UserResponse;
use crate::services::admin_service::AdminService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;

/// Lists user accounts with pagination and sorting.
#[axum::debug_handler]
pub async fn list_users(
    Extension(claims): Extension<Claims>,
    Extension(pool): Extension<SqlitePool>,
    Query(filter): Query<UserListFilter>,
) -> Result<ResponseJson<ApiResponse<PaginatedData<UserResponse>>>, (StatusCode, String)> {
    tracing::info!("Admin {} listing users", claims.sub);

    let service = AdminService::new(&pool);
    let (users, meta) = service
        .list_users(filter)
        .await
        .map_err(service_error_to_http)?;

    let total = meta.total_items;
    Ok(ResponseJson(ApiResponse::paginated(
        PaginatedData::new(users, total),
        meta,
        "Users retrieved successfully",
    )))
}

/// Retrieves a single user account by ID.
#[axum::debug_handler]
pub async fn get_user(
    Extension(claims): Extension<Claims>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<UserResponse>>, (StatusCode, String)> {
    tracing::info!("Admin {} fetching user {}", claims.sub, id);

    let service = AdminService::new(&pool);
    let user = service.get_user(&id).await.map_err(service_error_to_http)?;

    Ok(ResponseJson(ApiResponse::success(
        UserResponse::from(user),
        "User retrieved successfully",
    )))
}

/// Applies a lifecycle override to a user account.
#[axum::debug_handler]
pub async fn update_user_status(
    Extension(claims): Extension<Claims>,
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Query(params): Query<UserStatusParams>,
) -> Result<ResponseJson<ApiResponse<UserResponse>>, (StatusCode, String)> {
    tracing::info!(
        "Admin {} updating status of user {} (locked={:?}, enabled={:?})",
        claims.sub,
        id,
        params.locked,
        params.enabled
    );

    let service = AdminService::new(&pool);
    let user = service
        .update_user_status(&id, params.locked, params.enabled)
        .await
        .map_err(service_error_to_http)?;

    Ok(ResponseJson(ApiResponse::success(
        UserResponse::from(user),
        "User status updated successfully",
    )))
}
