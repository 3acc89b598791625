//! Administrative user management business logic.
//!
//! Listing, inspection, and lifecycle overrides for user accounts, reachable
//! only through the authenticated admin routes.

use crate::api::admin::models::{UserListFilter, UserSortBy};
use crate::api::common::{PaginationFilter, PaginationMeta};
use crate::auth::models::UserResponse;
use crate::database::models::{User, UserStatus};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use sqlx::SqlitePool;
use validator::Validate;

pub struct AdminService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> AdminService<'a> {
    /// Creates a new AdminService instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists non-deleted users as one page plus pagination metadata.
    ///
    /// # Arguments
    /// * `filter` - Page window, sort column, and sort direction
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` for an unknown sort field or an
    /// out-of-range page window
    pub async fn list_users(
        &self,
        filter: UserListFilter,
    ) -> ServiceResult<(Vec<UserResponse>, PaginationMeta)> {
        let sort_by = match filter.sort_by.as_deref() {
            Some(field) => field
                .parse::<UserSortBy>()
                .map_err(ServiceError::validation)?,
            None => UserSortBy::CreatedAt,
        };
        let ascending = filter.ascending.unwrap_or(true);
        let pagination = PaginationFilter {
            page: filter.page,
            per_page: filter.per_page,
        };

        // Input validation using validator crate
        if let Err(validation_errors) = pagination.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();

            return Err(ServiceError::validation(error_messages.join(", ")));
        }

        let repo = UserRepository::new(self.pool);
        let users = repo.list_users(&pagination, sort_by, ascending).await?;
        let total = repo.count_users().await?;
        let meta = PaginationMeta::from_filter(&pagination, total);

        Ok((users.into_iter().map(UserResponse::from).collect(), meta))
    }

    /// Retrieves any non-deleted user by ID.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the user doesn't exist or has been
    /// deleted
    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .filter(|user| user.status != UserStatus::Deleted)
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        Ok(user)
    }

    /// Applies a lifecycle override to a user: lock or unlock the account,
    /// enable (activate) or disable it. Omitted knobs keep their current
    /// value; at least one must be supplied.
    pub async fn update_user_status(
        &self,
        id: &str,
        locked: Option<bool>,
        enabled: Option<bool>,
    ) -> ServiceResult<User> {
        if locked.is_none() && enabled.is_none() {
            return Err(ServiceError::validation(
                "Provide at least one of locked or enabled",
            ));
        }

        let current = self.get_user(id).await?;
        let status = match enabled {
            Some(true) => UserStatus::Active,
            Some(false) => UserStatus::Disabled,
            None => current.status,
        };
        let locked = locked.unwrap_or(current.locked);

        let updated = UserRepository::new(self.pool)
            .update_status(id, status, locked)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        tracing::info!(
            "Admin set user {} to status={} locked={}",
            updated.id,
            updated.status,
            updated.locked
        );

        Ok(updated)
    }
}
