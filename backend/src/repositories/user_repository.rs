//! Database repository for user management operations.
//!
//! Provides CRUD operations for system users

use crate::{
    api::admin::models::UserSortBy,
    api::common::PaginationFilter,
    database::models::{CreateUser, User, UserStatus},
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, status, locked, \
     created_at, updated_at, deleted_at";

/// Repository for user database operations.
///
/// Handles all persistence operations for the User entity. Rows are returned
/// regardless of lifecycle state; callers gate on `status` themselves, since
/// signin and signup need to see disabled and deleted accounts.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database. Accounts start disabled and
    /// unlocked; confirmation flips them active.
    ///
    /// # Arguments
    /// * `user` - CreateUser DTO containing user details
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash, status, locked, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(UserStatus::Disabled)
        .bind(false)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if a row exists, `None` otherwise
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by their email. The email column is NOCASE so lookups
    /// are case-insensitive.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Checks if an email already exists in the system. Soft-deleted rows
    /// count: their emails stay reserved by the unique index.
    ///
    /// # Returns
    /// `true` if a user with this email exists
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Checks if email exists excluding a specific user.
    ///
    /// # Arguments
    /// * `email` - Email to check
    /// * `exclude_user_id` - User ID to exclude from check
    ///
    /// # Returns
    /// `true` if another user with this email exists
    pub async fn email_exists_excluding(&self, email: &str, exclude_user_id: &str) -> Result<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
                .bind(email)
                .bind(exclude_user_id)
                .fetch_one(self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Updates the profile fields of a non-deleted user.
    ///
    /// # Returns
    /// The updated user, or `None` when the row is missing or deleted
    pub async fn update_profile(
        &self,
        id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<User>> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = ?, first_name = ?, last_name = ?, updated_at = ?
            WHERE id = ? AND status != 'deleted'
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(updated)
    }

    /// Replaces the stored password hash of a non-deleted user.
    pub async fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND status != 'deleted'",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transaction-scoped variant of [`Self::set_password_hash`], for flows
    /// that must pair the hash rotation with a token consumption.
    pub async fn set_password_hash_in_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND status != 'deleted'",
        )
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips a non-deleted account to active inside an open transaction,
    /// paired with the confirmation-token consumption that justifies it.
    pub async fn activate_in_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET status = 'active', updated_at = ? WHERE id = ? AND status != 'deleted'",
        )
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies an admin lifecycle override to a non-deleted user.
    pub async fn update_status(
        &self,
        id: &str,
        status: UserStatus,
        locked: bool,
    ) -> Result<Option<User>> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET status = ?, locked = ?, updated_at = ?
            WHERE id = ? AND status != 'deleted'
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(locked)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(updated)
    }

    /// Soft-deletes a user inside an open transaction. The row stays behind
    /// with its email reserved; only the lifecycle columns change.
    pub async fn soft_delete_in_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET status = 'deleted', locked = 1, deleted_at = ?, updated_at = ?
            WHERE id = ? AND status != 'deleted'
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Retrieves a page of non-deleted users ordered by a whitelisted column.
    ///
    /// # Arguments
    /// * `pagination` - page/per-page window
    /// * `sort_by` - whitelisted sort column
    /// * `ascending` - sort direction
    pub async fn list_users(
        &self,
        pagination: &PaginationFilter,
        sort_by: UserSortBy,
        ascending: bool,
    ) -> Result<Vec<User>> {
        let direction = if ascending { "ASC" } else { "DESC" };
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE status != 'deleted'
            ORDER BY {column} {direction}
            LIMIT ? OFFSET ?
            "#,
            column = sort_by.column(),
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Get total count of non-deleted users
    pub async fn count_users(&self) -> Result<u64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE status != 'deleted'")
                .fetch_one(self.pool)
                .await?;

        Ok(count as u64)
    }
}
