//! Database repository for refresh tokens.
//!
//! Refresh-token rows are append-and-delete only: issued on signin, removed on
//! logout or when a validation call finds them expired. Nothing updates them
//! in place.

use crate::database::models::{CreateRefreshToken, RefreshToken};
use anyhow::Result;
use sqlx::{SqliteConnection, SqlitePool};

const TOKEN_COLUMNS: &str = "id, token, user_id, created_at, expires_at";

/// Repository for refresh-token database operations.
pub struct RefreshTokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> RefreshTokenRepository<'a> {
    /// Creates a new RefreshTokenRepository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a freshly minted refresh token.
    pub async fn create(&self, token: CreateRefreshToken) -> Result<RefreshToken> {
        let created = sqlx::query_as::<_, RefreshToken>(&format!(
            r#"
            INSERT INTO refresh_tokens (id, token, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(&token.id)
        .bind(&token.token)
        .bind(&token.user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Retrieves a token by its opaque value.
    pub async fn get_by_token(&self, token_value: &str) -> Result<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token = ?"
        ))
        .bind(token_value)
        .fetch_optional(self.pool)
        .await?;

        Ok(token)
    }

    /// Deletes a token row by value, for logout and lazy expiry cleanup.
    ///
    /// # Returns
    /// `true` when a row was removed
    pub async fn delete_by_token(&self, token_value: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = ?")
            .bind(token_value)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes every refresh token of a user inside an open transaction,
    /// paired with the soft delete of the account itself.
    pub async fn delete_all_for_user_in_tx(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Get total count of stored tokens for a user
    pub async fn count_for_user(&self, user_id: &str) -> Result<u64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        Ok(count as u64)
    }
}
