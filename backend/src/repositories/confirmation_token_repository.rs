//! Database repository for confirmation tokens.
//!
//! Confirmation tokens back both email verification and password reset. A row
//! is consumed by moving `confirmed_at` from NULL to a timestamp; the update
//! is guarded so only one caller can ever win that transition.

use crate::database::models::{ConfirmationToken, CreateConfirmationToken};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

const TOKEN_COLUMNS: &str = "id, token, user_id, issued_at, expires_at, confirmed_at";

/// Repository for confirmation-token database operations.
pub struct ConfirmationTokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> ConfirmationTokenRepository<'a> {
    /// Creates a new ConfirmationTokenRepository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a freshly minted token. `confirmed_at` starts NULL.
    ///
    /// # Returns
    /// The stored ConfirmationToken with all fields populated
    pub async fn create(&self, token: CreateConfirmationToken) -> Result<ConfirmationToken> {
        let created = sqlx::query_as::<_, ConfirmationToken>(&format!(
            r#"
            INSERT INTO confirmation_tokens (id, token, user_id, issued_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(&token.id)
        .bind(&token.token)
        .bind(&token.user_id)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Retrieves a token by its opaque value.
    pub async fn get_by_token(&self, token_value: &str) -> Result<Option<ConfirmationToken>> {
        let token = sqlx::query_as::<_, ConfirmationToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM confirmation_tokens WHERE token = ?"
        ))
        .bind(token_value)
        .fetch_optional(self.pool)
        .await?;

        Ok(token)
    }

    /// Compare-and-set consumption: stamps `confirmed_at` only if it is still
    /// NULL. Under concurrent calls with the same value exactly one update
    /// reports a changed row.
    ///
    /// # Returns
    /// `true` when this caller won the transition
    pub async fn consume_atomically(
        &self,
        token_value: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE confirmation_tokens SET confirmed_at = ? WHERE token = ? AND confirmed_at IS NULL",
        )
        .bind(now)
        .bind(token_value)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Transaction-scoped variant of [`Self::consume_atomically`], for flows
    /// that pair the consumption with an account mutation.
    pub async fn consume_in_tx(
        &self,
        conn: &mut SqliteConnection,
        token_value: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE confirmation_tokens SET confirmed_at = ? WHERE token = ? AND confirmed_at IS NULL",
        )
        .bind(now)
        .bind(token_value)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// All tokens ever issued to a user, newest first.
    pub async fn get_tokens_for_user(&self, user_id: &str) -> Result<Vec<ConfirmationToken>> {
        let tokens = sqlx::query_as::<_, ConfirmationToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM confirmation_tokens WHERE user_id = ? ORDER BY issued_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(tokens)
    }

    /// Get total count of tokens issued to a user
    pub async fn count_for_user(&self, user_id: &str) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM confirmation_tokens WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count as u64)
    }
}
