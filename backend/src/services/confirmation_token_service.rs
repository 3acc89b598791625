//! Confirmation-token business logic service.
//!
//! Mints and consumes the single-use tokens behind email verification and
//! password reset. Consumption is the only mutation and is compare-and-set
//! guarded, so two callers racing on the same value can never both win.

use crate::database::models::{ConfirmationToken, CreateConfirmationToken};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::confirmation_token_repository::ConfirmationTokenRepository;
use crate::utils::generate_random_string::generate_random_string;
use chrono::{DateTime, Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;
use validator::Validate;

/// Length of the opaque token value. 32 alphanumeric characters carry about
/// 190 bits of entropy, comfortably past collision concerns.
const TOKEN_VALUE_LENGTH: usize = 32;

pub struct ConfirmationTokenService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> ConfirmationTokenService<'a> {
    /// Creates a new ConfirmationTokenService instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Mints and persists a fresh token for a user with the given lifetime.
    ///
    /// # Returns
    /// The stored ConfirmationToken, unconsumed and expiring at now + ttl
    pub async fn issue(&self, user_id: &str, ttl: Duration) -> ServiceResult<ConfirmationToken> {
        let now = Utc::now();
        let create_token = CreateConfirmationToken {
            id: Uuid::now_v7().to_string(),
            token: generate_random_string(TOKEN_VALUE_LENGTH),
            user_id: user_id.to_string(),
            issued_at: now,
            expires_at: now + ttl,
        };

        // Input validation using validator crate
        if let Err(validation_errors) = create_token.validate() {
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

        let repo = ConfirmationTokenRepository::new(self.pool);
        let token = repo.create(create_token).await.map_err(|e| {
            let error_msg = e.to_string();
            if error_msg.contains("UNIQUE constraint failed:") {
                ServiceError::internal_error("Generated token value collided; retry the request")
            } else {
                ServiceError::from(e)
            }
        })?;

        Ok(token)
    }

    /// Retrieves a token by its opaque value without touching it.
    pub async fn lookup(&self, token_value: &str) -> ServiceResult<Option<ConfirmationToken>> {
        let repo = ConfirmationTokenRepository::new(self.pool);
        let token = repo.get_by_token(token_value).await?;

        Ok(token)
    }

    /// Looks a token up and classifies whether it can still be consumed at
    /// `now`: missing, already consumed, and expired each get their own error.
    pub async fn check_consumable(
        &self,
        token_value: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<ConfirmationToken> {
        let token = self
            .lookup(token_value)
            .await?
            .ok_or_else(|| ServiceError::not_found("Confirmation token", token_value))?;

        if token.is_valid_at(now) {
            return Ok(token);
        }
        if token.confirmed_at.is_some() {
            Err(ServiceError::AlreadyConfirmed)
        } else {
            Err(ServiceError::TokenExpired)
        }
    }

    /// Consumes a token: the one-way NULL to timestamp transition on
    /// `confirmed_at`. Exactly one concurrent caller wins; the rest see
    /// `AlreadyConfirmed`.
    pub async fn consume(&self, token_value: &str) -> ServiceResult<ConfirmationToken> {
        let now = Utc::now();
        let token = self.check_consumable(token_value, now).await?;

        let repo = ConfirmationTokenRepository::new(self.pool);
        let won = repo.consume_atomically(token_value, now).await?;
        if !won {
            // Another caller consumed it between the check and the update.
            return Err(ServiceError::AlreadyConfirmed);
        }

        Ok(ConfirmationToken {
            confirmed_at: Some(now),
            ..token
        })
    }

    /// Consumes a token inside an open transaction, for flows that must pair
    /// the consumption with an account mutation. Callers classify beforehand
    /// with [`Self::check_consumable`]; this only performs the guarded update.
    /// It must be the transaction's first write so the row lock is taken on a
    /// fresh snapshot.
    pub async fn consume_in_tx(
        &self,
        conn: &mut SqliteConnection,
        token_value: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<()> {
        let repo = ConfirmationTokenRepository::new(self.pool);
        let won = repo.consume_in_tx(conn, token_value, now).await?;
        if !won {
            return Err(ServiceError::AlreadyConfirmed);
        }

        Ok(())
    }
}
