//! Refresh-token business logic service.
//!
//! Stores opaque long-lived tokens that let clients mint new access tokens
//! without re-sending credentials. Expired rows are deleted lazily when a
//! validation attempt trips over them; there is no background sweeper.

use crate::config::Config;
use crate::database::models::{CreateRefreshToken, RefreshToken, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::generate_random_string::generate_random_string;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const TOKEN_VALUE_LENGTH: usize = 32;

pub struct RefreshTokenService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
    /// Token lifetime in days
    ttl_days: i64,
}

impl<'a> RefreshTokenService<'a> {
    /// Creates a new RefreshTokenService instance.
    pub fn new(pool: &'a SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            ttl_days: config.refresh_token_ttl_days,
        }
    }

    /// Mints and persists a refresh token for a user.
    pub async fn issue(&self, user_id: &str) -> ServiceResult<RefreshToken> {
        let now = Utc::now();
        let create_token = CreateRefreshToken {
            id: Uuid::now_v7().to_string(),
            token: generate_random_string(TOKEN_VALUE_LENGTH),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + Duration::days(self.ttl_days),
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

        let repo = RefreshTokenRepository::new(self.pool);
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

    /// Resolves a refresh token to its owning user.
    ///
    /// An expired token is deleted on the spot before reporting
    /// `TokenExpired`, so dead rows never outlive their next use.
    pub async fn validate(&self, token_value: &str) -> ServiceResult<User> {
        let repo = RefreshTokenRepository::new(self.pool);
        let token = repo
            .get_by_token(token_value)
            .await?
            .ok_or_else(|| ServiceError::not_found("Refresh token", token_value))?;

        if token.is_expired_at(Utc::now()) {
            repo.delete_by_token(token_value).await?;
            return Err(ServiceError::TokenExpired);
        }

        let user = UserRepository::new(self.pool)
            .get_user_by_id(&token.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", &token.user_id))?;

        Ok(user)
    }

    /// Deletes a refresh token so it can no longer be exchanged.
    pub async fn revoke(&self, token_value: &str) -> ServiceResult<()> {
        let repo = RefreshTokenRepository::new(self.pool);
        let deleted = repo.delete_by_token(token_value).await?;
        if !deleted {
            return Err(ServiceError::not_found("Refresh token", token_value));
        }

        Ok(())
    }
}
