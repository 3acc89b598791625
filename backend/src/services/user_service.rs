//! User self-service business logic.
//!
//! Profile reads, profile updates, password changes, and account deletion for
//! the authenticated user. Every mutation is owner-gated: a caller can only
//! act on their own account.

use crate::auth::models::{UpdatePasswordRequest, UpdateUserRequest};
use crate::database::models::{User, UserStatus};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::refresh_token_repository::RefreshTokenRepository;
use crate::repositories::user_repository::UserRepository;
use bcrypt::{DEFAULT_COST, hash};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    /// Creates a new UserService instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Retrieves the authenticated user's own profile.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the user doesn't exist or has been
    /// deleted
    pub async fn get_current_user(&self, user_id: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(user_id)
            .await?
            .filter(|user| user.status != UserStatus::Deleted)
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;
        Ok(user)
    }

    /// Replaces a user's profile fields with full validation.
    ///
    /// # Arguments
    /// * `requester_id` - ID of the authenticated caller
    /// * `target_id` - ID of the account being updated
    /// * `update` - Profile update data transfer object
    ///
    /// # Returns
    /// The updated User
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Requests aimed at someone else's account
    /// - Validation failures
    /// - An email already held by another user
    pub async fn update_user(
        &self,
        requester_id: &str,
        target_id: &str,
        update: UpdateUserRequest,
    ) -> ServiceResult<User> {
        Self::ensure_owner(requester_id, target_id)?;

        // Input validation using validator crate
        if let Err(validation_errors) = update.validate() {
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
        if repo
            .email_exists_excluding(&update.email, target_id)
            .await?
        {
            return Err(ServiceError::already_exists("User", &update.email));
        }

        let updated = repo
            .update_profile(target_id, &update.email, &update.first_name, &update.last_name)
            .await
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("UNIQUE constraint failed:") {
                    ServiceError::already_exists("User", &update.email)
                } else {
                    ServiceError::from(e)
                }
            })?
            .ok_or_else(|| ServiceError::not_found("User", target_id))?;

        Ok(updated)
    }

    /// Rotates the caller's password.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Requests aimed at someone else's account
    /// - Validation failures
    /// - Disagreeing password and confirmation fields
    pub async fn update_password(
        &self,
        requester_id: &str,
        target_id: &str,
        update: UpdatePasswordRequest,
    ) -> ServiceResult<()> {
        Self::ensure_owner(requester_id, target_id)?;

        // Input validation using validator crate
        if let Err(validation_errors) = update.validate() {
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

        if update.new_password != update.confirm_password {
            return Err(ServiceError::PasswordMismatch);
        }

        let password_hash = Self::hash_password(&update.new_password)?;
        let repo = UserRepository::new(self.pool);
        let updated = repo.set_password_hash(target_id, &password_hash).await?;
        if !updated {
            return Err(ServiceError::not_found("User", target_id));
        }

        Ok(())
    }

    /// Soft-deletes the caller's account and revokes all of their refresh
    /// tokens in the same transaction. The row stays behind with its email
    /// reserved so the address cannot be re-registered.
    pub async fn delete_user(&self, requester_id: &str, target_id: &str) -> ServiceResult<()> {
        Self::ensure_owner(requester_id, target_id)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let user_repo = UserRepository::new(self.pool);
        let deleted = user_repo.soft_delete_in_tx(&mut tx, target_id, now).await?;
        if !deleted {
            return Err(ServiceError::not_found("User", target_id));
        }

        let refresh_repo = RefreshTokenRepository::new(self.pool);
        let revoked = refresh_repo
            .delete_all_for_user_in_tx(&mut tx, target_id)
            .await?;

        tx.commit().await?;
        tracing::info!(
            "Deleted user {} and revoked {} refresh token(s)",
            target_id,
            revoked
        );

        Ok(())
    }

    /// Function to hash a password before storing in database
    ///
    /// # Errors
    /// Returns `ServiceError` if hashing fails
    fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    fn ensure_owner(requester_id: &str, target_id: &str) -> ServiceResult<()> {
        if requester_id != target_id {
            return Err(ServiceError::permission_denied(
                "You can only modify your own account",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CreateRefreshToken, CreateUser};
    use crate::database::test_support::memory_pool;
    use bcrypt::verify;
    use chrono::Duration;
    use uuid::Uuid;

    async fn seed_user(pool: &SqlitePool, email: &str, password: &str) -> User {
        UserRepository::new(pool)
            .create_user(CreateUser {
                id: Uuid::now_v7().to_string(),
                email: email.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                password_hash: hash(password, 4).unwrap(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn get_current_user_returns_own_profile() {
        let pool = memory_pool().await;
        let user = seed_user(&pool, "me@example.com", "pw").await;
        let service = UserService::new(&pool);

        let me = service.get_current_user(&user.id).await.unwrap();
        assert_eq!(me.email, "me@example.com");

        let err = service.get_current_user("missing-id").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_user_replaces_profile_fields() {
        let pool = memory_pool().await;
        let user = seed_user(&pool, "before@example.com", "pw").await;
        let service = UserService::new(&pool);

        let updated = service
            .update_user(
                &user.id,
                &user.id,
                UpdateUserRequest {
                    email: "after@example.com".to_string(),
                    first_name: "New".to_string(),
                    last_name: "Name".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "after@example.com");
        assert_eq!(updated.full_name(), "New Name");
    }

    #[tokio::test]
    async fn update_user_rejects_email_held_by_another_user() {
        let pool = memory_pool().await;
        let first = seed_user(&pool, "first@example.com", "pw").await;
        seed_user(&pool, "second@example.com", "pw").await;
        let service = UserService::new(&pool);

        let err = service
            .update_user(
                &first.id,
                &first.id,
                UpdateUserRequest {
                    email: "second@example.com".to_string(),
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn update_user_rejects_foreign_target() {
        let pool = memory_pool().await;
        let owner = seed_user(&pool, "owner@example.com", "pw").await;
        let other = seed_user(&pool, "other@example.com", "pw").await;
        let service = UserService::new(&pool);

        let err = service
            .update_user(
                &owner.id,
                &other.id,
                UpdateUserRequest {
                    email: "hijack@example.com".to_string(),
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn update_password_mismatch_leaves_hash_untouched() {
        let pool = memory_pool().await;
        let user = seed_user(&pool, "keep@example.com", "original-pw").await;
        let service = UserService::new(&pool);

        let err = service
            .update_password(
                &user.id,
                &user.id,
                UpdatePasswordRequest {
                    new_password: "new-pw".to_string(),
                    confirm_password: "different-pw".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PasswordMismatch));

        let stored = service.get_current_user(&user.id).await.unwrap();
        assert!(verify("original-pw", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn update_password_stores_new_hash() {
        let pool = memory_pool().await;
        let user = seed_user(&pool, "rotate@example.com", "original-pw").await;
        let service = UserService::new(&pool);

        service
            .update_password(
                &user.id,
                &user.id,
                UpdatePasswordRequest {
                    new_password: "brand-new-pw".to_string(),
                    confirm_password: "brand-new-pw".to_string(),
                },
            )
            .await
            .unwrap();

        let stored = service.get_current_user(&user.id).await.unwrap();
        assert!(verify("brand-new-pw", &stored.password_hash).unwrap());
        assert!(!verify("original-pw", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn delete_user_soft_deletes_and_revokes_refresh_tokens() {
        let pool = memory_pool().await;
        let user = seed_user(&pool, "leaving@example.com", "pw").await;
        let refresh_repo = RefreshTokenRepository::new(&pool);
        let now = Utc::now();
        refresh_repo
            .create(CreateRefreshToken {
                id: Uuid::now_v7().to_string(),
                token: "refresh-token-value-for-deletion".to_string(),
                user_id: user.id.clone(),
                created_at: now,
                expires_at: now + Duration::days(30),
            })
            .await
            .unwrap();

        let service = UserService::new(&pool);
        service.delete_user(&user.id, &user.id).await.unwrap();

        let err = service.get_current_user(&user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        assert_eq!(refresh_repo.count_for_user(&user.id).await.unwrap(), 0);

        // Deleting again finds nothing left to delete.
        let err = service.delete_user(&user.id, &user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        // The email stays reserved by the soft-deleted row.
        let exists = UserRepository::new(&pool)
            .email_exists("leaving@example.com")
            .await
            .unwrap();
        assert!(exists);
    }
}
