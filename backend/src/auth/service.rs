//! Core business logic for the authentication system.
//!
//! Orchestrates signup, signin, email confirmation, verification resend,
//! password reset, and refresh-token exchange. This is the only place that
//! composes the token services with account mutations; the token services
//! never call each other.

use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::{CreateUser, User, UserStatus};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::confirmation_token_service::ConfirmationTokenService;
use crate::services::email_service::{EmailSender, EmailService};
use crate::services::refresh_token_service::RefreshTokenService;
use crate::utils::jwt::JwtUtils;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Verified against when signin hits an unknown email, so both rejection
/// paths cost one bcrypt comparison.
const DUMMY_HASH: &str = "$2b$12$eTSzEoc1Y9RJS5hWmWN6UuIn1eVQpyHNqcW6kDpGrgbWOyLoaXmfu";

/// Authentication service for handling signup, signin, and token flows
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    jwt_utils: JwtUtils,
    config: Config,
    mailer: Option<Arc<dyn EmailSender>>,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService instance
    pub fn new(pool: &'a SqlitePool, config: &Config) -> Self {
        let mailer: Option<Arc<dyn EmailSender>> = match config.email_config() {
            Some(email_config) => match EmailService::new(email_config) {
                Ok(service) => Some(Arc::new(service)),
                Err(e) => {
                    tracing::warn!("SMTP mailer unavailable: {}", e);
                    None
                }
            },
            None => {
                tracing::warn!("SMTP not configured; verification emails will not be sent");
                None
            }
        };

        AuthService {
            pool,
            jwt_utils: JwtUtils::new(config),
            config: config.clone(),
            mailer,
        }
    }

    #[cfg(test)]
    pub fn with_mailer(mut self, mailer: Arc<dyn EmailSender>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Register a new account and mint its email-verification token.
    ///
    /// The account starts out disabled until the token is confirmed. Email
    /// dispatch happens after the state is persisted and never fails the
    /// signup; the response reports whether it went out.
    pub async fn signup(&self, request: RegistrationRequest) -> ServiceResult<RegistrationResponse> {
        // Validate input
        if let Err(validation_errors) = request.validate() {
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
        if repo.email_exists(&request.email).await? {
            return Err(ServiceError::already_exists("User", &request.email));
        }

        let email = request.email.clone();
        let password_hash = Self::hash_password(&request.password)?;
        let create_user = CreateUser {
            id: Uuid::now_v7().to_string(),
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
        };

        let user = repo.create_user(create_user).await.map_err(|e| {
            let error_msg = e.to_string();
            if error_msg.contains("UNIQUE constraint failed:") {
                ServiceError::already_exists("User", &email)
            } else {
                ServiceError::from(e)
            }
        })?;

        let token = ConfirmationTokenService::new(self.pool)
            .issue(
                &user.id,
                Duration::minutes(self.config.confirmation_token_ttl_minutes),
            )
            .await?;

        let email_sent = self.try_send_verification_email(&user, &token.token).await;

        Ok(RegistrationResponse {
            message: format!(
                "User {} registered successfully. Check your email to verify the account",
                user.full_name()
            ),
            token: self
                .config
                .expose_confirmation_tokens
                .then_some(token.token),
            email_sent,
        })
    }

    /// Authenticate a user and hand out access plus refresh tokens.
    ///
    /// Unknown email, wrong password, and deleted accounts all come back as
    /// the same `InvalidCredentials`; the distinction only reaches the debug
    /// log.
    pub async fn signin(
        &self,
        request: AuthenticationRequest,
    ) -> ServiceResult<AuthenticationResponse> {
        // Validate input
        if let Err(validation_errors) = request.validate() {
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
        let user = match repo.get_user_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                let _ = Self::verify_password(&request.password, DUMMY_HASH);
                tracing::debug!("Signin rejected: no account for {}", request.email);
                return Err(ServiceError::InvalidCredentials);
            }
        };

        if !Self::verify_password(&request.password, &user.password_hash)? {
            tracing::debug!("Signin rejected: wrong password for {}", request.email);
            return Err(ServiceError::InvalidCredentials);
        }

        match user.status {
            UserStatus::Deleted => {
                tracing::debug!("Signin rejected: deleted account {}", user.id);
                return Err(ServiceError::InvalidCredentials);
            }
            UserStatus::Disabled => {
                return Err(ServiceError::validation(
                    "Account is not verified. Check your email or request a new verification link",
                ));
            }
            UserStatus::Active => {}
        }
        if user.locked {
            return Err(ServiceError::validation("Account is locked"));
        }

        let access_token = self.jwt_utils.generate_token(&user)?;
        let refresh = RefreshTokenService::new(self.pool, &self.config)
            .issue(&user.id)
            .await?;

        Ok(AuthenticationResponse {
            message: "Signin successful".to_string(),
            access_token,
            refresh_token: refresh.token,
            expires_in: self.jwt_utils.expires_in_seconds(),
            user: UserResponse::from(user),
        })
    }

    /// Redeem an email-verification token and activate its account.
    ///
    /// The token consumption and the account activation commit together or
    /// not at all.
    pub async fn confirm_token(&self, token_value: &str) -> ServiceResult<GeneralResponse> {
        let now = Utc::now();
        let token_service = ConfirmationTokenService::new(self.pool);
        let token = token_service.check_consumable(token_value, now).await?;

        let mut tx = self.pool.begin().await?;
        token_service.consume_in_tx(&mut tx, token_value, now).await?;
        let activated = UserRepository::new(self.pool)
            .activate_in_tx(&mut tx, &token.user_id, now)
            .await?;
        if !activated {
            return Err(ServiceError::not_found("User", &token.user_id));
        }
        tx.commit().await?;

        Ok(GeneralResponse::new(
            "Email confirmed successfully. You can now sign in",
        ))
    }

    /// Mint a fresh verification token for an unconfirmed account.
    ///
    /// Earlier unconsumed tokens stay valid until they expire on their own.
    pub async fn resend_verification(&self, request: EmailRequest) -> ServiceResult<GeneralResponse> {
        // Validate input
        if let Err(validation_errors) = request.validate() {
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

        let user = UserRepository::new(self.pool)
            .get_user_by_email(&request.email)
            .await?
            .filter(|user| user.status != UserStatus::Deleted)
            .ok_or_else(|| ServiceError::not_found("User with email", &request.email))?;

        let token = ConfirmationTokenService::new(self.pool)
            .issue(
                &user.id,
                Duration::minutes(self.config.confirmation_token_ttl_minutes),
            )
            .await?;

        self.try_send_verification_email(&user, &token.token).await;

        Ok(GeneralResponse::new(
            "Verification token resent. Check your email",
        ))
    }

    /// Reset a forgotten password by redeeming a confirmation token.
    ///
    /// The token consumption and the password-hash replacement commit
    /// together or not at all. A token that was already consumed reads as
    /// expired here; reset links are strictly single-use.
    pub async fn forgot_password(
        &self,
        request: PasswordResetRequest,
    ) -> ServiceResult<GeneralResponse> {
        // Validate input
        if let Err(validation_errors) = request.validate() {
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

        if request.new_password != request.confirm_password {
            return Err(ServiceError::PasswordMismatch);
        }

        let now = Utc::now();
        let token_service = ConfirmationTokenService::new(self.pool);
        let token = token_service
            .check_consumable(&request.token, now)
            .await
            .map_err(Self::reset_token_error)?;

        let password_hash = Self::hash_password(&request.new_password)?;

        let mut tx = self.pool.begin().await?;
        token_service
            .consume_in_tx(&mut tx, &request.token, now)
            .await
            .map_err(Self::reset_token_error)?;
        let updated = UserRepository::new(self.pool)
            .set_password_hash_in_tx(&mut tx, &token.user_id, &password_hash, now)
            .await?;
        if !updated {
            return Err(ServiceError::not_found("User", &token.user_id));
        }
        tx.commit().await?;

        Ok(GeneralResponse::new(
            "Password reset successfully. You can now sign in",
        ))
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn refresh_token(
        &self,
        request: RefreshTokenRequest,
    ) -> ServiceResult<RefreshTokenResponse> {
        // Validate input
        if let Err(validation_errors) = request.validate() {
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

        let user = RefreshTokenService::new(self.pool, &self.config)
            .validate(&request.refresh_token)
            .await?;

        if !user.is_active() {
            return Err(ServiceError::validation("User account is inactive"));
        }

        let access_token = self.jwt_utils.generate_token(&user)?;

        Ok(RefreshTokenResponse {
            access_token,
            expires_in: self.jwt_utils.expires_in_seconds(),
        })
    }

    /// Revoke a refresh token so it can no longer be exchanged.
    pub async fn logout(&self, request: RefreshTokenRequest) -> ServiceResult<GeneralResponse> {
        RefreshTokenService::new(self.pool, &self.config)
            .revoke(&request.refresh_token)
            .await?;

        Ok(GeneralResponse::new("Logged out successfully"))
    }

    /// Dispatch the verification email without letting a failure reach the
    /// caller. Returns whether the email actually went out.
    async fn try_send_verification_email(&self, user: &User, token: &str) -> bool {
        let mailer = match &self.mailer {
            Some(mailer) => mailer,
            None => {
                tracing::warn!(
                    "No mailer configured; skipping verification email for {}",
                    user.email
                );
                return false;
            }
        };

        match mailer
            .send_verification_email(&user.email, &user.full_name(), token)
            .await
        {
            Ok(()) => {
                tracing::info!("Verification email sent to {}", user.email);
                true
            }
            Err(e) => {
                tracing::error!("Failed to send verification email to {}: {}", user.email, e);
                false
            }
        }
    }

    /// A consumed reset token reads as expired; reset links are single-use.
    fn reset_token_error(error: ServiceError) -> ServiceError {
        match error {
            ServiceError::AlreadyConfirmed => ServiceError::TokenExpired,
            other => other,
        }
    }

    /// Function to hash a password before storing in database
    fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    /// Function to verify a password against the stored hash
    fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
        verify(password, hash).map_err(|e| {
            ServiceError::internal_error(format!("Password verification failed: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{file_pool, memory_pool};
    use crate::repositories::confirmation_token_repository::ConfirmationTokenRepository;
    use crate::repositories::refresh_token_repository::RefreshTokenRepository;
    use async_trait::async_trait;
    use futures::future::join_all;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl EmailSender for RecordingMailer {
        async fn send_verification_email(
            &self,
            recipient_email: &str,
            _recipient_name: &str,
            token: &str,
        ) -> ServiceResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient_email.to_string(), token.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl EmailSender for FailingMailer {
        async fn send_verification_email(
            &self,
            _recipient_email: &str,
            _recipient_name: &str,
            _token: &str,
        ) -> ServiceResult<()> {
            Err(ServiceError::external_service("SMTP connection refused"))
        }
    }

    fn registration(email: &str) -> RegistrationRequest {
        RegistrationRequest {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "initial-pw".to_string(),
        }
    }

    fn credentials(email: &str, password: &str) -> AuthenticationRequest {
        AuthenticationRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Signup plus confirmation, returning the active user.
    async fn signed_up_active(service: &AuthService<'_>, pool: &SqlitePool, email: &str) -> User {
        let response = service.signup(registration(email)).await.unwrap();
        service
            .confirm_token(&response.token.unwrap())
            .await
            .unwrap();
        UserRepository::new(pool)
            .get_user_by_email(email)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn signup_creates_disabled_account_with_pending_token() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        let response = service.signup(registration("new@example.com")).await.unwrap();
        assert!(!response.email_sent);
        assert!(response.message.contains("Test User"));

        let user = UserRepository::new(&pool)
            .get_user_by_email("new@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.status, UserStatus::Disabled);
        assert!(!user.locked);

        let token_value = response.token.unwrap();
        let stored = ConfirmationTokenRepository::new(&pool)
            .get_by_token(&token_value)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, user.id);
        assert!(stored.confirmed_at.is_none());
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email_without_side_effects() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        service.signup(registration("dup@example.com")).await.unwrap();
        let user = UserRepository::new(&pool)
            .get_user_by_email("dup@example.com")
            .await
            .unwrap()
            .unwrap();

        let mut second = registration("dup@example.com");
        second.first_name = "Other".to_string();
        let err = service.signup(second).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        let unchanged = UserRepository::new(&pool)
            .get_user_by_email("dup@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.id, user.id);
        assert_eq!(unchanged.first_name, "Test");
        let tokens = ConfirmationTokenRepository::new(&pool)
            .count_for_user(&user.id)
            .await
            .unwrap();
        assert_eq!(tokens, 1);
    }

    #[tokio::test]
    async fn signup_dispatches_verification_email_when_mailer_present() {
        let pool = memory_pool().await;
        let recorder = RecordingMailer::new();
        let service =
            AuthService::new(&pool, &Config::for_tests()).with_mailer(recorder.clone());

        let response = service
            .signup(registration("mailed@example.com"))
            .await
            .unwrap();
        assert!(response.email_sent);

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "mailed@example.com");
        assert_eq!(Some(sent[0].1.clone()), response.token);
    }

    #[tokio::test]
    async fn signup_survives_mailer_failure() {
        let pool = memory_pool().await;
        let service =
            AuthService::new(&pool, &Config::for_tests()).with_mailer(Arc::new(FailingMailer));

        let response = service
            .signup(registration("unreached@example.com"))
            .await
            .unwrap();
        assert!(!response.email_sent);

        // Account and token were persisted despite the dispatch failure.
        let user = UserRepository::new(&pool)
            .get_user_by_email("unreached@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            ConfirmationTokenRepository::new(&pool)
                .count_for_user(&user.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn signup_confirm_signin_end_to_end() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        let response = service.signup(registration("flow@example.com")).await.unwrap();
        let token_value = response.token.unwrap();

        let confirmed = service.confirm_token(&token_value).await.unwrap();
        assert!(confirmed.message.contains("confirmed"));

        let user = UserRepository::new(&pool)
            .get_user_by_email("flow@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.status, UserStatus::Active);

        // The token is gone for good now.
        let err = service.confirm_token(&token_value).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyConfirmed));

        let signin = service
            .signin(credentials("flow@example.com", "initial-pw"))
            .await
            .unwrap();
        assert_eq!(signin.user.email, "flow@example.com");
    }

    #[tokio::test]
    async fn confirm_with_unknown_token_reports_not_found() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        let err = service.confirm_token("never-issued").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn confirm_with_expired_token_leaves_account_disabled() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        service.signup(registration("late@example.com")).await.unwrap();
        let user = UserRepository::new(&pool)
            .get_user_by_email("late@example.com")
            .await
            .unwrap()
            .unwrap();

        let short_lived = ConfirmationTokenService::new(&pool)
            .issue(&user.id, Duration::seconds(1))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        let err = service.confirm_token(&short_lived.token).await.unwrap_err();
        assert!(matches!(err, ServiceError::TokenExpired));

        let unchanged = UserRepository::new(&pool)
            .get_user_by_id(&user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.status, UserStatus::Disabled);
    }

    #[tokio::test]
    async fn signin_issues_verifiable_tokens() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);
        let user = signed_up_active(&service, &pool, "tokens@example.com").await;

        let response = service
            .signin(credentials("tokens@example.com", "initial-pw"))
            .await
            .unwrap();
        assert_eq!(response.message, "Signin successful");
        assert!(response.expires_in > 0);

        let claims = JwtUtils::new(&config)
            .validate_token(&response.access_token)
            .unwrap();
        assert_eq!(claims.user_id(), user.id);

        let stored = RefreshTokenRepository::new(&pool)
            .get_by_token(&response.refresh_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, user.id);
    }

    #[tokio::test]
    async fn signin_rejections_are_externally_identical() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());
        signed_up_active(&service, &pool, "present@example.com").await;

        let unknown_email = service
            .signin(credentials("absent@example.com", "whatever"))
            .await
            .unwrap_err();
        let wrong_password = service
            .signin(credentials("present@example.com", "not-the-password"))
            .await
            .unwrap_err();

        assert!(matches!(unknown_email, ServiceError::InvalidCredentials));
        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert_eq!(format!("{}", unknown_email), format!("{}", wrong_password));
    }

    #[tokio::test]
    async fn signin_rejects_unverified_account() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        service
            .signup(registration("pending@example.com"))
            .await
            .unwrap();

        let err = service
            .signin(credentials("pending@example.com", "initial-pw"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { message } => assert!(message.contains("not verified")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn signin_rejects_locked_account() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());
        let user = signed_up_active(&service, &pool, "locked@example.com").await;

        UserRepository::new(&pool)
            .update_status(&user.id, UserStatus::Active, true)
            .await
            .unwrap();

        let err = service
            .signin(credentials("locked@example.com", "initial-pw"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { message } => assert!(message.contains("locked")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn signin_treats_deleted_account_as_invalid_credentials() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());
        let user = signed_up_active(&service, &pool, "erased@example.com").await;

        let mut tx = pool.begin().await.unwrap();
        UserRepository::new(&pool)
            .soft_delete_in_tx(&mut tx, &user.id, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let err = service
            .signin(credentials("erased@example.com", "initial-pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn resend_keeps_older_tokens_valid() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        let first = service
            .signup(registration("eager@example.com"))
            .await
            .unwrap()
            .token
            .unwrap();

        service
            .resend_verification(EmailRequest {
                email: "eager@example.com".to_string(),
            })
            .await
            .unwrap();

        let user = UserRepository::new(&pool)
            .get_user_by_email("eager@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            ConfirmationTokenRepository::new(&pool)
                .count_for_user(&user.id)
                .await
                .unwrap(),
            2
        );

        // The original token still confirms the account.
        service.confirm_token(&first).await.unwrap();
        let activated = UserRepository::new(&pool)
            .get_user_by_id(&user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(activated.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn resend_for_unknown_email_reports_not_found() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());

        let err = service
            .resend_verification(EmailRequest {
                email: "stranger@example.com".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn forgot_password_mismatch_leaves_everything_untouched() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());
        let user = signed_up_active(&service, &pool, "careful@example.com").await;

        let reset_token = ConfirmationTokenService::new(&pool)
            .issue(&user.id, Duration::minutes(15))
            .await
            .unwrap();

        let err = service
            .forgot_password(PasswordResetRequest {
                token: reset_token.token.clone(),
                new_password: "replacement-pw".to_string(),
                confirm_password: "different-pw".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PasswordMismatch));

        // The old password still signs in and the token is still live.
        service
            .signin(credentials("careful@example.com", "initial-pw"))
            .await
            .unwrap();
        let untouched = ConfirmationTokenRepository::new(&pool)
            .get_by_token(&reset_token.token)
            .await
            .unwrap()
            .unwrap();
        assert!(untouched.confirmed_at.is_none());
    }

    #[tokio::test]
    async fn forgot_password_rotates_hash_and_consumes_token() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());
        let user = signed_up_active(&service, &pool, "reset@example.com").await;

        let reset_token = ConfirmationTokenService::new(&pool)
            .issue(&user.id, Duration::minutes(15))
            .await
            .unwrap();

        service
            .forgot_password(PasswordResetRequest {
                token: reset_token.token.clone(),
                new_password: "rotated-pw".to_string(),
                confirm_password: "rotated-pw".to_string(),
            })
            .await
            .unwrap();

        let old_pw = service
            .signin(credentials("reset@example.com", "initial-pw"))
            .await
            .unwrap_err();
        assert!(matches!(old_pw, ServiceError::InvalidCredentials));
        service
            .signin(credentials("reset@example.com", "rotated-pw"))
            .await
            .unwrap();

        // Reset links are single-use: a second redemption reads as expired.
        let err = service
            .forgot_password(PasswordResetRequest {
                token: reset_token.token,
                new_password: "again-pw".to_string(),
                confirm_password: "again-pw".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::TokenExpired));
    }

    #[tokio::test]
    async fn forgot_password_rejects_expired_token() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());
        let user = signed_up_active(&service, &pool, "slow@example.com").await;

        let reset_token = ConfirmationTokenService::new(&pool)
            .issue(&user.id, Duration::seconds(1))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        let err = service
            .forgot_password(PasswordResetRequest {
                token: reset_token.token,
                new_password: "too-late-pw".to_string(),
                confirm_password: "too-late-pw".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::TokenExpired));

        service
            .signin(credentials("slow@example.com", "initial-pw"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn refresh_and_logout_round_trip() {
        let pool = memory_pool().await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);
        let user = signed_up_active(&service, &pool, "session@example.com").await;

        let signin = service
            .signin(credentials("session@example.com", "initial-pw"))
            .await
            .unwrap();

        let refreshed = service
            .refresh_token(RefreshTokenRequest {
                refresh_token: signin.refresh_token.clone(),
            })
            .await
            .unwrap();
        let claims = JwtUtils::new(&config)
            .validate_token(&refreshed.access_token)
            .unwrap();
        assert_eq!(claims.user_id(), user.id);

        service
            .logout(RefreshTokenRequest {
                refresh_token: signin.refresh_token.clone(),
            })
            .await
            .unwrap();

        let err = service
            .refresh_token(RefreshTokenRequest {
                refresh_token: signin.refresh_token.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err = service
            .logout(RefreshTokenRequest {
                refresh_token: signin.refresh_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn refresh_rejects_account_disabled_after_signin() {
        let pool = memory_pool().await;
        let service = AuthService::new(&pool, &Config::for_tests());
        let user = signed_up_active(&service, &pool, "revoked@example.com").await;

        let signin = service
            .signin(credentials("revoked@example.com", "initial-pw"))
            .await
            .unwrap();

        UserRepository::new(&pool)
            .update_status(&user.id, UserStatus::Disabled, false)
            .await
            .unwrap();

        let err = service
            .refresh_token(RefreshTokenRequest {
                refresh_token: signin.refresh_token,
            })
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { message } => assert!(message.contains("inactive")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn concurrent_confirms_activate_exactly_once() {
        let (pool, _db_file) = file_pool(8).await;
        let config = Config::for_tests();
        let service = AuthService::new(&pool, &config);

        let token_value = service
            .signup(registration("stampede@example.com"))
            .await
            .unwrap()
            .token
            .unwrap();

        let attempts = join_all((0..8).map(|_| {
            let racer = AuthService::new(&pool, &config);
            let value = token_value.clone();
            async move { racer.confirm_token(&value).await }
        }))
        .await;

        let winners = attempts.iter().filter(|outcome| outcome.is_ok()).count();
        assert_eq!(winners, 1);
        for outcome in attempts.iter().filter(|outcome| outcome.is_err()) {
            assert!(matches!(
                outcome.as_ref().unwrap_err(),
                ServiceError::AlreadyConfirmed
            ));
        }

        let user = UserRepository::new(&pool)
            .get_user_by_email("stampede@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.status, UserStatus::Active);
    }
}
