//! Data structures for authentication-related entities.
//!
//! This module defines the request and response payloads for the signup,
//! signin, email confirmation, password reset, and token refresh flows,
//! plus the safe user view returned to clients.

use crate::database::models::{User, UserStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request payload
#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 255, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    /// Raw confirmation token, echoed only when the deployment opts in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Whether the verification email was actually dispatched
    pub email_sent: bool,
}

/// Signin request payload
#[derive(Debug, Deserialize, Validate)]
pub struct AuthenticationRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Signin response containing tokens and user info
#[derive(Debug, Serialize)]
pub struct AuthenticationResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64, // Token expiration in seconds
    pub user: UserResponse,
}

/// Request carrying only an email address
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

/// Password reset request redeemed with a confirmation token
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_password: String,
}

/// Password change request for an authenticated user
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_password: String,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 255, message = "Last name is required"))]
    pub last_name: String,
}

/// Token refresh request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token refresh response
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Generic acknowledgement response
#[derive(Debug, Serialize)]
pub struct GeneralResponse {
    pub message: String,
}

impl GeneralResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// User information returned to clients, without the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub status: UserStatus,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            email: user.email,
            full_name,
            status: user.status,
            locked: user.locked,
            created_at: user.created_at,
        }
    }
}
