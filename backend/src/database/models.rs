//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models;
//! responses go through the DTOs in `auth::models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: UserStatus,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account may hold a session: confirmed and not locked.
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active && !self.locked
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Account lifecycle. A single column rules out contradictory combinations
/// such as a deleted account that is still enabled; `locked` is tracked
/// separately because it can apply to any stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")] // Store as TEXT in SQLite
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
    Deleted,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Disabled => write!(f, "disabled"),
            UserStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "disabled" => Ok(UserStatus::Disabled),
            "deleted" => Ok(UserStatus::Deleted),
            _ => Err(format!("Invalid user status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub id: String,

    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "First name must be between 1-255 characters"
    ))]
    pub first_name: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Last name must be between 1-255 characters"
    ))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Password hash is required"))]
    pub password_hash: String,
}

/// Single-use token backing email confirmation and password reset.
/// `confirmed_at` moves from NULL to a timestamp exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConfirmationToken {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl ConfirmationToken {
    /// Consumable only while unconfirmed and before expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.confirmed_at.is_none() && now < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConfirmationToken {
    #[validate(length(min = 1, message = "Token ID is required"))]
    pub id: String,

    #[validate(length(min = 20, message = "Token value too short"))]
    pub token: String,

    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,

    pub issued_at: DateTime<Utc>,

    #[validate(custom(function = "validate_expiry_time"))]
    pub expires_at: DateTime<Utc>,
}

/// Opaque session-renewal token. Never updated in place; deleted on logout or
/// when found expired.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRefreshToken {
    #[validate(length(min = 1, message = "Token ID is required"))]
    pub id: String,

    #[validate(length(min = 20, message = "Token value too short"))]
    pub token: String,

    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,

    pub created_at: DateTime<Utc>,

    #[validate(custom(function = "validate_expiry_time"))]
    pub expires_at: DateTime<Utc>,
}

/// Validates that the expiry time is in the future
fn validate_expiry_time(expires_at: &DateTime<Utc>) -> Result<(), validator::ValidationError> {
    if expires_at <= &Utc::now() {
        return Err(validator::ValidationError::new(
            "expires_at must be in the future",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    #[test]
    fn user_status_round_trips_through_strings() {
        for status in [UserStatus::Active, UserStatus::Disabled, UserStatus::Deleted] {
            let parsed = UserStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
        assert!(UserStatus::from_str("enabled").is_err());
    }

    #[test]
    fn confirmation_token_validity_window() {
        let now = Utc::now();
        let token = ConfirmationToken {
            id: "t1".to_string(),
            token: "value".to_string(),
            user_id: "u1".to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(15),
            confirmed_at: None,
        };
        assert!(token.is_valid_at(now));
        // Expiry boundary is exclusive.
        assert!(!token.is_valid_at(token.expires_at));

        let consumed = ConfirmationToken {
            confirmed_at: Some(now),
            ..token
        };
        assert!(!consumed.is_valid_at(now));
    }

    #[test]
    fn locked_account_is_not_active() {
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            password_hash: "hash".to_string(),
            status: UserStatus::Active,
            locked: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert!(!user.is_active());
    }
}
