//! Global application error types and handlers.
//!
//! This module defines custom error types that are used across the entire
//! backend application and provides mechanisms for consistent error handling
//! and response formatting.

use thiserror::Error;

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("{entity} already exists: {identifier}")]
    AlreadyExists { entity: String, identifier: String },

    /// Rejected credential pair. Unknown account and wrong password both map
    /// here so the response does not reveal which one it was.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Email already confirmed")]
    AlreadyConfirmed,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Backing store could not be reached in time. The only variant a caller
    /// may retry with backoff.
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Database error: {source}")]
    Database { source: anyhow::Error },

    #[error("External service error: {message}")]
    ExternalService { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn already_exists(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalService {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Whether a caller may retry the failed operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Pool exhaustion and transport faults are retryable; everything else coming
/// out of sqlx is a real database error.
fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
    )
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            Self::StoreUnavailable {
                message: err.to_string(),
            }
        } else {
            Self::Database {
                source: anyhow::Error::new(err),
            }
        }
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<sqlx::Error>() {
            Some(sqlx_err) if is_transient(sqlx_err) => Self::StoreUnavailable {
                message: err.to_string(),
            },
            _ => Self::Database { source: err },
        }
    }
}
