//! Domain-level errors.
//!
//! These errors represent schema and policy violations. They are independent
//! of infrastructure concerns (HTTP, database drivers).

use thiserror::Error;

/// Domain-specific errors for schema and policy violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was absent or blank
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// A value outside an enumerated set
    #[error("Value '{value}' is not a valid choice for '{field}'")]
    InvalidChoice { field: &'static str, value: String },

    /// Validation failed for a field or input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password policy rejected the credential; one message per failed rule
    #[error("Password error: {}", .0.join(" "))]
    Password(Vec<String>),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique value already exists (names the colliding field)
    #[error("{0} already exists")]
    Conflict(String),

    /// Internal domain error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create a password error from a single message
    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(vec![msg.into()])
    }

    /// Create an invalid choice error
    pub fn invalid_choice(field: &'static str, value: impl Into<String>) -> Self {
        DomainError::InvalidChoice {
            field,
            value: value.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>) -> Self {
        DomainError::NotFound(entity.into())
    }

    /// Create a conflict error
    pub fn conflict(entity: impl Into<String>) -> Self {
        DomainError::Conflict(entity.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
