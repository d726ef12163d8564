//! Unified error handling for the HTTP host and the account service.
//!
//! Provides a single error type that converts from domain and storage
//! errors and renders as an Axum JSON response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    /// Unique constraint collision, names the column that collided
    #[error("{0} already exists")]
    Conflict(String),

    // Validation
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Value '{value}' is not a valid choice for '{field}'")]
    InvalidChoice { field: &'static str, value: String },

    #[error("{0}")]
    Validation(String),

    #[error("{}", .0.join(" "))]
    PasswordPolicy(Vec<String>),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Invalid HTTP_HOST header: '{0}'")]
    DisallowedHost(String),

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(sea_orm::DbErr),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::MissingField(_) => "MISSING_FIELD",
            AppError::InvalidChoice { .. } => "INVALID_CHOICE",
            AppError::Validation(_) | AppError::PasswordPolicy(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::DisallowedHost(_) => "DISALLOWED_HOST",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::MissingField(_)
            | AppError::InvalidChoice { .. }
            | AppError::Validation(_)
            | AppError::PasswordPolicy(_)
            | AppError::BadRequest(_)
            | AppError::DisallowedHost(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::DisallowedHost(host) => {
                tracing::warn!(host = %host, "Rejected request for disallowed host");
                self.to_string()
            }
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Vec<String> {
        match self {
            AppError::PasswordPolicy(messages) => messages.clone(),
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::MissingField(field) => AppError::MissingField(field),
            DomainError::InvalidChoice { field, value } => AppError::InvalidChoice { field, value },
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::Password(messages) => AppError::PasswordPolicy(messages),
            DomainError::NotFound(entity) => AppError::NotFound(entity),
            DomainError::Conflict(field) => AppError::Conflict(field),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

// =============================================================================
// Storage Error Conversion
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
                AppError::Conflict(unique_field(&detail).to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

/// Columns guarded by a unique index, checked in this order against the
/// driver's violation message.
const UNIQUE_COLUMNS: &[&str] = &["email", "cnpj", "cpf"];

/// Pick the colliding column out of a driver message such as
/// `Duplicate entry 'x' for key 'usuario.email'` (MySQL) or
/// `UNIQUE constraint failed: usuario.cpf` (SQLite).
pub fn unique_field(detail: &str) -> &'static str {
    let detail = detail.to_lowercase();
    let key_part = detail
        .rsplit_once(" for key ")
        .map(|(_, key)| key.to_string())
        .or_else(|| {
            detail
                .split_once("unique constraint failed:")
                .map(|(_, cols)| cols.to_string())
        })
        .unwrap_or(detail);

    UNIQUE_COLUMNS
        .iter()
        .copied()
        .find(|column| key_part.contains(column))
        .unwrap_or("record")
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(entity.to_string()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        AppError::NotFound(entity.into())
    }

    pub fn conflict(field: impl Into<String>) -> Self {
        AppError::Conflict(field.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
