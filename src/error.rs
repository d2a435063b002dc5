//! Error types for Equipool server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::request::{RequestEvent, RequestStatus};

/// Stable error codes reported to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    InvalidInput = 2,
    NotFound = 3,
    InsufficientStock = 4,
    InvalidTransition = 5,
    Unauthorized = 6,
    InvariantViolation = 7,
    NotAuthenticated = 8,
    DbFailure = 9,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: {requested} requested, {available} available")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Invalid transition: cannot {event} a {from} request")]
    InvalidTransition {
        from: RequestStatus,
        event: RequestEvent,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Error kind as reported to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            AppError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::InvariantViolation(_) => ErrorCode::InvariantViolation,
            AppError::Authentication(_) => ErrorCode::NotAuthenticated,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    /// Log the error at a level matching its kind.
    ///
    /// Invariant violations point at a bug or a conflicting concurrent edit and
    /// are reported at `error`; caller mistakes stay at `debug`.
    pub fn log(&self) {
        match self {
            AppError::InvariantViolation(msg) => {
                tracing::error!(kind = "invariant_violation", "{}", msg);
            }
            AppError::Database(e) => {
                tracing::error!(kind = "database", "Database error: {:?}", e);
            }
            AppError::Internal(msg) => {
                tracing::error!(kind = "internal", "Internal error: {}", msg);
            }
            other => {
                tracing::debug!(kind = ?other.code(), "{}", other);
            }
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InsufficientStock { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::Unauthorized(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::InvariantViolation(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
