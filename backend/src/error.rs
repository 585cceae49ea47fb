//! Error handling for the inventory tracking backend
//!
//! Every failure is scoped to a single request and rendered as
//! `{"error": {"code", "message", "field"?}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::LedgerError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("No credential provided")]
    MissingCredential,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Invalid email or password")]
    InvalidLogin,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Business logic errors
    #[error("Insufficient stock. Available: {available}")]
    InsufficientStock { available: i32 },

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidQuantity(_) => AppError::validation("quantity", err.to_string()),
            LedgerError::InsufficientStock { available, .. } => {
                AppError::InsufficientStock { available }
            }
            LedgerError::StockOverflow(_) => AppError::validation("quantity", err.to_string()),
            LedgerError::UnknownProduct(_) => AppError::Internal(err.to_string()),
            LedgerError::InvalidTransition { .. } => {
                AppError::InvalidStateTransition(err.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|f| f.to_string())
            .unwrap_or_default();
        AppError::Validation {
            field,
            message: errors.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("MISSING_CREDENTIAL", "No token provided"),
            ),
            AppError::InvalidCredential => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("INVALID_CREDENTIAL", "Invalid token"),
            ),
            AppError::InvalidLogin => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_LOGIN", "Invalid email or password"),
            ),
            AppError::AccessDenied(msg) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("ACCESS_DENIED", msg.clone()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", msg.clone()),
            ),
            AppError::InsufficientStock { available } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    format!("Insufficient stock. Available: {}", available),
                ),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone()),
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("EXTERNAL_SERVICE_ERROR", msg.clone()),
            ),
            AppError::Database(err) => database_error(err),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Constraint violations become conflicts; anything else surfaces the
/// driver message as a persistence failure.
fn database_error(err: &sqlx::Error) -> (StatusCode, ErrorDetail) {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_foreign_key_violation() {
            return (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", "Record is still referenced by other records"),
            );
        }
        if db_err.is_unique_violation() {
            return (
                StatusCode::CONFLICT,
                ErrorDetail::new("DUPLICATE_ENTRY", "A record with these values already exists"),
            );
        }
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorDetail::new("DATABASE_ERROR", err.to_string()),
    )
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
