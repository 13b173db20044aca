use axum::http::StatusCode;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::response::ApiResponse;

/// Message returned for every authentication failure, whatever the cause.
pub const REAUTHENTICATE_MESSAGE: &str = "Authentication required - please log in again";

/// Error taxonomy for the authentication subsystem.
///
/// Storage and crypto failures below the orchestrator are converted into
/// one of these variants; nothing else reaches the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token required")]
    AccessTokenRequired,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Account inactive")]
    AccountInactive,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccessTokenRequired => StatusCode::UNAUTHORIZED,
            AuthError::InvalidOrExpiredToken
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::AccountInactive => StatusCode::FORBIDDEN,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccessTokenRequired
            | AuthError::InvalidOrExpiredToken
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::AccountInactive => "UNAUTHENTICATED",
            AuthError::Conflict(_) => "CONFLICT",
            AuthError::NotFound(_) => "NOT_FOUND",
            AuthError::Internal(_) | AuthError::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// True for the failures the Access Guard can produce.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::AccessTokenRequired
                | AuthError::InvalidOrExpiredToken
                | AuthError::SessionNotFound
                | AuthError::SessionExpired
                | AuthError::AccountInactive
        )
    }

    /// The message shown to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Validation(msg) | AuthError::Conflict(msg) | AuthError::NotFound(msg) => {
                msg.clone()
            }
            AuthError::InvalidCredentials => "Invalid credentials".to_string(),
            AuthError::Internal(_) | AuthError::Database(_) => {
                "An internal error occurred".to_string()
            }
            _ => REAUTHENTICATE_MESSAGE.to_string(),
        }
    }

    /// Convert a storage error, turning unique-key violations into `Conflict`.
    pub fn from_write(err: DbErr, conflict_message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AuthError::Conflict(conflict_message.to_string())
            }
            _ => AuthError::Database(err),
        }
    }
}

/// Error detail for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        match &self {
            AuthError::Internal(_) | AuthError::Database(_) => {
                tracing::error!(error = %self, "request failed");
            }
            e if e.is_authentication_failure() => {
                tracing::info!(reason = %self, "authentication rejected");
            }
            _ => {
                tracing::debug!(error = %self, "request rejected");
            }
        }

        let body = ApiResponse::<()>::error(self.error_code(), self.public_message());

        (status, axum::Json(body)).into_response()
    }
}
