//! Structured error types for API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Whether internal error detail is sent to clients. Off unless the
/// operator sets `server.expose_internal_errors`.
static EXPOSE_INTERNAL: AtomicBool = AtomicBool::new(false);

pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL.store(expose, Ordering::Relaxed);
}

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // No or invalid session
    Unauthorized,

    // Authenticated but denied by policy
    Forbidden,

    // Absent, or present but not visible to the caller
    NotFound,

    // Invalid input
    MissingRequiredField,
    InvalidFieldValue,

    // Duplicate unique key or entity still referenced
    Conflict,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::DatabaseError | ErrorCode::InternalError)
    }
}

/// Structured error for API responses.
#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", what))
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// Allow using ? with anyhow errors from the store layer
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => ApiError::from(sql_err),
                Err(err) => ApiError::internal(err),
            },
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            ApiError::conflict("a record with the same key already exists")
        } else {
            ApiError::database(err)
        }
    }
}

/// True when the error is a UNIQUE or PRIMARY KEY constraint failure.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.extended_code,
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        ),
        _ => false,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = if self.code.is_internal() {
            tracing::error!(code = ?self.code, error = %self.message, "request failed");
            if EXPOSE_INTERNAL.load(Ordering::Relaxed) {
                self
            } else {
                ApiError::new(self.code, "internal server error")
            }
        } else {
            self
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for board operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_http_statuses() {
        assert_eq!(ErrorCode::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::MissingRequiredField.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidFieldValue.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::DatabaseError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn serializes_code_in_screaming_snake_case() {
        let err = ApiError::missing_field("title");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(json["field"], "title");
        assert_eq!(json["message"], "title is required");
    }

    #[test]
    fn anyhow_wrapping_preserves_api_errors() {
        let wrapped = anyhow::Error::new(ApiError::forbidden("nope"));
        let err: ApiError = wrapped.into();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.message, "nope");
    }

    #[test]
    fn unknown_anyhow_errors_become_internal() {
        let err: ApiError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
