//! Centralized API error handling for the gold shop server
//!
//! Every service returns [`ApiError`], which maps onto an HTTP status code and
//! a JSON error body.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Validation failure that carries computed values back to the caller
    #[error("Validation error: {message}")]
    ValidationFailed {
        message: String,
        details: serde_json::Value,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ValidationError(_) | ApiError::ValidationFailed { .. } => "VALIDATION_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) | ApiError::ValidationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured payload attached to the error, if any
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            ApiError::ValidationFailed { details, .. } => Some(details),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        match &self {
            ApiError::DatabaseError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let details = self.details().cloned();
        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Convenience conversions from common error types

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict(format!("Duplicate value: {}", db_err.message()))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                ApiError::Conflict(format!("Record is still referenced: {}", db_err.message()))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
                ApiError::ValidationError(format!("Value out of range: {}", db_err.message()))
            }
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

/// Field-level failures are reported as `{field: [message, ...]}` in `details`
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let names: Vec<&str> = fields.iter().map(|(field, _)| *field).collect();
        let details: serde_json::Map<String, serde_json::Value> = fields
            .iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("invalid {}", e.code),
                    })
                    .map(serde_json::Value::String)
                    .collect();
                (field.to_string(), serde_json::Value::Array(messages))
            })
            .collect();

        ApiError::ValidationFailed {
            message: format!("Invalid fields: {}", names.join(", ")),
            details: serde_json::Value::Object(details),
        }
    }
}

/// Bodies that parse but do not fit the request type are validation errors;
/// anything unreadable is a bad request
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::ValidationError(err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::ValidationError(rejection.body_text())
    }
}
