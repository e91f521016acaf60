//! Error types for the stub service.
//!
//! Errors render as the platform's error body:
//!
//! ```json
//! { "status": 404, "errorMessages": ["Entity not found"], "type": "HyperIoTEntityNotFound" }
//! ```
//!
//! | Variant | HTTP Status | `type` |
//! |---------|-------------|--------|
//! | NotFound | 404 | HyperIoTEntityNotFound |
//! | Forbidden | 403 | HyperIoTUnauthorizedException |
//! | Unauthenticated | 401 | HyperIoTAuthenticationException |
//! | Validation | 422 | HyperIoTValidationException |
//! | Duplicate | 409 | HyperIoTDuplicateEntityException |
//! | UnknownTable | 400 | HyperIoTRuntimeException |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Result alias for stub operations.
pub type StubResult<T> = Result<T, StubError>;

/// The error type of the stub service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StubError {
    /// No entity with that id.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Missing or unknown token.
    #[error("{0}")]
    Forbidden(String),

    /// Login rejected.
    #[error("invalid credentials for {0}")]
    Unauthenticated(String),

    /// The submitted entity breaks a validation rule.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// A unique property collides with an existing entity.
    #[error("{field} already in use")]
    Duplicate { field: String },

    /// Truncation of a table the store does not hold.
    #[error("unknown table {0}")]
    UnknownTable(String),
}

impl StubError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StubError::NotFound { entity, id }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        StubError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StubError::NotFound { .. } => StatusCode::NOT_FOUND,
            StubError::Forbidden(_) => StatusCode::FORBIDDEN,
            StubError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            StubError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            StubError::Duplicate { .. } => StatusCode::CONFLICT,
            StubError::UnknownTable(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            StubError::NotFound { .. } => "HyperIoTEntityNotFound",
            StubError::Forbidden(_) => "HyperIoTUnauthorizedException",
            StubError::Unauthenticated(_) => "HyperIoTAuthenticationException",
            StubError::Validation { .. } => "HyperIoTValidationException",
            StubError::Duplicate { .. } => "HyperIoTDuplicateEntityException",
            StubError::UnknownTable(_) => "HyperIoTRuntimeException",
        }
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        debug!(status = status.as_u16(), error = %self, "Request rejected");

        let body = json!({
            "status": status.as_u16(),
            "errorMessages": [self.to_string()],
            "type": self.error_type(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StubError::not_found("HProject", 1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StubError::Forbidden("no token".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            StubError::validation("name", "must not be empty").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            StubError::Duplicate {
                field: "username".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = StubError::not_found("HDevice", 7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            StubError::not_found("HProject", 3).to_string(),
            "HProject with id 3 not found"
        );
        assert_eq!(
            StubError::validation("name", "must not be empty").to_string(),
            "name: must not be empty"
        );
    }
}
