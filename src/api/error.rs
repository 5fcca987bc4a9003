//! Shared error handling for API endpoints.
//!
//! `ApiError` pairs a status code with a client-safe message. Internal
//! details (database errors, signing failures) are logged and replaced with
//! a generic message before they reach the wire.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    /// Database failure: log the cause, answer 500 with a generic message.
    fn db_err(self, context: &str) -> Result<T, ApiError>;
    /// Token minting failure: log the cause, answer 500 with the context.
    fn token_err(self, context: &str) -> Result<T, ApiError>;
    /// Provider credential rejected: log at debug, answer 401.
    fn credential_err(self) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{}: {}", context, e);
            ApiError::internal("Database error")
        })
    }

    fn token_err(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{}: {}", context, e);
            ApiError::internal(context)
        })
    }

    fn credential_err(self) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::debug!("Credential rejected: {}", e);
            ApiError::unauthorized("Invalid credential")
        })
    }
}

/// API error with automatic response conversion.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Reject path parameters that are not well-formed UUIDs before they reach
/// the database.
pub fn validate_uuid(uuid: &str) -> Result<(), ApiError> {
    uuid::Uuid::parse_str(uuid)
        .map(|_| ())
        .map_err(|_| ApiError::bad_request("Invalid UUID format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("00000000-0000-4000-8000-000000000000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("00000000-0000-4000-8000-000000000000-extra").is_err());
    }

    #[test]
    fn test_internal_details_stay_out_of_the_message() {
        let err: ApiError = Err::<(), _>("UNIQUE constraint failed: users.email")
            .db_err("Failed to create profile")
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database error");
    }

    #[test]
    fn test_credential_err_is_unauthorized() {
        let err: ApiError = Err::<(), _>("signature mismatch").credential_err().unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Invalid credential");
    }
}
