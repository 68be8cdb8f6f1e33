//! Custom error types for the API service
//!
//! Server-side actions never throw across the network boundary: every
//! error maps to a uniform `{"success": false, "error": "..."}` JSON body
//! with an appropriate status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid session
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Record absent or not owned by the caller
    #[error("Not found")]
    NotFound,

    /// Invitation token unmatched or no longer pending
    #[error("Invalid invitation token")]
    InvalidToken,

    /// Missing or malformed input, including self-invitation
    #[error("{0}")]
    Validation(String),

    /// The current acting role is read-only
    #[error("Current role does not permit this action")]
    ReadOnlyRole,

    /// Database, storage, or other upstream call failed
    #[error("Upstream failure")]
    Upstream(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidToken => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ReadOnlyRole => StatusCode::FORBIDDEN,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Upstream details stay in the logs, not in the response body.
        let message = match &self {
            ApiError::Upstream(e) => {
                tracing::error!("Upstream failure: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidToken.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Validation("email is required".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::ReadOnlyRole.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Upstream(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
