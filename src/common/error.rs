// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

/// Body returned when the OAuth callback carries a state we did not issue
pub const INVALID_STATE_BODY: &str = "Invalid state parameter";

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Callback `state` did not match the one stored in the session
    InvalidState,
    /// No OAuth tokens in the session
    Unauthenticated,
    /// Signed in, but the session holds no refresh token
    ReauthRequired,
    BadRequest(String),
    /// Google or a vendor API failed
    BadGateway(String),
    InternalServer(String),
    ServiceUnavailable(String),
    DatabaseError(sqlx::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidState => write!(f, "{}", INVALID_STATE_BODY),
            ApiError::Unauthenticated => write!(f, "User must be logged in"),
            ApiError::ReauthRequired => write!(f, "Refresh token missing, sign in again"),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad Gateway: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            // The login flow answers a forged callback with plain text, not JSON
            ApiError::InvalidState => {
                return (StatusCode::UNAUTHORIZED, INVALID_STATE_BODY).into_response();
            }
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "User must be logged in".to_string(),
                "UNAUTHENTICATED",
            ),
            ApiError::ReauthRequired => (
                StatusCode::UNAUTHORIZED,
                "Refresh token missing, sign in again".to_string(),
                "REAUTH_REQUIRED",
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg, "UPSTREAM_ERROR"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                msg,
                "SERVICE_UNAVAILABLE",
            ),
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_invalid_state_is_plain_text_401() {
        let response = ApiError::InvalidState.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], INVALID_STATE_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_unauthenticated_is_json_401() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_reauth_required_has_its_own_code() {
        let response = ApiError::ReauthRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "REAUTH_REQUIRED");
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let response = ApiError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Database operation failed");
    }
}
