//! Failures of the login flow

use thiserror::Error;
use tracing::error;

use crate::common::ApiError;
use crate::services::google::GoogleError;
use crate::services::sessions::SessionError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid state parameter")]
    StateMismatch,

    #[error("User must be logged in")]
    Unauthenticated,

    #[error("Session has no refresh token")]
    MissingRefreshToken,

    #[error("Upstream failure: {0}")]
    Upstream(#[from] GoogleError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::StateMismatch => ApiError::InvalidState,
            AuthError::Unauthenticated => ApiError::Unauthenticated,
            AuthError::MissingRefreshToken => ApiError::ReauthRequired,
            AuthError::Upstream(e) => ApiError::from(e),
        }
    }
}

impl From<GoogleError> for ApiError {
    fn from(err: GoogleError) -> Self {
        error!(error = %err, "Google API call failed");
        match err {
            GoogleError::InvalidConfig(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::DatabaseError(e) => ApiError::DatabaseError(e),
            SessionError::SerializationError(e) => {
                error!(error = %e, "Corrupt session payload");
                ApiError::InternalServer("session unavailable".to_string())
            }
        }
    }
}
