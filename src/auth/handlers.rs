//! Google login handlers

use axum::{
    extract::{Extension, OriginalUri, Query},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::credentials::build_credentials;
use super::errors::AuthError;
use super::extractors::Session;
use super::models::NewUser;
use crate::common::{generate_state_token, safe_email_log, ApiError, SharedState};
use crate::services::google::authorization_code_from_callback;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
}

/// `302 Found`, optionally setting the session cookie
fn found(location: &str, session_cookie: Option<HeaderValue>) -> Response {
    let mut response = (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response();
    if let Some(cookie) = session_cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// The callback must echo back exactly the state stored at login
fn verify_state(received: Option<&str>, stored: Option<&str>) -> Result<(), AuthError> {
    match (received, stored) {
        (Some(received), Some(stored)) if received == stored => Ok(()),
        _ => Err(AuthError::StateMismatch),
    }
}

/// GET /google/login
/// Stores a fresh anti-forgery state in the session and redirects to the
/// Google consent screen
pub async fn login(
    Extension(state_lock): Extension<SharedState>,
    mut session: Session,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let csrf_state = generate_state_token();
    let authorization_url = state.identity.authorization_url(&csrf_state);

    session.data.state = Some(csrf_state);
    session.set_permanent(true);
    let cookie = session.save(&state.session_store, &state.config).await?;

    info!("Starting Google OAuth flow");
    debug!(authorization_url = %authorization_url, "Redirecting to Google consent screen");

    Ok(found(&authorization_url, Some(cookie)))
}

/// GET /google/auth
/// OAuth callback: validates state, exchanges the code, records the user on
/// first login and redirects to the application
pub async fn google_auth_redirect(
    Extension(state_lock): Extension<SharedState>,
    OriginalUri(original_uri): OriginalUri,
    Query(params): Query<CallbackParams>,
    mut session: Session,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    if let Err(e) = verify_state(params.state.as_deref(), session.data.state.as_deref()) {
        warn!(
            has_query_state = params.state.is_some(),
            has_session_state = session.data.state.is_some(),
            "Rejecting OAuth callback with invalid state"
        );
        return Err(e.into());
    }

    let callback_url = Url::parse(&state.config.redirect_uri)
        .and_then(|base| base.join(&original_uri.to_string()))
        .map_err(|e| ApiError::InternalServer(format!("invalid redirect URI: {}", e)))?;
    let code = authorization_code_from_callback(&callback_url).map_err(AuthError::from)?;

    let tokens = state
        .identity
        .exchange_code(&code)
        .await
        .map_err(AuthError::from)?;

    session.data.oauth_tokens = Some(tokens);
    session.data.state = None;
    let cookie = session.save(&state.session_store, &state.config).await?;

    let credentials = build_credentials(&session.data, &state.config)?;
    let profile = state
        .identity
        .fetch_profile(&credentials)
        .await
        .map_err(AuthError::from)?;

    let created = state
        .user_service
        .create_if_absent(&NewUser::from(&profile))
        .await?;

    info!(
        email = %safe_email_log(&profile.email),
        new_user = created,
        "Google login completed"
    );

    Ok(found(&state.config.base_uri, Some(cookie)))
}

/// GET /google/logout
/// Drops the auth slots from the session; safe to repeat
pub async fn logout(
    Extension(state_lock): Extension<SharedState>,
    mut session: Session,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    if session.is_new() || session.data.is_empty() {
        debug!(is_new = session.is_new(), "Nothing to clear on logout");
        return Ok(found(&state.config.base_uri, None));
    }

    session.data.oauth_tokens = None;
    session.data.state = None;
    let cookie = session.save(&state.session_store, &state.config).await?;

    info!("User logout successful");
    Ok(found(&state.config.base_uri, Some(cookie)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_state() {
        assert!(verify_state(Some("abc"), Some("abc")).is_ok());
        assert!(matches!(
            verify_state(Some("abc"), Some("xyz")),
            Err(AuthError::StateMismatch)
        ));
        assert!(verify_state(None, Some("abc")).is_err());
        assert!(verify_state(Some("abc"), None).is_err());
        assert!(verify_state(None, None).is_err());
    }
}
