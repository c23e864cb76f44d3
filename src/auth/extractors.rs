//! Session extractor for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::COOKIE, request::Parts, HeaderValue},
};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use tracing::{debug, warn};

use super::models::SessionData;
use crate::common::{generate_session_id, ApiError, AuthConfig, SharedState};
use crate::services::sessions::SessionError;
use crate::services::SessionStore;

/// The caller's session, loaded from the store by the id in the session cookie.
///
/// Handlers mutate `data` and then call [`Session::save`]; nothing is written
/// back implicitly.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    is_new: bool,
    permanent: bool,
    pub data: SessionData,
}

impl Session {
    fn fresh() -> Self {
        Self {
            id: generate_session_id(),
            is_new: true,
            permanent: false,
            data: SessionData::default(),
        }
    }

    /// True when the request carried no live session cookie
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Permanent sessions outlive the browser for the configured lifetime
    pub fn set_permanent(&mut self, permanent: bool) {
        self.permanent = permanent;
    }

    /// Persist the session and return the `Set-Cookie` value to send back
    pub async fn save(
        &self,
        store: &SessionStore,
        config: &AuthConfig,
    ) -> Result<HeaderValue, ApiError> {
        store.save(&self.id, &self.data, self.permanent).await?;

        let mut cookie = Cookie::build((config.session_cookie_name.clone(), self.id.clone()))
            .path("/")
            .http_only(true)
            .secure(config.session_cookie_secure)
            .same_site(SameSite::Lax);

        if self.permanent {
            cookie = cookie.max_age(CookieDuration::seconds(
                store.permanent_lifetime().num_seconds(),
            ));
        }

        HeaderValue::from_str(&cookie.build().to_string())
            .map_err(|e| ApiError::InternalServer(format!("invalid session cookie: {}", e)))
    }
}

fn session_id_from_cookies(parts: &Parts, cookie_name: &str) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|header| {
            Cookie::split_parse(header)
                .filter_map(|c| c.ok())
                .filter(|c| c.name() == cookie_name)
                .map(|c| c.value().to_string())
                .collect::<Vec<_>>()
        })
        .find(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<SharedState> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let Some(id) = session_id_from_cookies(parts, &app_state.config.session_cookie_name)
        else {
            return Ok(Session::fresh());
        };

        let loaded = match app_state.session_store.load(&id).await {
            Ok(loaded) => loaded,
            Err(SessionError::SerializationError(e)) => {
                // Treated like an unknown id so the browser can still log in
                warn!(error = %e, "Discarding unreadable session, starting a new session");
                return Ok(Session::fresh());
            }
            Err(e) => return Err(e.into()),
        };

        match loaded {
            Some(record) => {
                debug!(is_permanent = record.permanent, "Loaded session");
                Ok(Session {
                    id,
                    is_new: false,
                    permanent: record.permanent,
                    data: record.data,
                })
            }
            None => {
                // Never adopt an id the server did not issue
                warn!("Unknown or expired session cookie, starting a new session");
                Ok(Session::fresh())
            }
        }
    }
}
