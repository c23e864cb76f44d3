//! Credentials rebuilt from the session for outbound Google API clients

use super::errors::AuthError;
use super::models::SessionData;
use crate::common::AuthConfig;
use crate::services::ads::GoogleRefreshTokenClient;
use crate::services::google::Credentials;

pub fn is_logged_in(session: &SessionData) -> bool {
    session.oauth_tokens.is_some()
}

/// Credentials for the signed-in user, or `Unauthenticated` without a token
pub fn build_credentials(
    session: &SessionData,
    config: &AuthConfig,
) -> Result<Credentials, AuthError> {
    if !is_logged_in(session) {
        return Err(AuthError::Unauthenticated);
    }
    let tokens = session
        .oauth_tokens
        .as_ref()
        .ok_or(AuthError::Unauthenticated)?;

    Ok(Credentials {
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        client_id: config.client_id.clone(),
        client_secret: config.client_secret.clone(),
        token_uri: config.access_token_uri.clone(),
    })
}

/// Refresh-token client for the ads API, built straight from the session tokens.
/// A signed-in session without a refresh token has to go through consent again.
pub fn build_refresh_client(
    session: &SessionData,
    config: &AuthConfig,
) -> Result<GoogleRefreshTokenClient, AuthError> {
    let tokens = session
        .oauth_tokens
        .as_ref()
        .ok_or(AuthError::Unauthenticated)?;
    let refresh_token = tokens
        .refresh_token
        .as_deref()
        .ok_or(AuthError::MissingRefreshToken)?;

    Ok(GoogleRefreshTokenClient::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        refresh_token,
        config.access_token_uri.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::google::OAuthTokens;

    fn logged_in(refresh: Option<&str>) -> SessionData {
        SessionData {
            state: None,
            oauth_tokens: Some(OAuthTokens {
                access_token: "access".to_string(),
                refresh_token: refresh.map(str::to_string),
                token_type: "Bearer".to_string(),
                expires_in: Some(3600),
                expires_at: None,
                scope: None,
                id_token: None,
            }),
        }
    }

    #[test]
    fn test_build_credentials_requires_token() {
        let config = AuthConfig::for_tests();
        let err = build_credentials(&SessionData::default(), &config).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
        assert!(!is_logged_in(&SessionData::default()));
    }

    #[test]
    fn test_build_credentials_uses_static_client_identity() {
        let config = AuthConfig::for_tests();
        let session = logged_in(Some("refresh"));

        let credentials = build_credentials(&session, &config).unwrap();
        assert!(is_logged_in(&session));
        assert_eq!(credentials.access_token, "access");
        assert_eq!(credentials.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(credentials.client_id, config.client_id);
        assert_eq!(credentials.client_secret, config.client_secret);
        assert_eq!(credentials.token_uri, config.access_token_uri);
    }

    #[test]
    fn test_refresh_client_needs_refresh_token() {
        let config = AuthConfig::for_tests();
        assert!(matches!(
            build_refresh_client(&logged_in(None), &config),
            Err(AuthError::MissingRefreshToken)
        ));
        assert!(matches!(
            build_refresh_client(&SessionData::default(), &config),
            Err(AuthError::Unauthenticated)
        ));
        assert!(build_refresh_client(&logged_in(Some("refresh")), &config).is_ok());
    }
}
