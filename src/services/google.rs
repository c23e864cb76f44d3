// src/services/google.rs
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::common::config::AuthConfig;
use crate::common::helpers::safe_token_log;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("Missing authorization code in callback")]
    MissingCode,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Token object returned by the token endpoint and kept in the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix timestamp computed from `expires_in` when the token was received
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuthTokens {
    fn stamp_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self.expires_in.map(|secs| Utc::now().timestamp() + secs);
        }
        self
    }
}

/// Profile returned by the `oauth2/v2/userinfo` endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Short-lived credential bundle used to authorize one outbound API client
#[derive(Clone)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

impl Credentials {
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &safe_token_log(&self.access_token))
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// The OAuth provider as seen by the login handlers
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent-screen URL carrying the given anti-forgery `state`
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, GoogleError>;

    async fn fetch_profile(&self, credentials: &Credentials) -> Result<GoogleProfile, GoogleError>;
}

/// Pull the authorization code out of the full callback URL
pub fn authorization_code_from_callback(callback_url: &Url) -> Result<String, GoogleError> {
    let mut code = None;
    for (key, value) in callback_url.query_pairs() {
        match key.as_ref() {
            "error" => return Err(GoogleError::OAuthFailed(value.into_owned())),
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            _ => {}
        }
    }
    code.ok_or(GoogleError::MissingCode)
}

/// Build an HTTP client the way every Google-facing service here does
pub fn build_http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// POST a form to a token endpoint and decode the token object
pub async fn request_token(
    client: &Client,
    token_uri: &str,
    params: &[(&str, &str)],
) -> Result<OAuthTokens, GoogleError> {
    let response = client
        .post(token_uri)
        .header("Accept", "application/json")
        .form(params)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, token_uri = %token_uri, "Failed to reach token endpoint");
            GoogleError::RequestFailed(e.to_string())
        })?;

    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %error_text, "Token request failed");
        return Err(GoogleError::OAuthFailed(format!(
            "HTTP {}: {}",
            status, error_text
        )));
    }

    let tokens = response
        .json::<OAuthTokens>()
        .await
        .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

    Ok(tokens.stamp_expiry())
}

/// Google OAuth2 client backed by reqwest
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    config: Arc<AuthConfig>,
    client: Client,
}

impl GoogleOAuthClient {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self {
            config,
            client: build_http_client(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        let separator = if self.config.authorization_url.contains('?') {
            '&'
        } else {
            '?'
        };

        format!(
            "{}{}response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent",
            self.config.authorization_url,
            separator,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.authorization_scope),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, GoogleError> {
        debug!("Exchanging authorization code for tokens");

        let tokens = request_token(
            &self.client,
            &self.config.access_token_uri,
            &[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )
        .await?;

        info!(
            refresh_token_present = tokens.refresh_token.is_some(),
            "Successfully exchanged authorization code for tokens"
        );
        Ok(tokens)
    }

    async fn fetch_profile(&self, credentials: &Credentials) -> Result<GoogleProfile, GoogleError> {
        let response = credentials
            .authorize(self.client.get(&self.config.userinfo_url))
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Failed to get user info");
            return Err(GoogleError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Form,
        http::HeaderMap,
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    fn test_client(base: &str) -> GoogleOAuthClient {
        let mut config = AuthConfig::for_tests();
        config.access_token_uri = format!("{}/token", base);
        config.userinfo_url = format!("{}/userinfo", base);
        GoogleOAuthClient::new(Arc::new(config))
    }

    async fn token_endpoint(Form(form): Form<HashMap<String, String>>) -> Json<serde_json::Value> {
        assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
        assert_eq!(form.get("client_id").map(String::as_str), Some("test-client-id"));
        Json(serde_json::json!({
            "access_token": format!("access-for-{}", form["code"]),
            "refresh_token": "refresh-token",
            "expires_in": 3599,
            "token_type": "Bearer",
            "scope": "openid email"
        }))
    }

    async fn userinfo_endpoint(headers: HeaderMap) -> Json<serde_json::Value> {
        assert_eq!(
            headers.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer access-for-abc")
        );
        Json(serde_json::json!({
            "id": "1234567890",
            "email": "jane@example.com",
            "verified_email": true,
            "name": "Jane Doe",
            "given_name": "Jane",
            "family_name": "Doe",
            "picture": "https://example.com/jane.png",
            "locale": "en"
        }))
    }

    async fn spawn_fake_google() -> String {
        let app = Router::new()
            .route("/token", post(token_endpoint))
            .route("/userinfo", get(userinfo_endpoint));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_authorization_url_carries_state_and_client() {
        let client = GoogleOAuthClient::new(Arc::new(AuthConfig::for_tests()));
        let url = client.authorization_url("abc123");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fgoogle%2Fauth"));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[test]
    fn test_code_extracted_from_callback_url() {
        let url = Url::parse("http://localhost:8080/google/auth?state=s1&code=4%2F0Abc&scope=email")
            .unwrap();
        assert_eq!(authorization_code_from_callback(&url).unwrap(), "4/0Abc");
    }

    #[test]
    fn test_callback_error_is_reported() {
        let url = Url::parse("http://localhost:8080/google/auth?state=s1&error=access_denied")
            .unwrap();
        match authorization_code_from_callback(&url) {
            Err(GoogleError::OAuthFailed(reason)) => assert_eq!(reason, "access_denied"),
            other => panic!("unexpected result: {:?}", other),
        }

        let url = Url::parse("http://localhost:8080/google/auth?state=s1").unwrap();
        assert!(matches!(
            authorization_code_from_callback(&url),
            Err(GoogleError::MissingCode)
        ));
    }

    #[test]
    fn test_token_object_defaults() {
        let tokens: OAuthTokens =
            serde_json::from_str(r#"{"access_token":"at"}"#).unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert!(tokens.refresh_token.is_none());
        assert!(tokens.clone().stamp_expiry().expires_at.is_none());
    }

    #[test]
    fn test_credentials_debug_masks_tokens() {
        let credentials = Credentials {
            access_token: "ya29.very-secret-token".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            client_id: "cid".to_string(),
            client_secret: "shh".to_string(),
            token_uri: crate::common::config::DEFAULT_ACCESS_TOKEN_URI.to_string(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("shh"));
    }

    #[tokio::test]
    async fn test_exchange_code_and_fetch_profile() {
        let base = spawn_fake_google().await;
        let client = test_client(&base);

        let tokens = client.exchange_code("abc").await.unwrap();
        assert_eq!(tokens.access_token, "access-for-abc");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-token"));
        assert!(tokens.expires_at.is_some());

        let credentials = Credentials {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            token_uri: format!("{}/token", base),
        };
        let profile = client.fetch_profile(&credentials).await.unwrap();
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.family_name.as_deref(), Some("Doe"));
        assert!(profile.verified_email);
    }

    #[tokio::test]
    async fn test_exchange_code_surfaces_token_endpoint_errors() {
        let app = Router::new().route(
            "/token",
            post(|| async { (axum::http::StatusCode::BAD_REQUEST, "invalid_grant") }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = test_client(&format!("http://{}", addr));
        let err = client.exchange_code("stale").await.unwrap_err();
        assert!(matches!(err, GoogleError::OAuthFailed(ref msg) if msg.contains("invalid_grant")));
    }
}
