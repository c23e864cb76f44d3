// src/common/config.rs
//! Static configuration for the Google login flow and the vendor API clients.
//!
//! Values come from the process environment (a `.env` file is loaded by
//! `main` before this runs). Only the OAuth client id and secret are required;
//! everything else falls back to Google's public endpoints or local defaults.

use std::env;
use thiserror::Error;

use crate::services::ads::DEFAULT_ADS_API_URL;
use crate::services::search_console::DEFAULT_SEARCH_CONSOLE_URL;

pub const DEFAULT_ACCESS_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const DEFAULT_AUTHORIZATION_SCOPE: &str = "openid email profile \
     https://www.googleapis.com/auth/webmasters.readonly \
     https://www.googleapis.com/auth/adwords";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Configuration consumed by the auth adapter
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub access_token_uri: String,
    pub authorization_url: String,
    pub authorization_scope: String,
    pub redirect_uri: String,
    pub userinfo_url: String,
    /// Where every flow in the `/google` routes ends up
    pub base_uri: String,
    pub search_console_url: String,
    pub ads_api_url: String,
    pub developer_token: Option<String>,
    pub client_customer_id: Option<String>,
    pub ads_user_agent: String,
    pub session_cookie_name: String,
    pub session_lifetime_days: i64,
    pub session_cookie_secure: bool,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = required("GOOGLE_CLIENT_ID")?;
        let client_secret = required("GOOGLE_CLIENT_SECRET")?;

        let session_lifetime_days = match env::var("SESSION_LIFETIME_DAYS") {
            Ok(raw) => raw.trim().parse::<i64>().ok().filter(|d| *d > 0).ok_or(
                ConfigError::Invalid {
                    key: "SESSION_LIFETIME_DAYS",
                    value: raw,
                },
            )?,
            Err(_) => 31,
        };

        Ok(Self {
            client_id,
            client_secret,
            access_token_uri: or_default("GOOGLE_ACCESS_TOKEN_URI", DEFAULT_ACCESS_TOKEN_URI),
            authorization_url: or_default("GOOGLE_AUTHORIZATION_URL", DEFAULT_AUTHORIZATION_URL),
            authorization_scope: or_default(
                "GOOGLE_AUTHORIZATION_SCOPE",
                DEFAULT_AUTHORIZATION_SCOPE,
            ),
            redirect_uri: or_default(
                "GOOGLE_AUTH_REDIRECT_URI",
                "http://localhost:8080/google/auth",
            ),
            userinfo_url: or_default("GOOGLE_USERINFO_URL", DEFAULT_USERINFO_URL),
            base_uri: or_default("BASE_URI", "http://localhost:3000"),
            search_console_url: or_default("SEARCH_CONSOLE_API_URL", DEFAULT_SEARCH_CONSOLE_URL),
            ads_api_url: or_default("ADS_API_URL", DEFAULT_ADS_API_URL),
            developer_token: env::var("ADS_DEVELOPER_TOKEN").ok(),
            client_customer_id: env::var("ADS_CLIENT_CUSTOMER_ID").ok(),
            ads_user_agent: or_default("ADS_USER_AGENT", "console-auth"),
            session_cookie_name: or_default("SESSION_COOKIE_NAME", "session"),
            session_lifetime_days,
            session_cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                == "true",
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn or_default(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
impl AuthConfig {
    pub fn for_tests() -> Self {
        Self {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            access_token_uri: DEFAULT_ACCESS_TOKEN_URI.to_string(),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            authorization_scope: "openid email profile".to_string(),
            redirect_uri: "http://localhost:8080/google/auth".to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            base_uri: "http://localhost:3000/".to_string(),
            search_console_url: DEFAULT_SEARCH_CONSOLE_URL.to_string(),
            ads_api_url: DEFAULT_ADS_API_URL.to_string(),
            developer_token: Some("dev-token".to_string()),
            client_customer_id: Some("123-456-7890".to_string()),
            ads_user_agent: "console-auth-tests".to_string(),
            session_cookie_name: "session".to_string(),
            session_lifetime_days: 31,
            session_cookie_secure: false,
        }
    }
}
