// src/services/ads.rs
//! Ads campaign API client authorized with a refresh token

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::services::google::{build_http_client, request_token, GoogleError};

pub const DEFAULT_ADS_API_URL: &str = "https://googleads.googleapis.com/v17";

/// Seconds before expiry at which a cached access token is considered stale
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedAccessToken {
    token: String,
    expires_at: i64,
}

/// OAuth client that mints access tokens from a long-lived refresh token
#[derive(Debug, Clone)]
pub struct GoogleRefreshTokenClient {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_uri: String,
    client: Client,
    cached: Arc<Mutex<Option<CachedAccessToken>>>,
}

impl GoogleRefreshTokenClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            token_uri: token_uri.into(),
            client: build_http_client(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// A valid access token, refreshing through the token endpoint when needed
    pub async fn access_token(&self) -> Result<String, GoogleError> {
        let mut cached = self.cached.lock().await;

        if let Some(current) = cached.as_ref() {
            if current.expires_at > Utc::now().timestamp() + EXPIRY_MARGIN_SECS {
                return Ok(current.token.clone());
            }
        }

        debug!(client_id = %self.client_id, "Refreshing ads access token");
        let tokens = request_token(
            &self.client,
            &self.token_uri,
            &[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ],
        )
        .await?;

        // No expiry in the response means the token is only good for this call
        let expires_at = tokens.expires_at.unwrap_or_else(|| Utc::now().timestamp());
        *cached = Some(CachedAccessToken {
            token: tokens.access_token.clone(),
            expires_at,
        });

        Ok(tokens.access_token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignSummary {
    pub id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdsClient {
    developer_token: String,
    oauth: GoogleRefreshTokenClient,
    customer_id: String,
    user_agent: String,
    client: Client,
    base_url: String,
}

/// Ads client for one customer account
pub fn build_ads_client(
    developer_token: impl Into<String>,
    refresh_client: GoogleRefreshTokenClient,
    customer_id: impl Into<String>,
) -> AdsClient {
    AdsClient {
        developer_token: developer_token.into(),
        oauth: refresh_client,
        customer_id: customer_id.into(),
        user_agent: "console-auth".to_string(),
        client: build_http_client(),
        base_url: DEFAULT_ADS_API_URL.to_string(),
    }
}

impl AdsClient {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Customer id as the REST API expects it (digits only)
    pub fn customer_id(&self) -> String {
        self.customer_id.chars().filter(char::is_ascii_digit).collect()
    }

    /// Run a query against the customer account, following result pages
    pub async fn search(&self, query: &str) -> Result<Vec<serde_json::Value>, GoogleError> {
        let url = format!(
            "{}/customers/{}/googleAds:search",
            self.base_url,
            self.customer_id()
        );
        let mut results = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let access_token = self.oauth.access_token().await?;

            let mut body = serde_json::json!({ "query": query });
            if let Some(token) = &page_token {
                body["pageToken"] = serde_json::Value::String(token.clone());
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&access_token)
                .header("developer-token", &self.developer_token)
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .json(&body)
                .send()
                .await
                .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                error!(status = %status, customer_id = %self.customer_id(), "Ads search failed");
                return Err(GoogleError::ApiError {
                    status: status.as_u16(),
                    body,
                });
            }

            let page = response
                .json::<SearchResponse>()
                .await
                .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

            results.extend(page.results);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(
            customer_id = %self.customer_id(),
            rows = results.len(),
            "Ads search completed"
        );
        Ok(results)
    }

    pub async fn list_campaigns(&self) -> Result<Vec<CampaignSummary>, GoogleError> {
        let rows = self
            .search(
                "SELECT campaign.id, campaign.name, campaign.status FROM campaign ORDER BY campaign.id",
            )
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let campaign = row.get("campaign")?;
                Some(CampaignSummary {
                    id: match campaign.get("id")? {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                    name: campaign.get("name")?.as_str()?.to_string(),
                    status: campaign
                        .get("status")
                        .and_then(|s| s.as_str())
                        .unwrap_or("UNKNOWN")
                        .to_string(),
                })
            })
            .collect())
    }
}
