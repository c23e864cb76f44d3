// src/services/search_console.rs
//! Search Console (webmasters v3) reporting client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::services::google::{build_http_client, Credentials, GoogleError};

pub const DEFAULT_SEARCH_CONSOLE_URL: &str = "https://www.googleapis.com/webmasters/v3";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteEntry {
    #[serde(rename = "siteUrl")]
    pub site_url: String,
    #[serde(rename = "permissionLevel")]
    pub permission_level: String,
}

#[derive(Debug, Deserialize)]
struct SitesListResponse {
    #[serde(rename = "siteEntry", default)]
    site_entry: Vec<SiteEntry>,
}

/// Body of a `searchAnalytics/query` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAnalyticsQuery {
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(rename = "rowLimit", skip_serializing_if = "Option::is_none", default)]
    pub row_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchAnalyticsRow {
    #[serde(default)]
    pub keys: Vec<String>,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Deserialize)]
struct SearchAnalyticsResponse {
    #[serde(default)]
    rows: Vec<SearchAnalyticsRow>,
}

#[derive(Debug, Clone)]
pub struct SearchConsoleClient {
    credentials: Credentials,
    client: Client,
    base_url: String,
}

/// Reporting client authorized with the signed-in user's credentials
pub fn build_reporting_client(credentials: Credentials) -> SearchConsoleClient {
    SearchConsoleClient {
        credentials,
        client: build_http_client(),
        base_url: DEFAULT_SEARCH_CONSOLE_URL.to_string(),
    }
}

impl SearchConsoleClient {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sites the signed-in user has access to
    pub async fn list_sites(&self) -> Result<Vec<SiteEntry>, GoogleError> {
        let url = format!("{}/sites", self.base_url);
        debug!(url = %url, "Listing Search Console sites");

        let response = self
            .credentials
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Search Console sites request failed");
            return Err(GoogleError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<SitesListResponse>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

        Ok(parsed.site_entry)
    }

    pub async fn query_search_analytics(
        &self,
        site_url: &str,
        query: &SearchAnalyticsQuery,
    ) -> Result<Vec<SearchAnalyticsRow>, GoogleError> {
        let url = format!(
            "{}/sites/{}/searchAnalytics/query",
            self.base_url,
            urlencoding::encode(site_url)
        );
        debug!(
            site_url = %site_url,
            start_date = %query.start_date,
            end_date = %query.end_date,
            "Querying Search Console analytics"
        );

        let response = self
            .credentials
            .authorize(self.client.post(&url))
            .json(query)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, site_url = %site_url, "Search analytics query failed");
            return Err(GoogleError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<SearchAnalyticsResponse>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

        Ok(parsed.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use tokio::net::TcpListener;

    fn credentials() -> Credentials {
        Credentials {
            access_token: "access-token".to_string(),
            refresh_token: Some("refresh-token".to_string()),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            token_uri: crate::common::config::DEFAULT_ACCESS_TOKEN_URI.to_string(),
        }
    }

    async fn sites(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer access-token")
        {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(Json(serde_json::json!({
            "siteEntry": [
                { "siteUrl": "https://example.com/", "permissionLevel": "siteOwner" }
            ]
        })))
    }

    async fn analytics(
        Path(site): Path<String>,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        assert_eq!(site, "https://example.com/");
        assert_eq!(body["startDate"], "2024-01-01");
        Json(serde_json::json!({
            "rows": [
                { "keys": ["sauna"], "clicks": 12.0, "impressions": 340.0, "ctr": 0.035, "position": 4.2 }
            ]
        }))
    }

    async fn spawn() -> String {
        let app = Router::new()
            .route("/sites", get(sites))
            .route("/sites/:site/searchAnalytics/query", post(analytics));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_list_sites_sends_bearer_token() {
        let base = spawn().await;
        let client = build_reporting_client(credentials()).with_base_url(base);

        let sites = client.list_sites().await.unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].permission_level, "siteOwner");
    }

    #[tokio::test]
    async fn test_query_search_analytics() {
        let base = spawn().await;
        let client = build_reporting_client(credentials()).with_base_url(base);

        let query = SearchAnalyticsQuery {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            dimensions: vec!["query".to_string()],
            row_limit: Some(10),
        };
        let rows = client
            .query_search_analytics("https://example.com/", &query)
            .await
            .unwrap();
        assert_eq!(rows[0].keys, vec!["sauna".to_string()]);
        assert_eq!(rows[0].clicks, 12.0);
    }

    #[tokio::test]
    async fn test_api_error_keeps_status() {
        let base = spawn().await;
        let mut creds = credentials();
        creds.access_token = "expired".to_string();
        let client = build_reporting_client(creds).with_base_url(base);

        match client.list_sites().await {
            Err(GoogleError::ApiError { status, .. }) => assert_eq!(status, 401),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
