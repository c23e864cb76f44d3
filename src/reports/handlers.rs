//! Report handlers

use axum::extract::{Extension, Json};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{build_credentials, build_refresh_client, Session};
use crate::common::{ApiError, SharedState};
use crate::services::ads::{build_ads_client, CampaignSummary};
use crate::services::search_console::{
    build_reporting_client, SearchAnalyticsQuery, SearchAnalyticsRow, SiteEntry,
};

#[derive(Debug, Deserialize)]
pub struct SearchAnalyticsRequest {
    pub site_url: String,
    #[serde(flatten)]
    pub query: SearchAnalyticsQuery,
}

/// GET /api/reports/sites
pub async fn list_sites(
    Extension(state_lock): Extension<SharedState>,
    session: Session,
) -> Result<Json<Vec<SiteEntry>>, ApiError> {
    let state = state_lock.read().await.clone();

    let credentials = build_credentials(&session.data, &state.config)?;
    let sites = build_reporting_client(credentials)
        .with_base_url(state.config.search_console_url.clone())
        .list_sites()
        .await?;

    debug!(count = sites.len(), "Listed Search Console sites");
    Ok(Json(sites))
}

/// POST /api/reports/search-analytics
///
/// # Request Body
/// ```json
/// {
///   "site_url": "https://example.com/",
///   "startDate": "2024-01-01",
///   "endDate": "2024-01-31",
///   "dimensions": ["query"],
///   "rowLimit": 25
/// }
/// ```
pub async fn search_analytics(
    Extension(state_lock): Extension<SharedState>,
    session: Session,
    Json(request): Json<SearchAnalyticsRequest>,
) -> Result<Json<Vec<SearchAnalyticsRow>>, ApiError> {
    let state = state_lock.read().await.clone();

    if request.site_url.trim().is_empty() {
        return Err(ApiError::BadRequest("site_url is required".to_string()));
    }

    let credentials = build_credentials(&session.data, &state.config)?;
    let rows = build_reporting_client(credentials)
        .with_base_url(state.config.search_console_url.clone())
        .query_search_analytics(&request.site_url, &request.query)
        .await?;

    Ok(Json(rows))
}

/// GET /api/ads/campaigns
pub async fn list_campaigns(
    Extension(state_lock): Extension<SharedState>,
    session: Session,
) -> Result<Json<Vec<CampaignSummary>>, ApiError> {
    let state = state_lock.read().await.clone();
    let config = &state.config;

    let refresh_client = build_refresh_client(&session.data, config)?;

    let (Some(developer_token), Some(customer_id)) =
        (config.developer_token.as_ref(), config.client_customer_id.as_ref())
    else {
        warn!("Ads API requested but developer token or customer id is not configured");
        return Err(ApiError::ServiceUnavailable(
            "ads API not configured".to_string(),
        ));
    };

    let campaigns = build_ads_client(developer_token.clone(), refresh_client, customer_id.clone())
        .with_user_agent(config.ads_user_agent.clone())
        .with_base_url(config.ads_api_url.clone())
        .list_campaigns()
        .await?;

    Ok(Json(campaigns))
}
