//! Report routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// # Routes
/// - `GET /api/reports/sites` - Search Console sites
/// - `POST /api/reports/search-analytics` - Search Console analytics rows
/// - `GET /api/ads/campaigns` - Ads campaigns for the configured customer
pub fn reports_routes() -> Router {
    Router::new()
        .route("/api/reports/sites", get(handlers::list_sites))
        .route(
            "/api/reports/search-analytics",
            post(handlers::search_analytics),
        )
        .route("/api/ads/campaigns", get(handlers::list_campaigns))
}
