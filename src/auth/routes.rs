//! Google login routes

use axum::{middleware, routing::get, Router};

use super::handlers;
use crate::no_cache_middleware::no_cache_headers;

/// Creates and returns the Google login router
///
/// # Routes
/// - `GET /google/login` - Redirect to the Google consent screen
/// - `GET /google/auth` - OAuth callback
/// - `GET /google/logout` - Clear the session auth slots
///
/// Every response from these routes carries the no-cache headers.
pub fn google_auth_routes() -> Router {
    Router::new()
        .route("/google/login", get(handlers::login))
        .route("/google/auth", get(handlers::google_auth_redirect))
        .route("/google/logout", get(handlers::logout))
        .route_layer(middleware::map_response(no_cache_headers))
}
