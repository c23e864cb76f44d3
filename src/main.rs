// src/main.rs
use axum::{extract::Extension, routing::get, Json, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::time::Duration;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod no_cache_middleware;
mod reports;
mod services;

use common::{ApiError, AppState, AuthConfig, SharedState};
use services::{GoogleOAuthClient, SessionStore};

/// How often expired sessions are purged
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

// ============================================================================
// ROUTER COMPOSITION
// ============================================================================

async fn health(Extension(state_lock): Extension<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    sqlx::query("SELECT 1").execute(&state.db).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// All routes with their shared state, without transport-level layers
pub fn build_router(shared: SharedState) -> Router {
    Router::new()
        // Google login: /google/login, /google/auth, /google/logout
        .merge(auth::google_auth_routes())
        // Search Console and ads reports for the signed-in user
        .merge(reports::reports_routes())
        .route("/health", get(health))
        .layer(Extension(shared))
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://console_auth.db".to_string());
    let config = Arc::new(AuthConfig::from_env()?);
    info!(
        redirect_uri = %config.redirect_uri,
        base_uri = %config.base_uri,
        ads_configured = config.developer_token.is_some() && config.client_customer_id.is_some(),
        "Loaded auth configuration"
    );

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let identity = Arc::new(GoogleOAuthClient::new(config.clone()));
    info!("GoogleOAuthClient initialized");

    SessionStore::new(pool.clone(), config.session_lifetime_days)
        .start_cleanup_task(SESSION_CLEANUP_INTERVAL);
    info!("Session cleanup task started");

    let app_state = AppState::new(pool, config, identity);
    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // MIDDLEWARE AND LAYERS
    // ========================================================================

    let cors_origins = std::env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());
    let origins: Vec<axum::http::HeaderValue> = cors_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let app = build_router(shared)
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
