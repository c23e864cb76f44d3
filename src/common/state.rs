// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::config::AuthConfig;
use crate::services::{IdentityProvider, SessionStore, UserService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AuthConfig>,
    pub identity: Arc<dyn IdentityProvider>,
    pub user_service: Arc<UserService>,
    pub session_store: Arc<SessionStore>,
}

/// State handle layered onto the router as an `Extension`
pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    pub fn new(db: SqlitePool, config: Arc<AuthConfig>, identity: Arc<dyn IdentityProvider>) -> Self {
        let user_service = Arc::new(UserService::new(db.clone()));
        let session_store = Arc::new(SessionStore::new(db.clone(), config.session_lifetime_days));

        Self {
            db,
            config,
            identity,
            user_service,
            session_store,
        }
    }
}
