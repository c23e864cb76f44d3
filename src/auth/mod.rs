//! # Auth Module
//!
//! Google OAuth2 login for the application:
//! - `/google/login` redirects to the consent screen with a fresh state
//! - `/google/auth` exchanges the code and records the user on first login
//! - `/google/logout` clears the session
//! - credential builders reuse the session tokens for Google API clients

pub mod credentials;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;


pub use credentials::{build_credentials, build_refresh_client, is_logged_in};
pub use errors::AuthError;
pub use extractors::Session;
pub use models::{SessionData, User};
pub use routes::google_auth_routes;
