// src/services/mod.rs
//
// Shared services: the Google identity provider, vendor API clients and the
// SQLite-backed stores used by the route modules

pub mod ads;
pub mod google;
pub mod search_console;
pub mod sessions;
pub mod users;

// Re-export commonly used types for convenience
pub use google::{GoogleOAuthClient, IdentityProvider};
pub use sessions::SessionStore;
pub use users::UserService;
