//! # Reports Module
//!
//! JSON endpoints backed by the signed-in user's Google credentials:
//! Search Console sites and analytics, and ads campaigns.

pub mod handlers;
pub mod routes;

pub use routes::reports_routes;
