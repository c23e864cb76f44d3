// src/no_cache_middleware.rs
//! Response middleware that forbids caching of auth responses

use axum::{
    http::{header, HeaderValue},
    response::Response,
};

pub const NO_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Force `Cache-Control`, `Pragma` and `Expires` on every wrapped response,
/// overriding whatever the handler set
pub async fn no_cache_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(NO_CACHE_CONTROL),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("-1"));
    response
}
