//! HTTP route definitions
//!
//! The primary API is GraphQL at /graphql. REST endpoints cover what does
//! not fit GraphQL: health probes and multipart uploads.

pub mod graphql;
pub mod health;
pub mod upload;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Extract bearer token from Authorization header
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
