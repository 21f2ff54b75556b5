//! Hubbub chat backend
//!
//! A GraphQL server over SQLite with WebSocket subscriptions, push
//! notification fan-out on new messages, and a multipart upload endpoint.
//! The [client] module carries the matching upload helper.

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
