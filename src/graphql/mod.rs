//! GraphQL API with subscriptions for real-time updates
//!
//! Queries and mutations live in domain files under `queries/` and
//! `mutations/`, merged into the roots in `schema.rs`. Subscriptions are
//! served over WebSocket.

pub mod auth;
pub mod errors;
pub mod mutations;
pub mod pagination;
pub mod queries;
mod schema;
mod subscriptions;
pub mod types;

pub use auth::AuthUser;
pub use schema::{HubbubSchema, MutationRoot, QueryRoot, SchemaDeps, build_schema};
pub use subscriptions::SubscriptionRoot;
