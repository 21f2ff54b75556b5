//! GraphQL authentication
//!
//! The HTTP and WebSocket handlers verify the bearer token and insert an
//! [AuthUser] into the request data. Resolvers read it back through
//! [AuthExt]:
//!
//! ```ignore
//! let user = ctx.auth_user()?;
//! ```
//!
//! or require it declaratively with `#[graphql(guard = "AuthGuard")]`.

use async_graphql::{Context, Result};
use serde::{Deserialize, Serialize};

use super::errors::unauthorized;

/// User context extracted from JWT, available in GraphQL resolvers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

/// Extension trait to get authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or an `UNAUTHORIZED` error
    fn auth_user(&self) -> Result<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>()
            .ok_or_else(|| unauthorized("Authentication required"))
    }
}

/// Guard that requires authentication for GraphQL operations.
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.auth_user().map(|_| ());
        async move { result }
    }
}
