//! GraphQL authentication mutations
//!
//! Neither mutation requires authentication. A successful sign-in is
//! published on `USER_SIGNED_IN`.

use super::prelude::*;

use crate::services::auth::{AuthError, AuthService, SignUpInput as ServiceSignUpInput};

fn auth_error(e: AuthError) -> async_graphql::Error {
    match e {
        AuthError::EmailTaken => bad_input(e.to_string()),
        AuthError::InvalidCredentials | AuthError::InvalidToken(_) => unauthorized(e.to_string()),
        AuthError::Internal(e) => async_graphql::Error::new(e.to_string()),
    }
}

#[derive(Default)]
pub struct AuthMutations;

#[Object]
impl AuthMutations {
    /// Create an account and return a token for it
    async fn sign_up(&self, ctx: &Context<'_>, input: SignUpInput) -> Result<AuthPayload> {
        let auth = ctx.data_unchecked::<Arc<AuthService>>();

        let result = auth
            .sign_up(ServiceSignUpInput {
                email: input.email,
                password: input.password,
                name: input.name,
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Sign-up failed");
                auth_error(e)
            })?;

        Ok(AuthPayload {
            token: result.token,
            user: result.user.into(),
        })
    }

    /// Authenticate with email and password
    async fn sign_in(&self, ctx: &Context<'_>, email: String, password: String) -> Result<AuthPayload> {
        let auth = ctx.data_unchecked::<Arc<AuthService>>();
        let pubsub = ctx.data_unchecked::<PubSub>();

        let result = auth.sign_in(&email, &password).await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-in failed");
            auth_error(e)
        })?;

        tracing::info!(user_id = %result.user.id, "User signed in");
        pubsub.publish(Topic::UserSignedIn, UserEvent::from(result.user.clone()));

        Ok(AuthPayload {
            token: result.token,
            user: result.user.into(),
        })
    }
}
