use async_graphql::MaybeUndefined;

use super::prelude::*;

fn maybe(value: MaybeUndefined<String>) -> Option<Option<String>> {
    match value {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(v) => Some(Some(v)),
    }
}

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Update the requester's profile and publish it on `USER_UPDATED`
    async fn update_profile(&self, ctx: &Context<'_>, input: UpdateProfileInput) -> Result<User> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let pubsub = ctx.data_unchecked::<PubSub>();

        if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(bad_input("Name cannot be empty"));
        }

        let updated = db
            .users()
            .update(
                &user.user_id,
                UpdateUser {
                    name: input.name,
                    photo_url: maybe(input.photo_url),
                    status_message: maybe(input.status_message),
                },
            )
            .await?
            .ok_or_else(|| not_found("User not found"))?;

        pubsub.publish(Topic::UserUpdated, UserEvent::from(updated.clone()));

        Ok(updated.into())
    }

    /// Register a device push token for the requester
    async fn register_push_token(
        &self,
        ctx: &Context<'_>,
        token: String,
        device: Option<String>,
    ) -> Result<bool> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        if token.trim().is_empty() {
            return Err(bad_input("Push token cannot be empty"));
        }

        db.users()
            .add_push_token(&user.user_id, token.trim(), device.as_deref())
            .await?;

        tracing::debug!(user_id = %user.user_id, "Push token registered");
        Ok(true)
    }

    /// Remove a push token; returns whether it was registered to the requester
    async fn unregister_push_token(&self, ctx: &Context<'_>, token: String) -> Result<bool> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        Ok(db.users().remove_push_token(&user.user_id, token.trim()).await?)
    }

    /// Hide another user's messages from the requester
    async fn block_user(&self, ctx: &Context<'_>, user_id: String) -> Result<bool> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        if user_id == user.user_id {
            return Err(bad_input("Cannot block yourself"));
        }
        if db.users().get_by_id(&user_id).await?.is_none() {
            return Err(not_found("User not found"));
        }

        db.blocked_users().block(&user.user_id, &user_id).await?;
        Ok(true)
    }

    /// Returns whether a block existed
    async fn unblock_user(&self, ctx: &Context<'_>, user_id: String) -> Result<bool> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        Ok(db.blocked_users().unblock(&user.user_id, &user_id).await?)
    }
}
