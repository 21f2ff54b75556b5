//! GraphQL subscriptions for real-time updates
//!
//! Each subscription listens on one [PubSub] topic and forwards only the
//! events whose user id matches the `userId` argument.

use async_graphql::{Context, Subscription};
use futures::{Stream, StreamExt};

use crate::services::pubsub::{PubSub, Topic};

use super::types::User;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Fires when the given user signs in
    async fn user_signed_in<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        user_id: String,
    ) -> impl Stream<Item = User> + 'ctx {
        let pubsub = ctx.data_unchecked::<PubSub>();
        pubsub
            .subscribe_filtered(Topic::UserSignedIn, move |event| event.id == user_id)
            .map(User::from)
    }

    /// Fires when the given user updates their profile
    async fn user_updated<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        user_id: String,
    ) -> impl Stream<Item = User> + 'ctx {
        let pubsub = ctx.data_unchecked::<PubSub>();
        pubsub
            .subscribe_filtered(Topic::UserUpdated, move |event| event.id == user_id)
            .map(User::from)
    }
}
