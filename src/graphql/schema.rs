//! GraphQL schema definition with queries, mutations, and subscriptions
//!
//! All operations require authentication except `signUp`, `signIn` and the
//! subscriptions.

use std::sync::Arc;

use async_graphql::extensions::Tracing;
use async_graphql::{MergedObject, Schema};

use crate::db::Database;
use crate::services::auth::AuthService;
use crate::services::i18n::Locale;
use crate::services::notifications::NotificationService;
use crate::services::pubsub::PubSub;

use super::mutations::{AuthMutations, ChannelMutations, MessageMutations, UserMutations};
use super::queries::{ChannelQueries, UserQueries};
use super::subscriptions::SubscriptionRoot;

/// The GraphQL schema type
pub type HubbubSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(UserQueries, ChannelQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(AuthMutations, UserMutations, ChannelMutations, MessageMutations);

/// Everything resolvers read from schema data
#[derive(Clone)]
pub struct SchemaDeps {
    pub db: Database,
    pub pubsub: PubSub,
    pub auth: Arc<AuthService>,
    pub notifications: Arc<NotificationService>,
    /// Used when a request carries no usable `Accept-Language`
    pub default_locale: Locale,
}

/// Build the GraphQL schema with all resolvers
pub fn build_schema(deps: SchemaDeps) -> HubbubSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), SubscriptionRoot)
        .extension(Tracing)
        .data(deps.db)
        .data(deps.pubsub)
        .data(deps.auth)
        .data(deps.notifications)
        .data(deps.default_locale)
        .finish()
}
