pub mod auth;
pub mod channels;
pub mod messages;
pub mod users;

pub use auth::AuthMutations;
pub use channels::ChannelMutations;
pub use messages::MessageMutations;
pub use users::UserMutations;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::AuthExt;
    pub(crate) use crate::graphql::errors::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::pubsub::{PubSub, Topic, UserEvent};
}
