pub mod channels;
pub mod users;

pub use channels::ChannelQueries;
pub use users::UserQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard};
    pub(crate) use crate::graphql::errors::*;
    pub(crate) use crate::graphql::types::*;
}
