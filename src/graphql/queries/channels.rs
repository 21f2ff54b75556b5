use super::prelude::*;

#[derive(Default)]
pub struct ChannelQueries;

#[Object]
impl ChannelQueries {
    /// Get a live channel by ID; only members can see it
    async fn channel(&self, ctx: &Context<'_>, id: String) -> Result<Option<Channel>> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let channel = db
            .channels()
            .get_by_id(&id)
            .await?
            .filter(|c| c.deleted_at.is_none());
        let Some(channel) = channel else {
            return Ok(None);
        };

        if !db.channels().is_member(&channel.id, &user.user_id).await? {
            return Err(forbidden("Not a member of this channel"));
        }

        Ok(Some(channel.into()))
    }

    /// Channels the requester belongs to, most recently active first
    async fn my_channels(&self, ctx: &Context<'_>) -> Result<Vec<Channel>> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let records = db.channels().list_for_user(&user.user_id).await?;
        Ok(records.into_iter().map(Channel::from).collect())
    }
}
