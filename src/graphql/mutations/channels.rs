use super::prelude::*;

#[derive(Default)]
pub struct ChannelMutations;

#[Object]
impl ChannelMutations {
    /// Create a channel owned by the requester with the listed users as members
    async fn create_channel(&self, ctx: &Context<'_>, input: ChannelCreateInput) -> Result<Channel> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let users = db.users();
        for member_id in &input.user_ids {
            if users.get_by_id(member_id).await?.is_none() {
                return Err(not_found(format!("User {} not found", member_id)));
            }
        }

        let channel = db
            .channels()
            .create(CreateChannel {
                channel_type: input.channel_type.as_str().to_string(),
                name: input.name,
                owner_id: user.user_id.clone(),
                member_ids: input.user_ids,
            })
            .await?;

        tracing::info!(channel_id = %channel.id, owner_id = %user.user_id, "Channel created");
        Ok(channel.into())
    }
}
