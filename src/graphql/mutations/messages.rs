//! Message mutations
//!
//! `createMessage` persists the message and moves the channel pointer in one
//! transaction, then hands push delivery to the notification service without
//! waiting for it.

use super::prelude::*;

use crate::services::i18n::Locale;
use crate::services::notifications::NotificationService;

#[derive(Default)]
pub struct MessageMutations;

#[Object]
impl MessageMutations {
    /// Post a message to a channel the requester belongs to
    async fn create_message(
        &self,
        ctx: &Context<'_>,
        channel_id: String,
        message: MessageCreateInput,
    ) -> Result<Message> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let notifications = ctx.data_unchecked::<Arc<NotificationService>>();

        let channel = db
            .channels()
            .get_by_id(&channel_id)
            .await?
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| not_found("Channel not found"))?;

        if !db.channels().is_member(&channel.id, &user.user_id).await? {
            return Err(forbidden("Not a member of this channel"));
        }

        let created = db
            .messages()
            .create_in_channel(CreateMessage {
                channel_id: channel.id.clone(),
                sender_id: user.user_id.clone(),
                message_type: message.message_type.as_str().to_string(),
                text: message.text,
                image_urls: message.image_urls.unwrap_or_default(),
                file_urls: message.file_urls.unwrap_or_default(),
            })
            .await?;

        tracing::info!(
            message_id = %created.id,
            channel_id = %created.channel_id,
            sender_id = %created.sender_id,
            "Message created"
        );

        let sender_name = db
            .users()
            .get_by_id(&user.user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| user.email.clone());
        let locale = ctx.data_opt::<Locale>().copied().unwrap_or_default();

        // Delivery runs detached; the handle is dropped on purpose
        if let Err(e) = notifications
            .notify_new_message(&created, &sender_name, locale)
            .await
        {
            tracing::warn!(message_id = %created.id, error = %e, "Failed to start push fan-out");
        }

        Ok(created.into())
    }

    /// Soft-delete a message in a channel the requester belongs to. Returns
    /// null when no message has this id.
    async fn delete_message(&self, ctx: &Context<'_>, id: String) -> Result<Option<Message>> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let Some(message) = db.messages().get_by_id(&id).await? else {
            return Ok(None);
        };
        if !db.channels().is_member(&message.channel_id, &user.user_id).await? {
            return Err(forbidden("Not a member of this channel"));
        }

        let deleted = db.messages().soft_delete(&id).await?;
        if deleted.is_some() {
            tracing::info!(message_id = %id, user_id = %user.user_id, "Message deleted");
        }

        Ok(deleted.map(Message::from))
    }
}
