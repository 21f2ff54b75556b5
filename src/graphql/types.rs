//! GraphQL type definitions
//!
//! These types mirror the database records but are decorated with
//! async-graphql attributes. `Channel`, `Message` and `Membership` carry
//! resolvers for their derived fields.

use async_graphql::{Context, Enum, InputObject, MaybeUndefined, Object, Result, SimpleObject};
use serde::{Deserialize, Serialize};

use crate::db::{
    ChannelRecord, Database, MembershipRecord, MessageRecord, UserRecord,
};
use crate::define_connection;
use crate::services::pubsub::UserEvent;

use super::auth::AuthExt;
use super::errors::bad_input;
use super::pagination::{Connection, PageArgs, parse_page_args};

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Serialize, Deserialize, Default)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    #[default]
    Private,
    Public,
    /// A user's channel with themselves
    #[graphql(name = "SELF")]
    SelfChannel,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Private => "private",
            ChannelType::Public => "public",
            ChannelType::SelfChannel => "self",
        }
    }
}

impl From<&str> for ChannelType {
    fn from(s: &str) -> Self {
        match s {
            "public" => ChannelType::Public,
            "self" => ChannelType::SelfChannel,
            _ => ChannelType::Private,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Serialize, Deserialize, Default)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    Text,
    Photo,
    File,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Photo => "photo",
            MessageType::File => "file",
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        match s {
            "photo" => MessageType::Photo,
            "file" => MessageType::File,
            _ => MessageType::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Serialize, Deserialize)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum MembershipType {
    Owner,
    Member,
}

impl From<&str> for MembershipType {
    fn from(s: &str) -> Self {
        match s {
            "owner" => MembershipType::Owner,
            _ => MembershipType::Member,
        }
    }
}

// ============================================================================
// User
// ============================================================================

/// Public profile of a user
#[derive(Debug, Clone, SimpleObject, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub status_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            photo_url: r.photo_url,
            status_message: r.status_message,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<UserEvent> for User {
    fn from(e: UserEvent) -> Self {
        Self {
            id: e.id,
            email: e.email,
            name: e.name,
            photo_url: e.photo_url,
            status_message: e.status_message,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

// ============================================================================
// Message
// ============================================================================

#[derive(Debug, Clone)]
pub struct Message {
    pub record: MessageRecord,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self { record }
    }
}

#[Object]
impl Message {
    async fn id(&self) -> &str {
        &self.record.id
    }

    async fn channel_id(&self) -> &str {
        &self.record.channel_id
    }

    async fn sender_id(&self) -> &str {
        &self.record.sender_id
    }

    async fn message_type(&self) -> MessageType {
        MessageType::from(self.record.message_type.as_str())
    }

    async fn text(&self) -> Option<&str> {
        self.record.text.as_deref()
    }

    async fn image_urls(&self) -> &[String] {
        &self.record.image_urls
    }

    async fn file_urls(&self) -> &[String] {
        &self.record.file_urls
    }

    async fn created_at(&self) -> &str {
        &self.record.created_at
    }

    async fn updated_at(&self) -> &str {
        &self.record.updated_at
    }

    /// Set once the message has been deleted; the row itself is kept
    async fn deleted_at(&self) -> Option<&str> {
        self.record.deleted_at.as_deref()
    }

    async fn sender(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let user = db.users().get_by_id(&self.record.sender_id).await?;
        Ok(user.map(User::from))
    }
}

define_connection!(MessageConnection, MessageEdge, Message);

// ============================================================================
// Membership
// ============================================================================

#[derive(Debug, Clone)]
pub struct Membership {
    pub record: MembershipRecord,
}

impl From<MembershipRecord> for Membership {
    fn from(record: MembershipRecord) -> Self {
        Self { record }
    }
}

#[Object]
impl Membership {
    async fn id(&self) -> &str {
        &self.record.id
    }

    async fn channel_id(&self) -> &str {
        &self.record.channel_id
    }

    async fn user_id(&self) -> &str {
        &self.record.user_id
    }

    async fn membership_type(&self) -> MembershipType {
        MembershipType::from(self.record.membership_type.as_str())
    }

    async fn created_at(&self) -> &str {
        &self.record.created_at
    }

    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let user = db.users().get_by_id(&self.record.user_id).await?;
        Ok(user.map(User::from))
    }
}

// ============================================================================
// Channel
// ============================================================================

#[derive(Debug, Clone)]
pub struct Channel {
    pub record: ChannelRecord,
}

impl From<ChannelRecord> for Channel {
    fn from(record: ChannelRecord) -> Self {
        Self { record }
    }
}

#[Object]
impl Channel {
    async fn id(&self) -> &str {
        &self.record.id
    }

    async fn channel_type(&self) -> ChannelType {
        ChannelType::from(self.record.channel_type.as_str())
    }

    async fn name(&self) -> Option<&str> {
        self.record.name.as_deref()
    }

    async fn last_message_id(&self) -> Option<&str> {
        self.record.last_message_id.as_deref()
    }

    async fn created_at(&self) -> &str {
        &self.record.created_at
    }

    async fn updated_at(&self) -> &str {
        &self.record.updated_at
    }

    async fn deleted_at(&self) -> Option<&str> {
        self.record.deleted_at.as_deref()
    }

    /// Newest message that has not been deleted
    async fn last_message(&self, ctx: &Context<'_>) -> Result<Option<Message>> {
        let db = ctx.data_unchecked::<Database>();
        let message = db.messages().latest_in_channel(&self.record.id).await?;
        Ok(message.map(Message::from))
    }

    /// Channel history in ascending order, without messages from users the
    /// requester has blocked. Deleted messages are included with `deletedAt` set.
    async fn messages(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<MessageConnection> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let window = parse_page_args(&PageArgs {
            after,
            before,
            first,
            last,
        })
        .map_err(bad_input)?;

        if let Some(anchor_id) = &window.anchor_id {
            let anchor = db.messages().get_by_id(anchor_id).await?;
            if anchor.is_none_or(|m| m.channel_id != self.record.id) {
                return Err(bad_input("Cursor does not belong to this channel"));
            }
        }

        let blocked = db.blocked_users().blocked_ids(&user.user_id).await?;
        let page = db.messages().page(&self.record.id, &blocked, &window).await?;

        let messages: Vec<Message> = page.messages.into_iter().map(Message::from).collect();
        let conn = Connection::from_page(messages, page.has_more, &window, |m| m.record.id.as_str());

        Ok(MessageConnection::from_connection(conn))
    }

    /// Members of the channel; `excludeMe` leaves out the requester
    async fn memberships(
        &self,
        ctx: &Context<'_>,
        exclude_me: Option<bool>,
    ) -> Result<Vec<Membership>> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let exclude = exclude_me.unwrap_or(false).then_some(user.user_id.as_str());
        let records = db.channels().memberships(&self.record.id, exclude).await?;

        Ok(records.into_iter().map(Membership::from).collect())
    }
}

// ============================================================================
// Inputs and payloads
// ============================================================================

#[derive(Debug, Clone, InputObject)]
pub struct MessageCreateInput {
    #[graphql(default)]
    pub message_type: MessageType,
    pub text: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub file_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, InputObject)]
pub struct ChannelCreateInput {
    pub name: Option<String>,
    #[graphql(default)]
    pub channel_type: ChannelType,
    /// Members besides the creator
    #[graphql(default)]
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, InputObject)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Profile changes; omitted fields are left as they are, `null` clears
/// the nullable ones
#[derive(Debug, Clone, InputObject)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub photo_url: MaybeUndefined<String>,
    pub status_message: MaybeUndefined<String>,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}
