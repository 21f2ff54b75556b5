//! Messages repository
//!
//! Messages are soft-deleted: `deleted_at` is set and the row is kept. Paging
//! is keyset based on `(created_at, id)`; see [PageWindow].

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool as Pool};

use super::sqlite_helpers::{json_to_vec, new_id, now_iso8601, vec_to_json};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub message_type: String,
    pub text: Option<String>,
    pub image_urls: Vec<String>,
    pub file_urls: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    channel_id: String,
    sender_id: String,
    message_type: String,
    text: Option<String>,
    image_urls: String,
    file_urls: String,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl From<MessageRow> for MessageRecord {
    fn from(r: MessageRow) -> Self {
        Self {
            id: r.id,
            channel_id: r.channel_id,
            sender_id: r.sender_id,
            message_type: r.message_type,
            text: r.text,
            image_urls: json_to_vec(&r.image_urls),
            file_urls: json_to_vec(&r.file_urls),
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

/// Input for creating a message
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub channel_id: String,
    pub sender_id: String,
    pub message_type: String,
    pub text: Option<String>,
    pub image_urls: Vec<String>,
    pub file_urls: Vec<String>,
}

/// Direction of travel through a channel's history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    /// Oldest to newest, starting after the anchor (or at the beginning)
    Forward,
    /// Newest to oldest, starting before the anchor (or at the end)
    Backward,
}

/// Native pagination parameters for a keyset query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub direction: PageDirection,
    /// Id of the row the page starts after (forward) or before (backward)
    pub anchor_id: Option<String>,
    pub limit: i64,
}

/// A page of messages in ascending creation order
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<MessageRecord>,
    /// More rows exist beyond the page in the direction of travel
    pub has_more: bool,
}

const MESSAGE_COLUMNS: &str = "id, channel_id, sender_id, message_type, text, image_urls, \
     file_urls, created_at, updated_at, deleted_at";

// ============================================================================
// Repository
// ============================================================================

pub struct MessageRepository {
    pool: Pool,
}

impl MessageRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Insert a message and point the channel's `last_message_id` at it.
    ///
    /// Both writes share one transaction; if the channel does not exist the
    /// insert is rolled back.
    pub async fn create_in_channel(&self, input: CreateMessage) -> Result<MessageRecord> {
        let id = new_id();
        let now = now_iso8601();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, channel_id, sender_id, message_type, text,
                image_urls, file_urls, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.channel_id)
        .bind(&input.sender_id)
        .bind(&input.message_type)
        .bind(&input.text)
        .bind(vec_to_json(&input.image_urls))
        .bind(vec_to_json(&input.file_urls))
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            "UPDATE channels SET last_message_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&id)
        .bind(&now)
        .bind(&input.channel_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            bail!("Channel {} not found", input.channel_id);
        }

        tx.commit().await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve message after insert"))
    }

    /// Get a message by ID, deleted or not
    pub async fn get_by_id(&self, id: &str) -> Result<Option<MessageRecord>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MessageRecord::from))
    }

    /// Most recently created non-deleted message of a channel
    pub async fn latest_in_channel(&self, channel_id: &str) -> Result<Option<MessageRecord>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE channel_id = ? AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MessageRecord::from))
    }

    /// Fetch one page of a channel's messages, leaving out anything sent by
    /// `excluded_senders`.
    pub async fn page(
        &self,
        channel_id: &str,
        excluded_senders: &[String],
        window: &PageWindow,
    ) -> Result<MessagePage> {
        let anchor = match &window.anchor_id {
            Some(anchor_id) => {
                let anchor = sqlx::query_as::<_, (String, String)>(
                    "SELECT created_at, id FROM messages WHERE id = ? AND channel_id = ?",
                )
                .bind(anchor_id)
                .bind(channel_id)
                .fetch_optional(&self.pool)
                .await?;

                match anchor {
                    Some(anchor) => Some(anchor),
                    None => bail!("Cursor does not point at a message in this channel"),
                }
            }
            None => None,
        };

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE channel_id = "
        ));
        qb.push_bind(channel_id.to_string());

        if !excluded_senders.is_empty() {
            qb.push(" AND sender_id NOT IN (");
            let mut ids = qb.separated(", ");
            for sender_id in excluded_senders {
                ids.push_bind(sender_id.clone());
            }
            ids.push_unseparated(")");
        }

        let (comparison, order) = match window.direction {
            PageDirection::Forward => (">", "ASC"),
            PageDirection::Backward => ("<", "DESC"),
        };

        if let Some((created_at, id)) = anchor {
            qb.push(format!(" AND (created_at, id) {comparison} ("));
            qb.push_bind(created_at);
            qb.push(", ");
            qb.push_bind(id);
            qb.push(")");
        }

        qb.push(format!(" ORDER BY created_at {order}, id {order} LIMIT "));
        qb.push_bind(window.limit + 1);

        let rows = qb
            .build_query_as::<MessageRow>()
            .fetch_all(&self.pool)
            .await?;

        let has_more = rows.len() as i64 > window.limit;
        let mut messages: Vec<MessageRecord> = rows
            .into_iter()
            .take(window.limit as usize)
            .map(MessageRecord::from)
            .collect();

        if window.direction == PageDirection::Backward {
            messages.reverse();
        }

        Ok(MessagePage { messages, has_more })
    }

    /// Soft-delete a message by stamping `deleted_at`.
    ///
    /// If the channel's `last_message_id` pointed at this message it is moved
    /// to the newest remaining live message (or cleared). Deleting twice keeps
    /// the first deletion time.
    pub async fn soft_delete(&self, id: &str) -> Result<Option<MessageRecord>> {
        let now = now_iso8601();

        let mut tx = self.pool.begin().await?;

        let channel_id = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE messages
            SET updated_at = CASE WHEN deleted_at IS NULL THEN ? ELSE updated_at END,
                deleted_at = COALESCE(deleted_at, ?)
            WHERE id = ?
            RETURNING channel_id
            "#,
        )
        .bind(&now)
        .bind(&now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(channel_id) = channel_id else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE channels
            SET last_message_id = (
                SELECT m.id FROM messages m
                WHERE m.channel_id = channels.id AND m.deleted_at IS NULL
                ORDER BY m.created_at DESC, m.id DESC
                LIMIT 1
            )
            WHERE id = ? AND last_message_id = ?
            "#,
        )
        .bind(&channel_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_id(id).await
    }
}
