//! Channels and memberships repository

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{new_id, now_iso8601};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChannelRecord {
    pub id: String,
    pub channel_type: String,
    pub name: Option<String>,
    pub last_message_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MembershipRecord {
    pub id: String,
    pub channel_id: String,
    pub user_id: String,
    pub membership_type: String,
    pub created_at: String,
}

/// Input for creating a channel together with its memberships
#[derive(Debug, Clone)]
pub struct CreateChannel {
    pub channel_type: String,
    pub name: Option<String>,
    /// The creating user, stored as the owner membership
    pub owner_id: String,
    /// Other members; duplicates and the owner are ignored
    pub member_ids: Vec<String>,
}

const CHANNEL_COLUMNS: &str =
    "id, channel_type, name, last_message_id, created_at, updated_at, deleted_at";

// ============================================================================
// Repository
// ============================================================================

pub struct ChannelRepository {
    pool: Pool,
}

impl ChannelRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a channel and all its memberships in one transaction
    pub async fn create(&self, input: CreateChannel) -> Result<ChannelRecord> {
        let id = new_id();
        let now = now_iso8601();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO channels (id, channel_type, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.channel_type)
        .bind(&input.name)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO memberships (id, channel_id, user_id, membership_type, created_at)
            VALUES (?, ?, ?, 'owner', ?)
            "#,
        )
        .bind(new_id())
        .bind(&id)
        .bind(&input.owner_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for user_id in input.member_ids.iter().filter(|u| **u != input.owner_id) {
            sqlx::query(
                r#"
                INSERT INTO memberships (id, channel_id, user_id, membership_type, created_at)
                VALUES (?, ?, ?, 'member', ?)
                ON CONFLICT(channel_id, user_id) DO NOTHING
                "#,
            )
            .bind(new_id())
            .bind(&id)
            .bind(user_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve channel after insert"))
    }

    /// Get a channel by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<ChannelRecord>> {
        let record = sqlx::query_as::<_, ChannelRecord>(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List live channels the user belongs to, most recently active first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChannelRecord>> {
        let records = sqlx::query_as::<_, ChannelRecord>(
            r#"
            SELECT c.id, c.channel_type, c.name, c.last_message_id,
                   c.created_at, c.updated_at, c.deleted_at
            FROM channels c
            JOIN memberships m ON m.channel_id = c.id
            WHERE m.user_id = ? AND c.deleted_at IS NULL
            ORDER BY c.updated_at DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    // ========================================================================
    // Memberships
    // ========================================================================

    /// List memberships of a channel, optionally leaving out one user
    pub async fn memberships(
        &self,
        channel_id: &str,
        exclude_user_id: Option<&str>,
    ) -> Result<Vec<MembershipRecord>> {
        let records = match exclude_user_id {
            Some(user_id) => {
                sqlx::query_as::<_, MembershipRecord>(
                    r#"
                    SELECT id, channel_id, user_id, membership_type, created_at
                    FROM memberships
                    WHERE channel_id = ? AND user_id != ?
                    ORDER BY created_at, id
                    "#,
                )
                .bind(channel_id)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MembershipRecord>(
                    r#"
                    SELECT id, channel_id, user_id, membership_type, created_at
                    FROM memberships
                    WHERE channel_id = ?
                    ORDER BY created_at, id
                    "#,
                )
                .bind(channel_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    /// Check whether a user is a member of a channel
    pub async fn is_member(&self, channel_id: &str, user_id: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM memberships WHERE channel_id = ? AND user_id = ?",
        )
        .bind(channel_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Push tokens of every member of the channel except `sender_id`
    pub async fn receiver_push_tokens(&self, channel_id: &str, sender_id: &str) -> Result<Vec<String>> {
        let tokens = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.token
            FROM memberships m
            JOIN push_tokens p ON p.user_id = m.user_id
            WHERE m.channel_id = ? AND m.user_id != ?
            ORDER BY m.created_at, p.created_at
            "#,
        )
        .bind(channel_id)
        .bind(sender_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }
}
