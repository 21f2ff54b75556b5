//! Blocked users repository

use anyhow::Result;
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{new_id, now_iso8601};
use super::users::UserRecord;

pub struct BlockedUserRepository {
    pool: Pool,
}

impl BlockedUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Record that `user_id` blocked `blocked_user_id`. Blocking twice is a no-op.
    pub async fn block(&self, user_id: &str, blocked_user_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blocked_users (id, user_id, blocked_user_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, blocked_user_id) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(blocked_user_id)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a block; returns whether one existed
    pub async fn unblock(&self, user_id: &str, blocked_user_id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM blocked_users WHERE user_id = ? AND blocked_user_id = ?")
                .bind(user_id)
                .bind(blocked_user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ids of every user `user_id` has blocked
    pub async fn blocked_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT blocked_user_id FROM blocked_users WHERE user_id = ? ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Users blocked by `user_id`
    pub async fn blocked_users(&self, user_id: &str) -> Result<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.name, u.photo_url,
                   u.status_message, u.created_at, u.updated_at
            FROM blocked_users b
            JOIN users u ON u.id = b.blocked_user_id
            WHERE b.user_id = ?
            ORDER BY b.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
