//! Users repository: accounts, profiles and push tokens

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{new_id, now_iso8601};

// ============================================================================
// User Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub status_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Profile changes; `None` leaves a field untouched, `Some(None)` clears it
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub photo_url: Option<Option<String>>,
    pub status_message: Option<Option<String>>,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, photo_url, status_message, created_at, updated_at";

// ============================================================================
// Repository
// ============================================================================

pub struct UsersRepository {
    pool: Pool,
}

impl UsersRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Update profile fields and return the fresh record
    pub async fn update(&self, id: &str, update: UpdateUser) -> Result<Option<UserRecord>> {
        let Some(current) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let name = update.name.unwrap_or(current.name);
        let photo_url = update.photo_url.unwrap_or(current.photo_url);
        let status_message = update.status_message.unwrap_or(current.status_message);

        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, photo_url = ?, status_message = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&photo_url)
        .bind(&status_message)
        .bind(now_iso8601())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    // ========================================================================
    // Push tokens
    // ========================================================================

    /// Register a push token for a user. A token already known for another
    /// user (device changed hands) is moved to this user.
    pub async fn add_push_token(&self, user_id: &str, token: &str, device: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO push_tokens (token, user_id, device, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET user_id = excluded.user_id, device = excluded.device
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(device)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a push token owned by the user
    pub async fn remove_push_token(&self, user_id: &str, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM push_tokens WHERE token = ? AND user_id = ?")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
