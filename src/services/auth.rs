//! Authentication service
//!
//! Provides:
//! - Account sign-up and sign-in
//! - Password hashing with bcrypt
//! - JWT issuing and validation

use anyhow::anyhow;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{CreateUser, Database, UserRecord};
use crate::graphql::auth::AuthUser;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,
    pub email: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

// ============================================================================
// Auth Types
// ============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Sign-up input
#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Token plus the user it was issued for
#[derive(Debug, Clone)]
pub struct SignInResult {
    pub token: String,
    pub user: UserRecord,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub token_lifetime: i64,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            token_lifetime: 30 * 24 * 60 * 60,
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

// ============================================================================
// Auth Service
// ============================================================================

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: Database, config: AuthConfig) -> Self {
        Self { db, config }
    }

    /// Create an account and sign it in
    pub async fn sign_up(&self, input: SignUpInput) -> AuthResult<SignInResult> {
        let users = self.db.users();
        let email = input.email.trim().to_string();

        if users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_password(&input.password)?;
        let user = users
            .create(CreateUser {
                email,
                password_hash,
                name: input.name,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Account created");

        let token = self.issue_token(&user)?;
        Ok(SignInResult { token, user })
    }

    /// Verify credentials and issue a token
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SignInResult> {
        let user = self
            .db
            .users()
            .get_by_email(email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok(SignInResult { token, user })
    }

    /// Issue an HS256 access token for a user
    pub fn issue_token(&self, user: &UserRecord) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            exp: (now + Duration::seconds(self.config.token_lifetime)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| anyhow!("Failed to create access token: {}", e))?;

        Ok(token)
    }

    /// Decode and validate an access token
    pub fn verify_token(&self, token: &str) -> AuthResult<AuthUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(AuthUser {
            user_id: token_data.claims.sub,
            email: token_data.claims.email,
        })
    }

    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        hash(password, self.config.bcrypt_cost).map_err(|e| anyhow!("Failed to hash password: {}", e))
    }

    fn verify_password(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        verify(password, hash).map_err(|e| anyhow!("Failed to verify password: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    async fn service() -> AuthService {
        let db = Database::connect_in_memory().await.unwrap();
        AuthService::new(
            db,
            AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_lifetime: 60,
                bcrypt_cost: 4,
            },
        )
    }

    fn input(email: &str) -> SignUpInput {
        SignUpInput {
            email: email.to_string(),
            password: "hunter22".to_string(),
            name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let auth = service().await;
        let created = auth.sign_up(input("alice@example.com")).await.unwrap();

        let signed_in = auth.sign_in("ALICE@example.com", "hunter22").await.unwrap();
        assert_eq!(signed_in.user.id, created.user.id);

        let claims = auth.verify_token(&signed_in.token).unwrap();
        assert_eq!(claims.user_id, created.user.id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let auth = service().await;
        auth.sign_up(input("bob@example.com")).await.unwrap();
        assert_matches!(
            auth.sign_up(input("Bob@Example.com")).await,
            Err(AuthError::EmailTaken)
        );
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let auth = service().await;
        auth.sign_up(input("carol@example.com")).await.unwrap();

        assert_matches!(
            auth.sign_in("carol@example.com", "nope").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_matches!(
            auth.sign_in("nobody@example.com", "hunter22").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_invalid() {
        let auth = service().await;
        let created = auth.sign_up(input("dave@example.com")).await.unwrap();

        let other = AuthService::new(
            Database::connect_in_memory().await.unwrap(),
            AuthConfig {
                jwt_secret: "other".to_string(),
                ..AuthConfig::default()
            },
        );
        assert_matches!(other.verify_token(&created.token), Err(AuthError::InvalidToken(_)));
        assert_matches!(auth.verify_token("garbage"), Err(AuthError::InvalidToken(_)));
    }
}
