//! Application configuration management

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bcrypt::DEFAULT_COST;

use crate::services::i18n::Locale;
use crate::services::push::EXPO_PUSH_URL;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite URL, e.g. `sqlite:./data/hubbub.db`
    pub database_url: String,

    pub database_max_connections: u32,

    /// JWT secret for token signing and verification
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub token_lifetime_secs: i64,

    pub bcrypt_cost: u32,

    /// Push gateway endpoint (Expo push API)
    pub push_gateway_url: String,

    /// When false, push notifications are logged and dropped
    pub push_enabled: bool,

    pub push_timeout_secs: u64,

    /// Per-topic buffer of the subscription broadcast channels
    pub pubsub_capacity: usize,

    /// Directory uploaded files are written to
    pub upload_dir: PathBuf,

    /// Public base URL used to build links to uploaded files
    pub public_url: String,

    pub default_locale: Locale,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // JWT_SECRET should always be set in production; generate one for dev
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            use rand::Rng;
            let bytes: [u8; 32] = rand::thread_rng().r#gen();
            let secret: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            format!("dev-secret-{}", secret)
        });

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = var_or("PORT", 4000u16)?;

        let public_url = env::var("PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let default_locale = env::var("DEFAULT_LOCALE")
            .ok()
            .and_then(|tag| Locale::parse(&tag))
            .unwrap_or_default();

        let config = Self {
            host,
            port,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/hubbub.db".to_string()),
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10)?,

            jwt_secret,
            token_lifetime_secs: var_or("TOKEN_LIFETIME_SECS", 30 * 24 * 60 * 60)?,
            bcrypt_cost: var_or("BCRYPT_COST", DEFAULT_COST)?,

            push_gateway_url: env::var("PUSH_GATEWAY_URL")
                .unwrap_or_else(|_| EXPO_PUSH_URL.to_string()),
            push_enabled: var_or("PUSH_ENABLED", true)?,
            push_timeout_secs: var_or("PUSH_TIMEOUT_SECS", 10)?,

            pubsub_capacity: var_or("PUBSUB_CAPACITY", 256)?,

            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "./data/uploads".to_string()),
            ),
            public_url,

            default_locale,
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject values that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.pubsub_capacity > 0, "PUBSUB_CAPACITY must be positive");
        anyhow::ensure!(
            self.database_max_connections > 0,
            "DATABASE_MAX_CONNECTIONS must be positive"
        );
        anyhow::ensure!(self.token_lifetime_secs > 0, "TOKEN_LIFETIME_SECS must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_or_falls_back_when_unset() {
        let value: u16 = var_or("HUBBUB_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    fn config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 4000,
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_secret: "secret".to_string(),
            token_lifetime_secs: 60,
            bcrypt_cost: 4,
            push_gateway_url: EXPO_PUSH_URL.to_string(),
            push_enabled: false,
            push_timeout_secs: 1,
            pubsub_capacity: 16,
            upload_dir: PathBuf::from("uploads"),
            public_url: "http://localhost:4000".to_string(),
            default_locale: Locale::En,
        }
    }

    #[test]
    fn test_validate_rejects_zero_pubsub_capacity() {
        assert!(config().validate().is_ok());

        let err = Config {
            pubsub_capacity: 0,
            ..config()
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("PUBSUB_CAPACITY"));

        assert!(
            Config {
                database_max_connections: 0,
                ..config()
            }
            .validate()
            .is_err()
        );
    }
}
