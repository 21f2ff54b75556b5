//! Push gateway client (Expo push API)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Expo push endpoint
pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// One push notification addressed to a single device token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
    pub data: PushData,
}

/// Deep-link payload; `data` holds a JSON string so the client can parse it as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushData {
    pub data: String,
}

/// Something that can deliver a [PushMessage]
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: ExpoTicket,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    message: Option<String>,
}

/// HTTP client for the Expo push service
#[derive(Clone)]
pub struct ExpoPushGateway {
    endpoint: String,
    client: Client,
}

impl ExpoPushGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create push HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(message)
            .send()
            .await
            .context("Failed to send push request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Push gateway returned {}: {}", status, body);
        }

        let ticket: ExpoResponse = resp
            .json()
            .await
            .context("Failed to parse push gateway response")?;

        if ticket.data.status != "ok" {
            anyhow::bail!(
                "Push rejected: {}",
                ticket.data.message.unwrap_or_else(|| ticket.data.status.clone())
            );
        }

        debug!(to = %message.to, "Push accepted by gateway");
        Ok(())
    }
}

/// Gateway used when push delivery is turned off; drops every message
pub struct DisabledPushGateway;

#[async_trait]
impl PushGateway for DisabledPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<()> {
        debug!(to = %message.to, "Push disabled; dropping message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_message_wire_shape() {
        let message = PushMessage {
            to: "ExponentPushToken[abc]".to_string(),
            sound: "default".to_string(),
            title: "Alice".to_string(),
            body: "hi".to_string(),
            data: PushData {
                data: r#"{"messageId":"m1","channelId":"c1"}"#.to_string(),
            },
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "to": "ExponentPushToken[abc]",
                "sound": "default",
                "title": "Alice",
                "body": "hi",
                "data": { "data": "{\"messageId\":\"m1\",\"channelId\":\"c1\"}" }
            })
        );
    }
}
