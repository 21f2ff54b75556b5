//! Push notification fan-out for new chat messages
//!
//! The service resolves receiver tokens, builds one [PushMessage] per token
//! and hands the batch to a detached task. Callers never wait for delivery;
//! failures are logged and counted in [PushStats].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::{Database, MessageRecord};
use crate::services::i18n::{Locale, MessageKey};
use crate::services::push::{PushData, PushGateway, PushMessage};

/// Running delivery counters, shared across all fan-outs
#[derive(Debug, Default)]
pub struct PushStats {
    sent: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [PushStats]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushStatsSnapshot {
    pub sent: u64,
    pub failed: u64,
}

impl PushStats {
    pub fn snapshot(&self) -> PushStatsSnapshot {
        PushStatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushDispatchReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeepLink<'a> {
    message_id: &'a str,
    channel_id: &'a str,
}

/// Service for push notifications on new messages
#[derive(Clone)]
pub struct NotificationService {
    db: Database,
    gateway: Arc<dyn PushGateway>,
    stats: Arc<PushStats>,
}

impl NotificationService {
    pub fn new(db: Database, gateway: Arc<dyn PushGateway>) -> Self {
        Self {
            db,
            gateway,
            stats: Arc::new(PushStats::default()),
        }
    }

    pub fn stats(&self) -> PushStatsSnapshot {
        self.stats.snapshot()
    }

    /// Push tokens of every channel member except the sender
    pub async fn receivers_push_tokens(&self, channel_id: &str, sender_id: &str) -> Result<Vec<String>> {
        self.db
            .channels()
            .receiver_push_tokens(channel_id, sender_id)
            .await
    }

    /// Notify the other members of the message's channel.
    ///
    /// Token lookup happens before returning; delivery runs on the returned
    /// detached task, which callers are free to drop.
    pub async fn notify_new_message(
        &self,
        message: &MessageRecord,
        sender_name: &str,
        locale: Locale,
    ) -> Result<JoinHandle<PushDispatchReport>> {
        let tokens = self
            .receivers_push_tokens(&message.channel_id, &message.sender_id)
            .await?;

        let body = notification_body(message, locale);
        let messages = tokens
            .into_iter()
            .map(|token| {
                build_push_message(token, sender_name, &body, &message.id, &message.channel_id)
            })
            .collect();

        Ok(self.dispatch(messages))
    }

    /// Send every message on a detached task, one request per token
    pub fn dispatch(&self, messages: Vec<PushMessage>) -> JoinHandle<PushDispatchReport> {
        let gateway = self.gateway.clone();
        let stats = self.stats.clone();

        tokio::spawn(async move {
            let attempted = messages.len();
            if attempted == 0 {
                debug!("No push receivers");
                return PushDispatchReport::default();
            }

            let results = join_all(messages.iter().map(|m| gateway.send(m))).await;

            let mut report = PushDispatchReport {
                attempted,
                ..Default::default()
            };
            for (message, result) in messages.iter().zip(results) {
                match result {
                    Ok(()) => {
                        report.delivered += 1;
                        stats.sent.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        report.failed += 1;
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(to = %message.to, error = %e, "Push delivery failed");
                    }
                }
            }

            info!(
                attempted = report.attempted,
                delivered = report.delivered,
                failed = report.failed,
                "Push fan-out finished"
            );
            report
        })
    }
}

/// Body text for a message notification: a localized placeholder for media,
/// the raw text otherwise
pub fn notification_body(message: &MessageRecord, locale: Locale) -> String {
    match message.message_type.as_str() {
        "photo" => locale.translate(MessageKey::Photo).to_string(),
        "file" => locale.translate(MessageKey::File).to_string(),
        _ => message.text.clone().unwrap_or_default(),
    }
}

pub fn build_push_message(
    token: String,
    sender_name: &str,
    body: &str,
    message_id: &str,
    channel_id: &str,
) -> PushMessage {
    let link = DeepLink {
        message_id,
        channel_id,
    };

    PushMessage {
        to: token,
        sound: "default".to_string(),
        title: sender_name.to_string(),
        body: body.to_string(),
        data: PushData {
            data: serde_json::to_string(&link).unwrap_or_default(),
        },
    }
}
