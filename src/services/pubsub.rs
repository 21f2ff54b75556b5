//! In-process pub/sub for user presence and profile events
//!
//! One broadcast channel per [Topic]. The hub is handed to the GraphQL schema
//! as data, so every schema (and every test) owns an independent instance.
//! Subscribers only see events published after they subscribed.

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::db::UserRecord;

/// Named event topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    UserSignedIn,
    UserUpdated,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::UserSignedIn => "USER_SIGNED_IN",
            Topic::UserUpdated => "USER_UPDATED",
        }
    }
}

/// Payload published on the user topics: the user id plus public profile fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEvent {
    pub id: String,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub status_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for UserEvent {
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

/// Broadcast hub keyed by [Topic]
#[derive(Clone)]
pub struct PubSub {
    user_signed_in: broadcast::Sender<UserEvent>,
    user_updated: broadcast::Sender<UserEvent>,
}

impl PubSub {
    /// Create a hub whose topics each buffer up to `capacity` events per
    /// slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (user_signed_in, _) = broadcast::channel(capacity);
        let (user_updated, _) = broadcast::channel(capacity);

        Self {
            user_signed_in,
            user_updated,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<UserEvent> {
        match topic {
            Topic::UserSignedIn => &self.user_signed_in,
            Topic::UserUpdated => &self.user_updated,
        }
    }

    /// Publish an event; returns how many subscribers received it
    pub fn publish(&self, topic: Topic, event: UserEvent) -> usize {
        match self.sender(topic).send(event) {
            Ok(receivers) => {
                debug!(topic = topic.as_str(), receivers, "Published event");
                receivers
            }
            // No live subscribers; the event is dropped, there is no replay
            Err(_) => 0,
        }
    }

    /// Subscribe to the raw event stream of a topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<UserEvent> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to a topic, keeping only events accepted by `filter`
    pub fn subscribe_filtered<F>(&self, topic: Topic, filter: F) -> impl Stream<Item = UserEvent> + use<F>
    where
        F: Fn(&UserEvent) -> bool + Send + 'static,
    {
        BroadcastStream::new(self.subscribe(topic)).filter_map(move |result| match result {
            Ok(event) if filter(&event) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(topic = topic.as_str(), skipped, "Subscriber lagged; events dropped");
                None
            }
        })
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new(256)
    }
}
