//! Application services

pub mod auth;
pub mod i18n;
pub mod notifications;
pub mod pubsub;
pub mod push;

pub use auth::{AuthConfig, AuthError, AuthService};
pub use i18n::Locale;
pub use notifications::{NotificationService, PushDispatchReport, PushStatsSnapshot};
pub use pubsub::{PubSub, Topic, UserEvent};
pub use push::{DisabledPushGateway, ExpoPushGateway, PushGateway, PushMessage};
