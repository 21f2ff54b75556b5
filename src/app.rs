//! Application state and HTTP router construction.
//!
//! Used by `main` and by the integration tests to build the Axum app.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::graphql::{HubbubSchema, SchemaDeps, build_schema};
use crate::services::auth::{AuthConfig, AuthService};
use crate::services::notifications::NotificationService;
use crate::services::pubsub::PubSub;
use crate::services::push::{DisabledPushGateway, ExpoPushGateway, PushGateway};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub schema: HubbubSchema,
    pub auth: Arc<AuthService>,
    pub notifications: Arc<NotificationService>,
}

impl AppState {
    /// Wire services and the schema from configuration
    pub fn new(config: Arc<Config>, db: Database) -> Result<Self> {
        let gateway: Arc<dyn PushGateway> = if config.push_enabled {
            Arc::new(ExpoPushGateway::new(
                config.push_gateway_url.clone(),
                Duration::from_secs(config.push_timeout_secs),
            )?)
        } else {
            tracing::info!("Push notifications disabled");
            Arc::new(DisabledPushGateway)
        };

        Ok(Self::with_gateway(config, db, gateway))
    }

    /// Same as [AppState::new] with an explicit push gateway
    pub fn with_gateway(config: Arc<Config>, db: Database, gateway: Arc<dyn PushGateway>) -> Self {
        let auth = Arc::new(AuthService::new(
            db.clone(),
            AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
                token_lifetime: config.token_lifetime_secs,
                bcrypt_cost: config.bcrypt_cost,
            },
        ));
        let notifications = Arc::new(NotificationService::new(db.clone(), gateway));

        let schema = build_schema(SchemaDeps {
            db: db.clone(),
            pubsub: PubSub::new(config.pubsub_capacity),
            auth: auth.clone(),
            notifications: notifications.clone(),
            default_locale: config.default_locale,
        });

        Self {
            config,
            db,
            schema,
            auth,
            notifications,
        }
    }
}

/// Build the full Axum router: /graphql, /graphql/ws, health, uploads, layers.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .merge(api::health::router())
        .merge(api::graphql::router())
        .merge(api::upload::router())
        .nest_service("/uploads", uploads)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
