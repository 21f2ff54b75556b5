//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_graphql::{Request, Response, Variables};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use hubbub::app::AppState;
use hubbub::config::Config;
use hubbub::db::Database;
use hubbub::graphql::AuthUser;
use hubbub::services::auth::SignUpInput;
use hubbub::services::i18n::Locale;
use hubbub::services::push::{PushGateway, PushMessage};

/// Push gateway that records instead of sending
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<PushMessage>>,
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn send(&self, message: &PushMessage) -> Result<()> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

impl RecordingGateway {
    /// Wait until at least `count` messages were recorded, then a little
    /// longer so extra sends would show up too
    pub async fn wait_for(&self, count: usize) -> Vec<PushMessage> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.sent.lock().await.len() < count && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.sent.lock().await.clone()
    }
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        jwt_secret: "integration-secret".to_string(),
        token_lifetime_secs: 3600,
        bcrypt_cost: 4,
        push_gateway_url: "http://127.0.0.1:9/push".to_string(),
        push_enabled: false,
        push_timeout_secs: 1,
        pubsub_capacity: 64,
        upload_dir: upload_dir.to_path_buf(),
        public_url: "http://localhost:4000".to_string(),
        default_locale: Locale::En,
    }
}

pub struct TestUser {
    pub token: String,
    pub auth: AuthUser,
}

impl TestUser {
    pub fn id(&self) -> &str {
        &self.auth.user_id
    }
}

pub struct Harness {
    pub state: AppState,
    pub gateway: Arc<RecordingGateway>,
    pub upload_dir: tempfile::TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let db = Database::connect_in_memory().await.unwrap();
        let gateway = Arc::new(RecordingGateway::default());
        let state = AppState::with_gateway(
            Arc::new(test_config(upload_dir.path())),
            db,
            gateway.clone(),
        );

        Self {
            state,
            gateway,
            upload_dir,
        }
    }

    pub async fn user(&self, name: &str) -> TestUser {
        let result = self
            .state
            .auth
            .sign_up(SignUpInput {
                email: format!("{}@example.com", name),
                password: "password".to_string(),
                name: name.to_string(),
            })
            .await
            .unwrap();
        let auth = self.state.auth.verify_token(&result.token).unwrap();

        TestUser {
            token: result.token,
            auth,
        }
    }

    pub async fn execute(&self, as_user: Option<&TestUser>, query: &str, variables: Value) -> Response {
        let mut request = Request::new(query).variables(Variables::from_json(variables));
        if let Some(user) = as_user {
            request = request.data(user.auth.clone());
        }
        self.state.schema.execute(request).await
    }

    pub async fn execute_with_locale(
        &self,
        as_user: &TestUser,
        locale: Locale,
        query: &str,
        variables: Value,
    ) -> Response {
        let request = Request::new(query)
            .variables(Variables::from_json(variables))
            .data(as_user.auth.clone())
            .data(locale);
        self.state.schema.execute(request).await
    }

    /// Run a request that must succeed and return its data as JSON
    pub async fn ok(&self, as_user: Option<&TestUser>, query: &str, variables: Value) -> Value {
        let resp = self.execute(as_user, query, variables).await;
        assert!(resp.errors.is_empty(), "unexpected errors: {:?}", resp.errors);
        resp.data.into_json().unwrap()
    }

    pub async fn channel(&self, owner: &TestUser, members: &[&TestUser]) -> String {
        let ids: Vec<&str> = members.iter().map(|m| m.id()).collect();
        let data = self
            .ok(
                Some(owner),
                "mutation($ids: [String!]!) { createChannel(input: { userIds: $ids }) { id } }",
                serde_json::json!({ "ids": ids }),
            )
            .await;
        data["createChannel"]["id"].as_str().unwrap().to_string()
    }

    pub async fn say(&self, sender: &TestUser, channel_id: &str, text: &str) -> String {
        // keep creation timestamps distinct
        tokio::time::sleep(Duration::from_millis(2)).await;
        let data = self
            .ok(
                Some(sender),
                "mutation($c: String!, $t: String) { createMessage(channelId: $c, message: { text: $t }) { id } }",
                serde_json::json!({ "c": channel_id, "t": text }),
            )
            .await;
        data["createMessage"]["id"].as_str().unwrap().to_string()
    }
}

/// `extensions.code` of the first error
pub fn error_code(resp: &Response) -> Option<String> {
    let err = resp.errors.first()?;
    let code = err.extensions.as_ref()?.get("code")?;
    match code {
        async_graphql::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
