//! GraphQL HTTP and WebSocket handlers
//!
//! A valid bearer token puts an [AuthUser](crate::graphql::AuthUser) into the
//! request data; an `Accept-Language` naming a supported locale puts a
//! [Locale] there too. Invalid tokens are ignored here and surface as
//! `UNAUTHORIZED` from resolvers that need identity.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::{ACCEPT, ACCEPT_LANGUAGE};
use axum::response::IntoResponse;
use axum::routing::get;

use crate::app::AppState;
use crate::services::i18n::Locale;

use super::extract_token;

/// Routes for /graphql and /graphql/ws
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/graphql/ws", get(graphql_ws_handler))
}

fn request_locale(headers: &HeaderMap) -> Option<Locale> {
    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok())
        .and_then(Locale::from_accept_language)
}

/// GraphiQL interactive playground (only for browsers)
async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        axum::response::Html(
            GraphiQLSource::build()
                .endpoint("/graphql")
                .subscription_endpoint("/graphql/ws")
                .finish(),
        )
        .into_response()
    } else {
        (
            axum::http::StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}

/// GraphQL query/mutation handler with auth context
async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    if let Some(token) = extract_token(&headers) {
        match state.auth.verify_token(&token) {
            Ok(user) => request = request.data(user),
            Err(e) => tracing::debug!(error = %e, "Token verification failed"),
        }
    }

    if let Some(locale) = request_locale(&headers) {
        request = request.data(locale);
    }

    state.schema.execute(request).await.into()
}

/// GraphQL WebSocket handler for subscriptions with auth
async fn graphql_ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    protocol: GraphQLProtocol,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let auth_user = extract_token(&headers).and_then(|token| state.auth.verify_token(&token).ok());
    let locale = request_locale(&headers);

    ws.protocols(["graphql-transport-ws", "graphql-ws"])
        .on_upgrade(move |socket| {
            let mut ws = GraphQLWebSocket::new(socket, state.schema.clone(), protocol);

            let mut data = async_graphql::Data::default();
            if let Some(user) = auth_user {
                data.insert(user);
            }
            if let Some(locale) = locale {
                data.insert(locale);
            }
            ws = ws.with_data(data);

            // Token may also arrive in the connection_init payload
            let auth = state.auth.clone();
            ws.on_connection_init(move |params| async move {
                let mut data = async_graphql::Data::default();
                if let Some(token) = params
                    .get("Authorization")
                    .or_else(|| params.get("authorization"))
                    .and_then(|v| v.as_str())
                {
                    let token = token.strip_prefix("Bearer ").unwrap_or(token);
                    if let Ok(user) = auth.verify_token(token) {
                        data.insert(user);
                    }
                }
                Ok(data)
            })
            .serve()
        })
}
