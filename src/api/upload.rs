//! Multipart upload endpoint
//!
//! `POST /upload_single` with a bearer token, a file part `inputFile` and a
//! text part `dir`. The file is written to `<UPLOAD_DIR>/<dir>/<uuid>-<name>`
//! and served back from `/uploads`.

use std::path::Path;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::app::AppState;

/// Largest accepted request body
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Directory used when the client sends no usable `dir`
const DEFAULT_DIR: &str = "misc";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug)]
pub struct UploadApiError {
    status: StatusCode,
    message: String,
}

impl UploadApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for UploadApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload_single", post(upload_single))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Reduce a client supplied directory to one safe path segment
pub fn sanitize_dir(dir: &str) -> String {
    let cleaned = sanitize_filename::sanitize(dir.trim());
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        DEFAULT_DIR.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored name for an uploaded file: a fresh uuid plus the sanitized original name
pub fn stored_file_name(original: Option<&str>) -> String {
    let name = original
        .map(|n| sanitize_filename::sanitize(n.trim()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "file".to_string());
    format!("{}-{}", Uuid::new_v4(), name)
}

/// Public URL of a stored file
pub fn public_file_url(public_url: &str, dir: &str, file_name: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(public_url)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("PUBLIC_URL cannot be a base URL"))?
        .pop_if_empty()
        .extend(["uploads", dir, file_name]);
    Ok(url.to_string())
}

async fn upload_single(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(UploadApiError::new(StatusCode::UNAUTHORIZED, "Missing bearer token"));
    };
    let user = state
        .auth
        .verify_token(bearer.token())
        .map_err(|e| UploadApiError::new(StatusCode::UNAUTHORIZED, e.to_string()))?;

    let mut dir: Option<String> = None;
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| UploadApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
        let Some(field) = field else {
            break;
        };

        match field.name() {
            Some("inputFile") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    UploadApiError::new(StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
                })?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("dir") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| UploadApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
                dir = Some(text);
            }
            _ => {}
        }
    }

    let Some((original_name, bytes)) = file else {
        return Err(UploadApiError::new(
            StatusCode::BAD_REQUEST,
            "No file provided. Use field name 'inputFile'.",
        ));
    };

    let dir = sanitize_dir(dir.as_deref().unwrap_or_default());
    let file_name = stored_file_name(original_name.as_deref());

    let target_dir = state.config.upload_dir.join(&dir);
    write_file(&target_dir, &file_name, &bytes).await.map_err(|e| {
        tracing::error!(error = %e, dir = %dir, "Failed to store upload");
        UploadApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file")
    })?;

    let url = public_file_url(&state.config.public_url, &dir, &file_name)
        .map_err(|e| UploadApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!(
        user_id = %user.user_id,
        dir = %dir,
        file = %file_name,
        size = bytes.len(),
        "File uploaded"
    );

    Ok(Json(UploadResponse { url }))
}

async fn write_file(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(file_name), bytes).await
}
