//! Client helper for `POST /upload_single`

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use thiserror::Error;
use url::Url;

use super::token_store::TokenStore;

/// MIME type sent when none can be guessed from the path
pub const FALLBACK_MIME: &str = "image/png";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read session token: {0}")]
    TokenStore(#[source] io::Error),

    #[error("No session token stored; sign in first")]
    MissingToken,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Upload request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upload rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },
}

/// Uploads local files to the chat server
#[derive(Clone)]
pub struct UploadClient {
    root_url: Url,
    http: Client,
    tokens: Arc<dyn TokenStore>,
}

impl UploadClient {
    pub fn new(root_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, UploadError> {
        Self::with_timeout(root_url, tokens, Duration::from_secs(60))
    }

    pub fn with_timeout(
        root_url: &str,
        tokens: Arc<dyn TokenStore>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            root_url: Url::parse(root_url)?,
            http,
            tokens,
        })
    }

    fn endpoint(&self) -> Result<Url, UploadError> {
        let mut url = self.root_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push("upload_single");
        Ok(url)
    }

    /// Upload the file at `source` (a path or `file://` URI) into `dir`.
    ///
    /// The part's file name is the source's base name followed by
    /// `file_name_suffix`. Returns the server response for any non-error status.
    pub async fn upload_image(
        &self,
        source: &str,
        dir: &str,
        file_name_suffix: Option<&str>,
    ) -> Result<Response, UploadError> {
        let path = local_path(source);
        let bytes = tokio::fs::read(&path).await.map_err(|e| UploadError::Io {
            path: path.clone(),
            source: e,
        })?;

        let token = self
            .tokens
            .load()
            .await
            .map_err(UploadError::TokenStore)?
            .ok_or(UploadError::MissingToken)?;

        let part = Part::bytes(bytes)
            .file_name(upload_file_name(source, file_name_suffix))
            .mime_str(&guess_mime(&path))?;
        let form = Form::new()
            .part("inputFile", part)
            .text("dir", dir.to_string());

        let url = self.endpoint()?;
        tracing::debug!(url = %url, dir = %dir, "Uploading file");

        let resp = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp)
    }
}

/// Resolve a `file://` URI to a path; anything else is taken as a path
fn local_path(source: &str) -> PathBuf {
    Url::parse(source)
        .ok()
        .filter(|u| u.scheme() == "file")
        .and_then(|u| u.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(source))
}

/// Base name of the source plus the optional suffix
pub fn upload_file_name(source: &str, suffix: Option<&str>) -> String {
    let base = source.rsplit('/').next().unwrap_or(source);
    format!("{}{}", base, suffix.unwrap_or_default())
}

pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}
