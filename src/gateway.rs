//! Google Drive API gateway.
//!
//! Wraps the three Drive v3 operations this server needs: metadata lookup,
//! content export/download, and content replacement via resumable upload.

use crate::auth::{ServiceAccountAuth, TokenProvider};
use crate::config::Config;
use crate::error::{DriveError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// File metadata returned by the Drive API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub mime_type: String,
    pub name: String,
}

/// Decoded file content together with its origin.
#[derive(Debug, Clone)]
pub struct ExportedContent {
    pub text: String,
    /// MIME type of the source file (not the export format).
    pub mime_type: String,
    pub name: String,
}

/// Result of a successful content update. Failures are signaled via error,
/// never encoded here.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResult {
    pub status: String,
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
struct UpdatedFile {
    name: String,
}

/// Map a Google-native MIME type to its export format, or `None` for files
/// that download directly.
fn export_mime_type(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "application/vnd.google-apps.document" => Some("text/markdown"),
        "application/vnd.google-apps.spreadsheet" => Some("text/csv"),
        "application/vnd.google-apps.presentation" => Some("text/plain"),
        "application/vnd.google-apps.script" => {
            Some("application/vnd.google-apps.script+json")
        }
        _ => None,
    }
}

/// Gateway to the Google Drive v3 REST API.
pub struct DriveGateway {
    client: reqwest::Client,
    token_provider: Arc<dyn TokenProvider>,
    base_url: String,
}

impl DriveGateway {
    /// Create a gateway against the real Drive API.
    pub fn new(token_provider: Arc<dyn TokenProvider>) -> Self {
        Self::with_base_url(token_provider, DEFAULT_BASE_URL.to_string())
    }

    /// Create with a custom base URL (for testing).
    pub fn with_base_url(token_provider: Arc<dyn TokenProvider>, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_provider,
            base_url,
        }
    }

    /// Build a gateway from configuration, loading the service-account key
    /// from the resolved credentials path.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.resolve_credentials_path();
        tracing::info!(mode = ?config.mode, path = %path.display(), "Loading Drive credentials");

        let auth = ServiceAccountAuth::from_file(&path)?;
        Ok(Self::new(Arc::new(auth)))
    }

    /// Fetch a file's MIME type and name.
    pub async fn get_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let token = self.token_provider.access_token().await?;

        let response = self
            .client
            .get(format!("{}/drive/v3/files/{}", self.base_url, file_id))
            .query(&[("fields", "mimeType,name")])
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Fetch a file's content as text.
    ///
    /// Google-native files are exported to a plain format first; everything
    /// else downloads directly. Content that is not valid UTF-8 surfaces a
    /// decode error.
    pub async fn fetch_content(&self, file_id: &str) -> Result<ExportedContent> {
        let metadata = self.get_metadata(file_id).await?;
        tracing::info!(file = %metadata.name, mime = %metadata.mime_type, "Reading Drive file");

        let request = if let Some(export_mime) = export_mime_type(&metadata.mime_type) {
            tracing::debug!(export_mime, "Exporting Google-native file");
            self.client
                .get(format!(
                    "{}/drive/v3/files/{}/export",
                    self.base_url, file_id
                ))
                .query(&[("mimeType", export_mime)])
        } else {
            tracing::debug!("Downloading file directly");
            self.client
                .get(format!("{}/drive/v3/files/{}", self.base_url, file_id))
                .query(&[("alt", "media")])
        };

        let token = self.token_provider.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let response = Self::check_status(response).await?;

        let bytes = response.bytes().await?;
        let text =
            String::from_utf8(bytes.to_vec()).map_err(|e| DriveError::Decode(e.to_string()))?;

        Ok(ExportedContent {
            text,
            mime_type: metadata.mime_type,
            name: metadata.name,
        })
    }

    /// Replace a file's content with the given text, preserving its name and
    /// type. Uses the resumable upload protocol: initiate a session, then
    /// send the payload to the session URI.
    pub async fn update_content(&self, file_id: &str, content: &str) -> Result<UpdateResult> {
        let token = self.token_provider.access_token().await?;

        let init = self
            .client
            .patch(format!(
                "{}/upload/drive/v3/files/{}",
                self.base_url, file_id
            ))
            .query(&[("uploadType", "resumable"), ("fields", "id,name")])
            .bearer_auth(&token)
            .header("X-Upload-Content-Type", "text/plain")
            .send()
            .await?;

        let init = Self::check_status(init).await?;
        let status = init.status().as_u16();
        let session_uri = init
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(DriveError::Api {
                status,
                message: "Resumable upload session URI missing".to_string(),
            })?;

        let response = self
            .client
            .put(&session_uri)
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(content.to_string())
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let updated: UpdatedFile = response.json().await?;
        tracing::info!(file = %updated.name, "Updated Drive file");

        Ok(UpdateResult {
            status: "success".to_string(),
            file_name: updated.name,
        })
    }

    /// Turn a non-success response into an API error carrying the body.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(DriveError::Api { status, message })
    }
}
