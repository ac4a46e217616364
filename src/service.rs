//! Drive service layer.
//!
//! Orchestrates the gateway and the content normalizer, and collapses every
//! internal failure into one uniform error carrying the file ID.

use crate::config::Config;
use crate::error::{DriveError, Result};
use crate::gateway::{DriveGateway, UpdateResult};
use crate::normalize;
use std::sync::Arc;

/// Service layer for Google Drive operations.
pub struct DriveService {
    gateway: Arc<DriveGateway>,
}

impl DriveService {
    /// Create a service over an existing gateway.
    pub fn new(gateway: Arc<DriveGateway>) -> Self {
        Self { gateway }
    }

    /// Build a service from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let gateway = DriveGateway::from_config(config)?;
        Ok(Self::new(Arc::new(gateway)))
    }

    /// Fetch a file's content.
    ///
    /// With `return_json`, Google Docs exports are normalized into a
    /// sectioned JSON document and Google Sheets exports into a row-oriented
    /// one; everything else (and `return_json = false`) returns the raw text.
    pub async fn get_file_content(&self, file_id: &str, return_json: bool) -> Result<String> {
        self.fetch_and_normalize(file_id, return_json)
            .await
            .map_err(|e| wrap(file_id, e))
    }

    async fn fetch_and_normalize(&self, file_id: &str, return_json: bool) -> Result<String> {
        let content = self.gateway.fetch_content(file_id).await?;

        if !return_json {
            return Ok(content.text);
        }

        match content.mime_type.as_str() {
            "application/vnd.google-apps.document" => {
                tracing::debug!(file = %content.name, "Normalizing Docs export to sectioned JSON");
                let doc = normalize::markdown_to_json(&content.text, &content.name);
                Ok(serde_json::to_string_pretty(&doc)?)
            }
            "application/vnd.google-apps.spreadsheet" => {
                tracing::debug!(file = %content.name, "Normalizing Sheets export to row JSON");
                let sheet = normalize::csv_to_json(&content.text, &content.name);
                Ok(serde_json::to_string_pretty(&sheet)?)
            }
            _ => Ok(content.text),
        }
    }

    /// Replace a file's content with plain text.
    pub async fn update_file_content(
        &self,
        file_id: &str,
        content: &str,
    ) -> Result<UpdateResult> {
        self.gateway
            .update_content(file_id, content)
            .await
            .map_err(|e| wrap(file_id, e))
    }
}

fn wrap(file_id: &str, e: DriveError) -> DriveError {
    DriveError::Drive {
        file_id: file_id.to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::StaticToken;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> DriveService {
        let gateway = DriveGateway::with_base_url(
            Arc::new(StaticToken("test-token".to_string())),
            server.uri(),
        );
        DriveService::new(Arc::new(gateway))
    }

    async fn mock_metadata(server: &MockServer, file_id: &str, mime: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/drive/v3/files/{}", file_id)))
            .and(query_param("fields", "mimeType,name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mimeType": mime,
                "name": name,
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_get_google_doc_normalized() {
        let server = MockServer::start().await;
        mock_metadata(
            &server,
            "doc1",
            "application/vnd.google-apps.document",
            "Plan",
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/doc1/export"))
            .and(query_param("mimeType", "text/markdown"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Title\nBody line"))
            .mount(&server)
            .await;

        let text = service(&server).get_file_content("doc1", true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "google_docs");
        assert_eq!(value["file_name"], "Plan");
        assert_eq!(value["sections"][0]["title"], "Title");
        assert_eq!(value["sections"][0]["content"], "Body line");
        assert_eq!(value["raw_content"], "# Title\nBody line");
    }

    #[tokio::test]
    async fn test_get_google_sheet_normalized() {
        let server = MockServer::start().await;
        mock_metadata(
            &server,
            "sheet1",
            "application/vnd.google-apps.spreadsheet",
            "People",
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/sheet1/export"))
            .and(query_param("mimeType", "text/csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Name,Age\nAlice,30\nBob,25"))
            .mount(&server)
            .await;

        let text = service(&server)
            .get_file_content("sheet1", true)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "google_sheets");
        assert_eq!(value["rows"], 2);
        assert_eq!(value["columns"], serde_json::json!(["Name", "Age"]));
        assert_eq!(value["data"][1]["Name"], "Bob");
    }

    #[tokio::test]
    async fn test_get_raw_when_json_disabled() {
        let server = MockServer::start().await;
        mock_metadata(
            &server,
            "doc1",
            "application/vnd.google-apps.document",
            "Plan",
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/doc1/export"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Title\nBody line"))
            .mount(&server)
            .await;

        let text = service(&server)
            .get_file_content("doc1", false)
            .await
            .unwrap();
        assert_eq!(text, "# Title\nBody line");
    }

    #[tokio::test]
    async fn test_get_plain_file_passthrough() {
        let server = MockServer::start().await;
        mock_metadata(&server, "txt1", "text/plain", "readme.txt").await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/txt1"))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
            .mount(&server)
            .await;

        let text = service(&server).get_file_content("txt1", true).await.unwrap();
        assert_eq!(text, "plain text");
    }

    #[tokio::test]
    async fn test_get_failure_wrapped_with_file_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/bad-id"))
            .respond_with(ResponseTemplate::new(404).set_body_string("File not found"))
            .mount(&server)
            .await;

        let err = service(&server)
            .get_file_content("bad-id", true)
            .await
            .unwrap_err();

        match &err {
            DriveError::Drive { file_id, message } => {
                assert_eq!(file_id, "bad-id");
                assert!(message.contains("File not found"));
            }
            other => panic!("expected Drive error, got {:?}", other),
        }
        assert!(err.to_string().contains("'bad-id'"));
    }

    #[tokio::test]
    async fn test_update_failure_wrapped_with_file_id() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/upload/drive/v3/files/bad-id"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = service(&server)
            .update_file_content("bad-id", "text")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("'bad-id'"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_update_success() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/upload/drive/v3/files/file1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file1",
                "name": "notes.txt",
            })))
            .mount(&server)
            .await;

        let result = service(&server)
            .update_file_content("file1", "hello")
            .await
            .unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(result.file_name, "notes.txt");
    }
}
