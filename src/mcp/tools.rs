//! MCP tool definitions and Drive URL parsing.

use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;

/// Fixed acknowledgement returned by the `test_server` tool.
pub const TEST_SERVER_RESPONSE: &str = "Drive MCP server connection test successful";

static FILE_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Extract a Drive file ID from a URL, or return the input unchanged.
///
/// Input without a path separator is treated as an already-bare ID. URLs are
/// matched against the `/d/<id>` segment; unmatched input falls back to being
/// returned as-is rather than erroring.
pub fn extract_file_id(url: &str) -> String {
    if !url.contains('/') {
        return url.to_string();
    }

    let pattern = FILE_ID_PATTERN
        .get_or_init(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("valid file ID pattern"));

    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| url.to_string())
}

/// Get all available MCP tools.
pub fn get_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_drive_file".to_string(),
            description: "Get the text content of a Google Drive file from its URL or file ID. Google Docs and Sheets are returned as structured JSON by default.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Complete Google Drive URL (e.g. https://docs.google.com/document/d/FILE_ID/edit) or a bare file ID"
                    },
                    "return_json": {
                        "type": "boolean",
                        "description": "Normalize Docs/Sheets exports into structured JSON; false returns the raw export text",
                        "default": true
                    }
                },
                "required": ["url"]
            }),
        },
        ToolDefinition {
            name: "update_drive_file".to_string(),
            description: "Overwrite the content of a Google Drive file with plain text.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_id": {
                        "type": "string",
                        "description": "The ID of the file to update"
                    },
                    "content": {
                        "type": "string",
                        "description": "The new content for the file"
                    }
                },
                "required": ["file_id", "content"]
            }),
        },
        ToolDefinition {
            name: "test_server".to_string(),
            description: "Simple connection test to verify the server is responding.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ]
}
