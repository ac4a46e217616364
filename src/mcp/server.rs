//! MCP JSON-RPC 2.0 server over stdio.

use crate::error::DriveError;
use crate::service::DriveService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// MCP Server for AI assistant integration.
///
/// Holds the Drive service as an `Option` so the process can start (and
/// answer `test_server`) without valid credentials; every Drive-backed tool
/// call then fails with a "not initialized" error.
#[derive(Clone)]
pub struct McpServer {
    service: Option<Arc<DriveService>>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<serde_json::Value>,
    method: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl McpServer {
    /// Create a new MCP server. `service` is `None` when credential loading
    /// failed at startup.
    pub fn new(service: Option<Arc<DriveService>>) -> Self {
        Self { service }
    }

    /// Run the MCP server over stdio.
    pub async fn run(&self) -> crate::error::Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        // Responses flow through one writer task; it drains once every
        // in-flight request has dropped its sender.
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = rx.recv().await {
                if stdout.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdout.write_all(b"\n").await.is_err() {
                    break;
                }
                let _ = stdout.flush().await;
            }
        });

        eprintln!("rusty-drive MCP server started");

        let result = self.serve(BufReader::new(tokio::io::stdin()), tx).await;
        let _ = writer.await;
        result
    }

    /// Read requests line by line and dispatch each one on its own task, so
    /// a slow Drive call never stalls the next tool invocation. JSON-RPC ids
    /// allow responses to arrive out of order.
    async fn serve<R>(
        &self,
        reader: R,
        tx: mpsc::UnboundedSender<String>,
    ) -> crate::error::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    let error_response = JsonRpcResponse {
                        jsonrpc: "2.0".to_string(),
                        id: None,
                        result: None,
                        error: Some(JsonRpcError {
                            code: -32700,
                            message: format!("Parse error: {}", e),
                            data: None,
                        }),
                    };
                    if tx.send(serde_json::to_string(&error_response)?).is_err() {
                        break;
                    }
                    continue;
                }
            };

            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let response = server.handle_request(request).await;
                match serde_json::to_string(&response) {
                    Ok(json) => {
                        let _ = tx.send(json);
                    }
                    Err(e) => eprintln!("Error serializing response: {}", e),
                }
            });
        }

        Ok(())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize().await,
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(request.params).await,
            _ => Err(JsonRpcError {
                code: -32601,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        match result {
            Ok(value) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: Some(value),
                error: None,
            },
            Err(error) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: None,
                error: Some(error),
            },
        }
    }

    async fn handle_initialize(&self) -> std::result::Result<serde_json::Value, JsonRpcError> {
        Ok(serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "rusty-drive",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    async fn handle_tools_list(&self) -> std::result::Result<serde_json::Value, JsonRpcError> {
        let tools = super::tools::get_tools();
        Ok(serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        params: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError {
                code: -32602,
                message: "Missing tool name".to_string(),
                data: None,
            })?;

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        match name {
            "get_drive_file" => self.tool_get_drive_file(arguments).await,
            "update_drive_file" => self.tool_update_drive_file(arguments).await,
            "test_server" => self.tool_test_server().await,
            _ => Err(JsonRpcError {
                code: -32602,
                message: format!("Unknown tool: {}", name),
                data: None,
            }),
        }
    }

    /// Single place where the soft-fail initialization becomes a loud error.
    fn service(&self) -> std::result::Result<&Arc<DriveService>, JsonRpcError> {
        self.service.as_ref().ok_or_else(|| JsonRpcError {
            code: -32000,
            message: DriveError::NotInitialized.to_string(),
            data: None,
        })
    }

    async fn tool_get_drive_file(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, JsonRpcError> {
        let url = arguments
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError {
                code: -32602,
                message: "Missing 'url' argument".to_string(),
                data: None,
            })?;

        let return_json = arguments
            .get("return_json")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let service = self.service()?;
        let file_id = super::tools::extract_file_id(url);
        tracing::info!(url, file_id = %file_id, "Tool request 'get_drive_file'");

        let text = service
            .get_file_content(&file_id, return_json)
            .await
            .map_err(|e| JsonRpcError {
                code: -32000,
                message: e.to_string(),
                data: None,
            })?;

        Ok(serde_json::json!({
            "content": [{
                "type": "text",
                "text": text
            }]
        }))
    }

    async fn tool_update_drive_file(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, JsonRpcError> {
        let file_id = arguments
            .get("file_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError {
                code: -32602,
                message: "Missing 'file_id' argument".to_string(),
                data: None,
            })?;

        let content = arguments
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError {
                code: -32602,
                message: "Missing 'content' argument".to_string(),
                data: None,
            })?;

        let service = self.service()?;
        tracing::info!(file_id, "Tool request 'update_drive_file'");

        let result = service
            .update_file_content(file_id, content)
            .await
            .map_err(|e| JsonRpcError {
                code: -32000,
                message: e.to_string(),
                data: None,
            })?;

        Ok(serde_json::json!({
            "content": [{
                "type": "text",
                "text": serde_json::to_string_pretty(&result).map_err(|e| JsonRpcError {
                    code: -32603,
                    message: e.to_string(),
                    data: None,
                })?
            }]
        }))
    }

    async fn tool_test_server(&self) -> std::result::Result<serde_json::Value, JsonRpcError> {
        tracing::info!("Tool request 'test_server'");
        Ok(serde_json::json!({
            "content": [{
                "type": "text",
                "text": super::tools::TEST_SERVER_RESPONSE
            }]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::StaticToken;
    use crate::gateway::DriveGateway;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uninitialized_server() -> McpServer {
        McpServer::new(None)
    }

    #[tokio::test]
    async fn test_slow_call_does_not_stall_later_calls() {
        let mock = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/slow1"))
            .and(query_param("fields", "mimeType,name"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(400))
                    .set_body_json(serde_json::json!({
                        "mimeType": "text/plain",
                        "name": "slow.txt",
                    })),
            )
            .mount(&mock)
            .await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/slow1"))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_string("slow content"))
            .mount(&mock)
            .await;

        let gateway = DriveGateway::with_base_url(
            Arc::new(StaticToken("test-token".to_string())),
            mock.uri(),
        );
        let service = crate::service::DriveService::new(Arc::new(gateway));
        let server = McpServer::new(Some(Arc::new(service)));

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_drive_file","arguments":{"url":"slow1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"test_server"}}"#,
            "\n",
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        server.serve(input.as_bytes(), tx).await.unwrap();

        // The fast call answers first even though it was submitted second.
        let first: serde_json::Value =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        let second: serde_json::Value =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();

        assert_eq!(first["id"], 2);
        assert_eq!(
            first["result"]["content"][0]["text"],
            super::super::tools::TEST_SERVER_RESPONSE
        );
        assert_eq!(second["id"], 1);
        assert_eq!(second["result"]["content"][0]["text"], "slow content");
    }

    #[tokio::test]
    async fn test_serve_reports_parse_errors() {
        let server = uninitialized_server();

        let (tx, mut rx) = mpsc::unbounded_channel();
        server.serve("not json\n".as_bytes(), tx).await.unwrap();

        let response: serde_json::Value =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(response["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_get_drive_file_uninitialized_fails_cleanly() {
        let server = uninitialized_server();

        let err = server
            .tool_get_drive_file(serde_json::json!({"url": "abc123"}))
            .await
            .unwrap_err();

        assert_eq!(err.code, -32000);
        assert!(err.message.contains("not initialized"));
    }

    #[tokio::test]
    async fn test_update_drive_file_uninitialized_fails_cleanly() {
        let server = uninitialized_server();

        let err = server
            .tool_update_drive_file(serde_json::json!({"file_id": "abc", "content": "x"}))
            .await
            .unwrap_err();

        assert_eq!(err.code, -32000);
        assert!(err.message.contains("not initialized"));
    }

    #[tokio::test]
    async fn test_test_server_works_without_service() {
        let server = uninitialized_server();

        let value = server.tool_test_server().await.unwrap();
        assert_eq!(
            value["content"][0]["text"],
            super::super::tools::TEST_SERVER_RESPONSE
        );
    }

    #[tokio::test]
    async fn test_missing_url_argument() {
        let server = uninitialized_server();

        let err = server
            .tool_get_drive_file(serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = uninitialized_server();

        let err = server
            .handle_tools_call(serde_json::json!({"name": "no_such_tool", "arguments": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = uninitialized_server();

        let request = JsonRpcRequest {
            _jsonrpc: "2.0".to_string(),
            id: Some(serde_json::json!(1)),
            method: "bogus/method".to_string(),
            params: serde_json::Value::Null,
        };

        let response = server.handle_request(request).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tools_list_contains_all_tools() {
        let server = uninitialized_server();

        let value = server.handle_tools_list().await.unwrap();
        let tools = value["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 3);
    }
}
