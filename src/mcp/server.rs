//! MCP server with stdio transport
//!
//! Implements a JSON-RPC 2.0 server that communicates over stdin/stdout.
//! Handles tool discovery and execution; logging goes to stderr so stdout
//! stays reserved for protocol frames.

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::tools::ToolHandler;
use crate::error::{MemoriaError, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

/// Application error codes per error kind, alongside the standard
/// JSON-RPC range. The kind itself travels in the error `data` payload.
fn error_code(err: &MemoriaError) -> i32 {
    match err {
        MemoriaError::Validation(_) => -32001,
        MemoriaError::InvalidArguments(_) => -32002,
        MemoriaError::NotFound(_) => -32003,
        MemoriaError::DuplicateTitle(_) => -32004,
        _ => -32000,
    }
}

/// MCP server that handles JSON-RPC requests over stdio
pub struct McpServer {
    tool_handler: ToolHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self { tool_handler }
    }

    /// Run the server (blocking, processes stdin/stdout)
    pub async fn run(&self) -> Result<()> {
        info!("MCP server started, listening on stdin...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("Received EOF, shutting down");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    debug!("Received request: {}", line);

                    let response = self.process_request(line).await;

                    let response_json = serde_json::to_string(&response).unwrap_or_else(|e| {
                        error!("Failed to serialize response: {}", e);
                        serde_json::to_string(&JsonRpcResponse::error(
                            None,
                            JsonRpcError::internal_error(format!("Serialization error: {}", e)),
                        ))
                        .unwrap()
                    });

                    debug!("Sending response: {}", response_json);

                    if let Err(e) = stdout.write_all(response_json.as_bytes()).await {
                        error!("Failed to write response: {}", e);
                        break;
                    }

                    if let Err(e) = stdout.write_all(b"\n").await {
                        error!("Failed to write newline: {}", e);
                        break;
                    }

                    if let Err(e) = stdout.flush().await {
                        error!("Failed to flush stdout: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Process a single JSON-RPC request
    async fn process_request(&self, line: &str) -> JsonRpcResponse {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                );
            }
        };

        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
            );
        }

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,

            _ => {
                JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method))
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling initialize");

        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {
                    "name": "memoria",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        )
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling tools/list");

        let tools = self.tool_handler.list_tools();

        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "tools": tools
            }),
        )
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling tools/call");

        let params = match request.params.as_object() {
            Some(obj) => obj,
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("params must be an object"),
                );
            }
        };

        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("missing 'name' field"),
                );
            }
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        match self.tool_handler.execute(tool_name, arguments).await {
            Ok(result) => JsonRpcResponse::success(
                request.id,
                serde_json::json!({
                    "content": [
                        {
                            "type": "text",
                            "text": serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string())
                        }
                    ]
                }),
            ),
            Err(e) => JsonRpcResponse::error(
                request.id,
                JsonRpcError::application_error(error_code(&e), e.to_string())
                    .with_data(serde_json::json!({ "kind": e.kind() })),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::libsql::LibsqlStorage;
    use std::sync::Arc;

    async fn server() -> McpServer {
        let store = LibsqlStorage::in_memory().await.unwrap();
        McpServer::new(ToolHandler::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server().await;
        let response = server
            .process_request(r#"{"jsonrpc":"2.0","method":"initialize","id":1}"#)
            .await;

        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "memoria");
        assert_eq!(result["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_tools_list_over_protocol() {
        let server = server().await;
        let response = server
            .process_request(r#"{"jsonrpc":"2.0","method":"tools/list","id":2}"#)
            .await;

        let result = response.result.unwrap();
        assert_eq!(result["tools"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let server = server().await;
        let response = server.process_request("{not json").await;

        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server().await;
        let response = server
            .process_request(r#"{"jsonrpc":"2.0","method":"tools/invoke","id":3}"#)
            .await;

        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_wrong_version_rejected() {
        let server = server().await;
        let response = server
            .process_request(r#"{"jsonrpc":"1.0","method":"tools/list","id":4}"#)
            .await;

        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_duplicate_title_surfaces_kind_and_code() {
        let server = server().await;

        let call = r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"remember","arguments":{"title":"X","content":"a"}},"id":5}"#;
        let response = server.process_request(call).await;
        assert!(response.error.is_none());

        let response = server.process_request(call).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32004);
        assert_eq!(error.data.unwrap()["kind"], "duplicate_title");
    }

    #[tokio::test]
    async fn test_call_without_tool_name() {
        let server = server().await;
        let response = server
            .process_request(r#"{"jsonrpc":"2.0","method":"tools/call","params":{},"id":6}"#)
            .await;

        assert_eq!(response.error.unwrap().code, -32602);
    }
}
