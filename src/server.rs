//! MCP server implementation.
//!
//! Handles JSON-RPC 2.0 over stdio according to the MCP protocol specification.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{rpc_codes, McpError, Result};
use crate::session::McpSession;
use crate::tools::ToolRegistry;

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server information.
const SERVER_NAME: &str = "premium-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<JsonValue>,
    pub method: String,
    #[serde(default)]
    pub params: Option<JsonValue>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<JsonValue>, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<JsonValue>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// MCP tool result carrying a single text block.
fn text_result(text: String, is_error: bool) -> JsonValue {
    serde_json::json!({
        "content": [{
            "type": "text",
            "text": text
        }],
        "isError": is_error
    })
}

/// MCP server.
pub struct McpServer {
    session: McpSession,
    registry: ToolRegistry,
}

impl McpServer {
    /// Create a new MCP server with the given session.
    pub fn new(session: McpSession) -> Self {
        Self {
            session,
            registry: ToolRegistry::new(),
        }
    }

    /// Run the server, reading from stdin and writing to stdout.
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited requests from `reader` until EOF.
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                // EOF - client disconnected
                tracing::debug!("stdin closed, shutting down");
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => Some(JsonRpcResponse::error(
                    None,
                    rpc_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                )),
            };

            // Notifications get no answer
            let Some(response) = response else {
                continue;
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request. Returns `None` for notifications.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Validate JSON-RPC version
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                rpc_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version".to_string(),
            ));
        }

        if request.id.is_none() {
            tracing::debug!(method = %request.method, "notification");
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            ),
        };
        Some(response)
    }

    /// Handle the initialize request.
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    /// Handle the tools/list request.
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<JsonValue> = self
            .registry
            .tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools }))
    }

    /// Handle the tools/call request.
    async fn handle_tools_call(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        // Extract name and arguments from params
        let params = match &request.params {
            Some(JsonValue::Object(obj)) => obj,
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing params object".to_string(),
                )
            }
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing 'name' in params".to_string(),
                )
            }
        };

        let arguments = match params.get("arguments") {
            Some(JsonValue::Object(obj)) => obj.clone(),
            Some(JsonValue::Null) | None => Map::new(),
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "'arguments' must be an object".to_string(),
                )
            }
        };

        // A failing or panicking tool must not take the server down
        let outcome = AssertUnwindSafe(self.registry.dispatch(&self.session, &name, arguments))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(McpError::Internal(format!("tool '{}' panicked", name))));

        match outcome {
            Ok(text) => JsonRpcResponse::success(request.id, text_result(text, false)),
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "tool call failed");
                JsonRpcResponse::success(request.id, text_result(format!("Error: {}", err), true))
            }
        }
    }
}
