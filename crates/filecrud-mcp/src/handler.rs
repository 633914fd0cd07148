use std::sync::Arc;

use filecrud_core::Dispatcher;
use filecrud_core::tools::all_tools_to_mcp_format;
use serde_json::{Value, json};

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, MCP_PROTOCOL_VERSION, METHOD_NOT_FOUND,
    PARSE_ERROR, RpcRequest, RpcResponse, SERVER_NAME,
};

/// Answers MCP JSON-RPC methods, delegating `tools/call` to the dispatcher.
pub struct McpHandler {
    dispatcher: Arc<Dispatcher>,
}

impl McpHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Handle one raw frame. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("json decode error: {e}");
                return Some(RpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };
        let id = value.get("id").cloned();
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::warn!("malformed request: {e}");
                Some(RpcResponse::error(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ))
            }
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        let Some(id) = request.id else {
            log::debug!("notification: {}", request.method);
            return None;
        };
        Some(self.respond(id, &request.method, &request.params).await)
    }

    /// Answer one method call. Always produces a response.
    pub async fn respond(&self, id: Value, method: &str, params: &Value) -> RpcResponse {
        log::info!("request: {} (id: {})", method, id);

        match method {
            "initialize" => RpcResponse::ok(
                id,
                json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": { "listChanged": true }
                    },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            ),
            "ping" => RpcResponse::ok(id, json!({})),
            "tools/list" => RpcResponse::ok(id, json!({ "tools": all_tools_to_mcp_format() })),
            "tools/call" => self.call_tool(id, params).await,
            other => RpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        }
    }

    async fn call_tool(&self, id: Value, params: &Value) -> RpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::error(id, INVALID_PARAMS, "Tool name is required");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let outcome = self.dispatcher.dispatch(name, &arguments).await;
        let text = match serde_json::to_string(&outcome) {
            Ok(t) => t,
            Err(e) => return RpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        };
        RpcResponse::ok(
            id,
            json!({
                "content": [{ "type": "text", "text": text }],
                "isError": !outcome.is_ok(),
            }),
        )
    }
}
