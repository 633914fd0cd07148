//! HTTP transport for development and testing (`--web`).
//!
//! Each MCP method has its own POST route taking a JSON-RPC body; the route,
//! not the body's `method` field, selects what runs.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::handler::McpHandler;
use crate::protocol::RpcResponse;

/// JSON-RPC body as posted to a route. `method` is ignored if present.
#[derive(Debug, Deserialize)]
struct WebRequest {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    params: Value,
}

pub fn router(handler: Arc<McpHandler>) -> Router {
    Router::new()
        .route("/mcp/initialize", post(initialize_handler))
        .route("/mcp/tools/list", post(tools_list_handler))
        .route("/mcp/tools/call", post(tools_call_handler))
        .with_state(handler)
}

async fn respond(handler: &McpHandler, method: &str, req: WebRequest) -> Json<RpcResponse> {
    // every HTTP call gets an answer, so a missing id becomes 0
    let id = req.id.filter(|v| !v.is_null()).unwrap_or(Value::from(0));
    Json(handler.respond(id, method, &req.params).await)
}

async fn initialize_handler(
    State(handler): State<Arc<McpHandler>>,
    Json(req): Json<WebRequest>,
) -> Json<RpcResponse> {
    respond(&handler, "initialize", req).await
}

async fn tools_list_handler(
    State(handler): State<Arc<McpHandler>>,
    Json(req): Json<WebRequest>,
) -> Json<RpcResponse> {
    respond(&handler, "tools/list", req).await
}

async fn tools_call_handler(
    State(handler): State<Arc<McpHandler>>,
    Json(req): Json<WebRequest>,
) -> Json<RpcResponse> {
    respond(&handler, "tools/call", req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use filecrud_core::{Dispatcher, PathPolicy, ServerContext};
    use serde_json::json;
    use std::net::SocketAddr;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn spawn_web_server() -> (TempDir, SocketAddr) {
        let dir = TempDir::new().unwrap();
        let ctx = ServerContext::new(dir.path(), PathPolicy::Confined).unwrap();
        let handler = Arc::new(McpHandler::new(Arc::new(Dispatcher::new(ctx))));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(handler)).await.unwrap();
        });
        (dir, addr)
    }

    /// POST `body` to `path` over a plain HTTP/1.1 connection; returns the
    /// status code and the raw response body.
    async fn post_raw(addr: SocketAddr, path: &str, body: &str) -> (u16, String) {
        let mut client = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        client.write_all(request.as_bytes()).await.unwrap();

        let mut raw = String::new();
        client.read_to_string(&mut raw).await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap();
        (status, body.to_string())
    }

    async fn post_json(addr: SocketAddr, path: &str, body: Value) -> Value {
        let (status, body) = post_raw(addr, path, &body.to_string()).await;
        assert_eq!(status, 200, "body: {}", body);
        serde_json::from_str(&body).unwrap()
    }

    #[tokio::test]
    async fn web_initialize() {
        let (_dir, addr) = spawn_web_server().await;
        let v = post_json(
            addr,
            "/mcp/initialize",
            json!({"jsonrpc": "2.0", "id": "test-1", "method": "initialize", "params": {}}),
        )
        .await;
        assert_eq!(v["id"], "test-1");
        assert_eq!(v["result"]["serverInfo"]["name"], "local-file-crud-mcp");
    }

    #[tokio::test]
    async fn web_tools_list_defaults_id() {
        let (_dir, addr) = spawn_web_server().await;
        let v = post_json(addr, "/mcp/tools/list", json!({"jsonrpc": "2.0"})).await;
        assert_eq!(v["id"], 0);
        assert_eq!(v["result"]["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn web_tools_call_round_trip() {
        let (dir, addr) = spawn_web_server().await;
        // legacy argument names as older web clients send them
        let v = post_json(
            addr,
            "/mcp/tools/call",
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {
                "name": "write_file",
                "arguments": {"filepath": "web.txt", "content": "via http"}
            }}),
        )
        .await;
        assert_eq!(v["result"]["isError"], false);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("web.txt")).unwrap(),
            "via http"
        );

        let v = post_json(
            addr,
            "/mcp/tools/call",
            json!({"id": 2, "params": {"name": "read_file", "arguments": {"path": "nope.txt"}}}),
        )
        .await;
        assert_eq!(v["result"]["isError"], true);
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["error"]["kind"], "NotFound");
    }

    #[tokio::test]
    async fn web_route_decides_method() {
        let (_dir, addr) = spawn_web_server().await;
        let v = post_json(
            addr,
            "/mcp/tools/list",
            json!({"id": 3, "method": "initialize"}),
        )
        .await;
        assert!(v["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn web_tools_call_without_name() {
        let (_dir, addr) = spawn_web_server().await;
        let v = post_json(addr, "/mcp/tools/call", json!({"id": 4, "params": {}})).await;
        assert_eq!(v["error"]["code"], crate::protocol::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn web_rejects_malformed_body_and_unknown_route() {
        let (_dir, addr) = spawn_web_server().await;
        let (status, _) = post_raw(addr, "/mcp/tools/call", "{not json").await;
        assert_eq!(status, 400);
        let (status, _) = post_raw(addr, "/mcp/resources/list", "{}").await;
        assert_eq!(status, 404);
    }
}
