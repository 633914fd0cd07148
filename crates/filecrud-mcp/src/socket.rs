//! TCP request/response transport for interactive testing.
//!
//! Each connection carries one JSON request; the client half-closes, the
//! server writes one JSON response and closes.

use std::sync::Arc;
use std::time::Duration;

use filecrud_core::tools::all_tools_to_mcp_format;
use filecrud_core::{Dispatcher, FsError, Response};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::protocol::{SocketOp, SocketRequest};

/// Largest request body accepted on one connection.
const MAX_REQUEST_BYTES: usize = 4 * 1024 * 1024;

/// How long a client may take to send its request and half-close.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Outgoing response on the socket transport
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SocketResponse {
    Tools { ok: bool, tools: Vec<Value> },
    Op(Response),
}

async fn handle_request(buf: &[u8], dispatcher: &Dispatcher) -> SocketResponse {
    match serde_json::from_slice::<SocketRequest>(buf) {
        Ok(SocketRequest::Op {
            op: SocketOp::ListTools,
        }) => SocketResponse::Tools {
            ok: true,
            tools: all_tools_to_mcp_format(),
        },
        Ok(SocketRequest::Call {
            operation,
            arguments,
        }) => SocketResponse::Op(dispatcher.dispatch(&operation, &arguments).await),
        Err(e) => {
            let err = FsError::InvalidArgument(format!("Invalid request: {e}"));
            log::warn!("{err}");
            SocketResponse::Op(Response::failure(&err))
        }
    }
}

/// Handle a single TCP connection: read one JSON request, dispatch, write one
/// JSON response.
async fn handle_connection(
    stream: &mut TcpStream,
    dispatcher: &Dispatcher,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = Vec::with_capacity(4096);
    let mut limited = (&mut *stream).take(MAX_REQUEST_BYTES as u64 + 1);
    tokio::time::timeout(READ_TIMEOUT, limited.read_to_end(&mut buf))
        .await
        .map_err(|_| format!("no complete request within {}s", READ_TIMEOUT.as_secs()))??;

    let response = if buf.len() > MAX_REQUEST_BYTES {
        let err = FsError::InvalidArgument(format!(
            "Request exceeds {} bytes",
            MAX_REQUEST_BYTES
        ));
        log::warn!("{err}");
        SocketResponse::Op(Response::failure(&err))
    } else {
        handle_request(&buf, dispatcher).await
    };

    let response_json = serde_json::to_string(&response)?;
    stream.write_all(response_json.as_bytes()).await?;
    stream.shutdown().await?;

    Ok(())
}

/// Accept connections forever, serving each on its own task.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) {
    loop {
        let (mut stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                log::warn!("accept error: {e}");
                continue;
            }
        };
        log::info!("connection from {peer}");

        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(&mut stream, &dispatcher).await {
                log::warn!("error handling connection from {peer}: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filecrud_core::{PathPolicy, ServerContext};
    use std::net::SocketAddr;
    use tempfile::TempDir;

    /// Helper: serve a dispatcher rooted in a fresh tempdir.
    async fn spawn_test_server() -> (TempDir, SocketAddr) {
        let dir = TempDir::new().unwrap();
        let ctx = ServerContext::new(dir.path(), PathPolicy::Confined).unwrap();
        let dispatcher = Arc::new(Dispatcher::new(ctx));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, dispatcher));
        (dir, addr)
    }

    /// Send a JSON request string and return the parsed response.
    async fn send_request(addr: SocketAddr, request: &str) -> Value {
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(request.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[tokio::test]
    async fn socket_write_then_read() {
        let (_dir, addr) = spawn_test_server().await;

        let v = send_request(
            addr,
            r#"{"operation":"write_file","arguments":{"path":"s.txt","content":"over tcp"}}"#,
        )
        .await;
        assert_eq!(v["ok"], true);
        assert!(v.get("error").is_none());

        let v = send_request(
            addr,
            r#"{"operation":"read_file","arguments":{"path":"s.txt"}}"#,
        )
        .await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["result"]["content"], "over tcp");
    }

    #[tokio::test]
    async fn socket_reports_error_kind() {
        let (_dir, addr) = spawn_test_server().await;
        let v = send_request(
            addr,
            r#"{"operation":"delete_file","arguments":{"path":"ghost"}}"#,
        )
        .await;
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"]["kind"], "NotFound");
        assert!(v.get("result").is_none());
    }

    #[tokio::test]
    async fn socket_lists_tools() {
        let (_dir, addr) = spawn_test_server().await;
        let v = send_request(addr, r#"{"op":"list_tools"}"#).await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn socket_oversized_request_is_rejected() {
        let (_dir, addr) = spawn_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        // never half-closes: the cap alone must end the read
        client
            .write_all(&vec![b' '; MAX_REQUEST_BYTES + 1])
            .await
            .unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        let v: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"]["kind"], "InvalidArgument");
        assert!(v["error"]["message"].as_str().unwrap().contains("exceeds"));
    }

    #[tokio::test]
    async fn socket_malformed_request_is_invalid_argument() {
        let (_dir, addr) = spawn_test_server().await;
        let v = send_request(addr, "{\"nonsense\": true").await;
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"]["kind"], "InvalidArgument");

        // server keeps serving
        let v = send_request(addr, r#"{"operation":"list_files","arguments":{"path":"."}}"#).await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["result"]["count"], 0);
    }
}
