//! Line-delimited JSON-RPC over a byte stream (stdin/stdout in production).

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::handler::McpHandler;

/// Serve frames from `reader` until EOF, writing one response line per
/// request to `writer`. Bad frames are answered, never fatal.
pub async fn serve<R, W>(handler: &McpHandler, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(4096);
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(response) = handler.handle_line(line).await else {
            continue;
        };
        let json = serde_json::to_string(&response).map_err(io::Error::other)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    log::info!("input closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filecrud_core::{Dispatcher, PathPolicy, ServerContext};
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn run(input: &str) -> (TempDir, Vec<Value>) {
        let dir = TempDir::new().unwrap();
        let ctx = ServerContext::new(dir.path(), PathPolicy::Confined).unwrap();
        let handler = McpHandler::new(Arc::new(Dispatcher::new(ctx)));
        let mut out = Vec::new();
        serve(&handler, input.as_bytes(), &mut out).await.unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (dir, lines)
    }

    #[tokio::test]
    async fn one_response_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let (_dir, responses) = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
    }

    #[tokio::test]
    async fn bad_frames_do_not_stop_the_loop() {
        let input = concat!(
            "this is not json\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"create_directory","arguments":{"path":"d"}}}"#,
            "\n",
        );
        let (dir, responses) = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["result"]["isError"], false);
        assert!(dir.path().join("d").is_dir());
    }

    #[tokio::test]
    async fn final_line_without_newline_is_served() {
        let (_dir, responses) = run(r#"{"jsonrpc":"2.0","id":"x","method":"ping"}"#).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn invalid_utf8_frame_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let ctx = ServerContext::new(dir.path(), PathPolicy::Confined).unwrap();
        let handler = McpHandler::new(Arc::new(Dispatcher::new(ctx)));
        let input: &[u8] = b"\xff\xfe\n";
        let mut out = Vec::new();
        serve(&handler, input, &mut out).await.unwrap();
        let v: Value = serde_json::from_slice(out.trim_ascii_end()).unwrap();
        assert_eq!(v["error"]["code"], -32700);
    }
}
