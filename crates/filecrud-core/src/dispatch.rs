//! Operation dispatcher: validate, route to one action, shape the response.

use serde::Serialize;
use serde_json::Value;

use crate::actions;
use crate::context::ServerContext;
use crate::error::{ErrorKind, FsError, Result};
use crate::request::Request;

/// Machine-readable kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one request. Exactly one of `result` / `error` is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success { ok: bool, result: Value },
    Failure { ok: bool, error: ErrorBody },
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self::Success { ok: true, result }
    }

    pub fn failure(err: &FsError) -> Self {
        Self::Failure {
            ok: false,
            error: ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Routes requests to actions against a fixed [`ServerContext`].
///
/// Holds no per-request state; share it behind an `Arc` across transports.
pub struct Dispatcher {
    ctx: ServerContext,
}

impl Dispatcher {
    pub fn new(ctx: ServerContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ServerContext {
        &self.ctx
    }

    /// Handle a named operation with loose JSON arguments. Never fails: every
    /// error is folded into [`Response::Failure`].
    pub async fn dispatch(&self, operation: &str, arguments: &Value) -> Response {
        let outcome = match Request::from_call(operation, arguments) {
            Ok(request) => self.execute(request).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(result) => Response::success(result),
            Err(e) => {
                log::warn!("{} failed: {} ({})", operation, e, e.kind());
                Response::failure(&e)
            }
        }
    }

    /// Run one validated request and serialise its payload.
    pub async fn execute(&self, request: Request) -> Result<Value> {
        let op = request.operation();
        log::debug!("{} {}", op, request.path());
        // Unlinking never touches a symlink's target.
        let path = match &request {
            Request::DeleteFile { path } => self.ctx.resolve_entry(path).await?,
            other => self.ctx.resolve(other.path()).await?,
        };

        match &request {
            Request::ReadFile { .. } => to_value(actions::read_file(&path).await?),
            Request::WriteFile { content, .. } => {
                to_value(actions::write_file(&path, content).await?)
            }
            Request::AppendFile { content, .. } => {
                to_value(actions::append_file(&path, content).await?)
            }
            Request::UpdateFile {
                find_pattern,
                replace_text,
                use_regex,
                ..
            } => to_value(
                actions::update_file(&path, find_pattern, replace_text, *use_regex).await?,
            ),
            Request::DeleteFile { .. } => to_value(actions::delete_file(&path).await?),
            Request::ListFiles { .. } => to_value(actions::list_files(&path).await?),
            Request::CreateDirectory { .. } => {
                to_value(actions::create_directory(&path).await?)
            }
        }
    }
}

fn to_value<T: Serialize>(payload: T) -> Result<Value> {
    serde_json::to_value(payload)
        .map_err(|e| FsError::Io(format!("Failed to encode result: {}", e)))
}
