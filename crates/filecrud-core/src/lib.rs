//! filecrud-core: local file CRUD operations behind a uniform calling convention
//!
//! A caller names one of seven operations and passes a JSON argument map; the
//! [`Dispatcher`] validates the arguments into a typed [`Request`], resolves
//! the target path against the [`ServerContext`], runs the matching action and
//! returns a [`Response`] that is either `{ok: true, result}` or
//! `{ok: false, error: {kind, message}}`.
//!
//! ```no_run
//! use filecrud_core::{Dispatcher, PathPolicy, ServerContext};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let ctx = ServerContext::new(".", PathPolicy::Confined)?;
//!     let dispatcher = Dispatcher::new(ctx);
//!     let args = serde_json::json!({"path": "notes.txt", "content": "hi"});
//!     let response = dispatcher.dispatch("write_file", &args).await;
//!     println!("{}", serde_json::to_string(&response)?);
//!     Ok(())
//! }
//! ```
//!
//! Transports live in the `filecrud-mcp` binary; nothing here knows which one
//! invoked it.

pub mod actions;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod tools;

pub use config::ServerConfig;
pub use context::{PathPolicy, ServerContext};
pub use dispatch::{Dispatcher, ErrorBody, Response};
pub use error::{ErrorKind, FsError};
pub use request::{Operation, Request};
