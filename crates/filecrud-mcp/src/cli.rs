use std::path::PathBuf;

use clap::Parser;
use filecrud_core::{PathPolicy, ServerConfig};

/// Local file CRUD server speaking MCP over stdio, HTTP, or plain JSON over TCP.
#[derive(Parser, Debug)]
#[command(name = "filecrud-mcp", version, about)]
pub struct Cli {
    /// Serve the TCP request/response socket instead of stdio
    #[arg(long, conflicts_with = "web")]
    pub socket: bool,

    /// Serve MCP over HTTP (POST /mcp/initialize, /mcp/tools/list, /mcp/tools/call)
    #[arg(long)]
    pub web: bool,

    /// Address to listen on in socket or web mode (overrides `listen`)
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Directory relative paths resolve against (overrides `root`)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Allow paths outside the root
    #[arg(long)]
    pub allow_any_path: bool,

    /// Config file (default: $FILECRUD_HOME/filecrud.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Layer command-line overrides on top of the file config.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(root) = &self.root {
            config.root = Some(root.clone());
        }
        if let Some(listen) = &self.listen {
            config.listen = listen.clone();
        }
        if self.allow_any_path {
            config.path_policy = PathPolicy::Unrestricted;
        }
    }
}
