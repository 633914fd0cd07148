mod cli;
mod handler;
mod protocol;
mod socket;
mod stdio;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use filecrud_core::config::CONFIG_FILE_NAME;
use filecrud_core::{Dispatcher, ServerConfig};
use tokio::io::BufReader;
use tokio::net::TcpListener;

use cli::Cli;
use handler::McpHandler;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("interrupted, shutting down");
}

/// Resolve the server home directory: `FILECRUD_HOME` env > working directory
fn filecrud_home() -> std::io::Result<PathBuf> {
    if let Ok(h) = std::env::var("FILECRUD_HOME") {
        return Ok(PathBuf::from(h));
    }
    std::env::current_dir()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries the protocol; all logging goes to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .target(env_logger::Target::Stderr)
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => filecrud_home()?.join(CONFIG_FILE_NAME),
    };
    let mut config = ServerConfig::load(&config_path);
    cli.apply(&mut config);

    let ctx = config.to_context(&std::env::current_dir()?)?;
    log::info!(
        "root: {} (path policy: {})",
        ctx.root().display(),
        ctx.policy()
    );
    let dispatcher = Arc::new(Dispatcher::new(ctx));

    if cli.web {
        let listener = TcpListener::bind(&config.listen).await?;
        log::info!("serving MCP over HTTP on {}", listener.local_addr()?);
        let handler = Arc::new(McpHandler::new(dispatcher));
        axum::serve(listener, web::router(handler))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else if cli.socket {
        let listener = TcpListener::bind(&config.listen).await?;
        log::info!("listening on {}", listener.local_addr()?);
        tokio::select! {
            () = socket::serve(listener, dispatcher) => {}
            () = shutdown_signal() => {}
        }
    } else {
        log::info!("serving MCP on stdio");
        let handler = McpHandler::new(dispatcher);
        stdio::serve(
            &handler,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .await?;
    }

    Ok(())
}
