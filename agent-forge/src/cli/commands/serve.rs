//! Serve command: run the HTTP service

use crate::service::{self, AppState};
use agent_forge_core::ForgeConfig;
use anyhow::{Context, Result};
use clap::Args;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Bind address (overrides config and HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides config and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: ForgeConfig) -> Result<ExitCode> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = service::create_app(AppState::from_config(&config));

    let listener =
        TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, output_dir = %config.output.dir.display(), "agent-forge service listening");
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(ExitCode::SUCCESS)
}
