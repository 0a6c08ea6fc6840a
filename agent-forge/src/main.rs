use agent_forge_core::ForgeConfig;
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod service;

use cli::{Cli, Commands};

fn main() -> Result<ExitCode> {
    // .env may supply API keys and overrides; absence is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the JSON result
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.filter())),
        )
        .init();

    let config = ForgeConfig::load(cli.config.as_deref())?;
    debug!(?config, "configuration loaded");

    let runtime = tokio::runtime::Runtime::new()?;
    use cli::commands::{check, generate, serve, test_suite};
    match cli.command {
        Commands::Generate(args) => runtime.block_on(generate::execute(args, config)),
        Commands::Serve(args) => runtime.block_on(serve::execute(args, config)),
        Commands::Check(args) => runtime.block_on(check::execute(args, config)),
        Commands::TestSuite(args) => runtime.block_on(test_suite::execute(args, config)),
    }
}
