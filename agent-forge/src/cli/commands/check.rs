//! Check command: validate a generated agent directory without calling the LLM

use agent_forge_core::validators::{self, compliance::ReferenceAgent};
use agent_forge_core::{ForgeConfig, output};
use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Generated agent directory
    pub path: PathBuf,

    /// Known-good agent to score compliance against (defaults to the configured reference)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,
}

pub async fn execute(args: CheckArgs, config: ForgeConfig) -> Result<ExitCode> {
    let files = output::read_project(&args.path)
        .with_context(|| format!("Failed to read agent directory {}", args.path.display()))?;

    let reference = match args.reference.or(config.pipeline.reference_dir) {
        Some(dir) => Some(
            ReferenceAgent::load(&dir)
                .with_context(|| format!("Failed to load reference agent from {}", dir.display()))?,
        ),
        None => None,
    };

    let report = validators::audit(&files, reference.as_ref());
    info!(
        files = files.len(),
        errors = report.findings.error_count(),
        warnings = report.findings.warning_count(),
        "check finished"
    );

    let body = json!({
        "directory": args.path.display().to_string(),
        "valid": report.is_valid(),
        "files_checked": files.len(),
        "errors": report.findings.errors,
        "warnings": report.findings.warnings,
        "similarity_scores": report.similarity_scores,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(if report.is_valid() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
