//! Generate command: run the pipeline once and print the output document

use agent_forge_core::llm::GeneratorCache;
use agent_forge_core::{ForgeConfig, Pipeline, PipelineOutput, RetryPolicy, Status, output};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Input JSON document (pipeline_id, agent_spec, tool_registry, integrations)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory (defaults to the configured output dir)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Don't write files to disk, only print JSON
    #[arg(long)]
    pub no_write: bool,

    /// Regenerate once when sanity checks fail
    #[arg(long)]
    pub retry_generation: bool,
}

pub async fn execute(args: GenerateArgs, config: ForgeConfig) -> Result<ExitCode> {
    let generator = Arc::new(GeneratorCache::gemini(config.llm.clone()));
    let (result, code) = run(&args, config, generator).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(code)
}

/// Load the input, run the pipeline and write the project unless `--no-write`.
///
/// A failed write only logs a warning; the exit code follows the run status.
pub async fn run(
    args: &GenerateArgs,
    mut config: ForgeConfig,
    generator: Arc<GeneratorCache>,
) -> Result<(PipelineOutput, ExitCode)> {
    let input = output::read_input(&args.input)
        .await
        .with_context(|| format!("Failed to load input from {}", args.input.display()))?;

    if args.retry_generation {
        config.pipeline.retry = RetryPolicy::Once;
    }

    info!(
        pipeline_id = %input.pipeline_id,
        retry = ?config.pipeline.retry,
        "starting code generation"
    );
    let pipeline = Pipeline::from_config(&config, generator);
    let result = pipeline.execute(input).await;

    if args.no_write {
        info!("skipping file write (--no-write)");
    } else {
        let out_dir = args.out.clone().unwrap_or_else(|| config.output.dir.clone());
        match output::write_project(&out_dir, &result.pipeline_id, &result.generated_files).await {
            Ok(dir) => info!(dir = %dir.display(), "files written"),
            Err(e) => warn!("failed to write files: {e}"),
        }
    }

    info!(
        pipeline_id = %result.pipeline_id,
        status = ?result.status,
        files = result.generated_files.len(),
        events = result.progress_events.len(),
        "generation finished"
    );

    let code = if result.status == Status::Success {
        ExitCode::SUCCESS
    } else {
        error!(errors = result.errors.len(), "generation did not succeed");
        ExitCode::FAILURE
    };
    Ok((result, code))
}
