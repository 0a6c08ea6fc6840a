//! Test-suite command: generate every agent listed in a suite file, write it
//! out and audit the result
//!
//! The suite file names its cases and their input documents:
//!
//! ```json
//! {"test_agents": [{"name": "mail", "description": "...", "input_file": "inputs/mail.json"}]}
//! ```
//!
//! Input paths are resolved against the suite file's directory. Each case runs
//! under the pipeline id `test-<name>`.

use agent_forge_core::llm::GeneratorCache;
use agent_forge_core::progress::ErrorRecord;
use agent_forge_core::validators::{self, compliance::ReferenceAgent};
use agent_forge_core::{ForgeConfig, Pipeline, Status, layout, output};
use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Name of the report written next to the generated agents
pub const RESULTS_FILE: &str = "test_results.json";

#[derive(Debug, Args)]
pub struct TestSuiteArgs {
    /// Suite file listing the agents to generate
    #[arg(short, long)]
    pub suite: PathBuf,

    /// Known-good agent to score compliance against (defaults to the configured reference)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Output directory for generated agents and the report
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct SuiteConfig {
    pub test_agents: Vec<SuiteCase>,
}

#[derive(Debug, Deserialize)]
pub struct SuiteCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_file: PathBuf,
}

#[derive(Debug, Default, Serialize)]
pub struct SuiteReport {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub test_results: Vec<CaseResult>,
}

impl SuiteReport {
    fn record(&mut self, result: CaseResult) {
        if result.overall_success {
            info!(name = %result.name, "agent passed");
            self.passed += 1;
        } else {
            error!(name = %result.name, errors = result.errors.len(), "agent failed");
            self.failed += 1;
        }
        self.total_tests += 1;
        self.test_results.push(result);
    }
}

#[derive(Debug, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub description: String,
    pub generation_success: bool,
    pub overall_success: bool,
    pub generated_files: Vec<String>,
    pub similarity_scores: BTreeMap<String, f64>,
    pub errors: Vec<ErrorRecord>,
    pub warnings: Vec<ErrorRecord>,
}

impl CaseResult {
    fn new(case: &SuiteCase) -> Self {
        Self {
            name: case.name.clone(),
            description: case.description.clone(),
            generation_success: false,
            overall_success: false,
            generated_files: Vec::new(),
            similarity_scores: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

pub async fn execute(args: TestSuiteArgs, config: ForgeConfig) -> Result<ExitCode> {
    let generator = Arc::new(GeneratorCache::gemini(config.llm.clone()));
    let report = run(&args, config, generator).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Run every case in order and save the aggregate report under the output dir
pub async fn run(
    args: &TestSuiteArgs,
    config: ForgeConfig,
    generator: Arc<GeneratorCache>,
) -> Result<SuiteReport> {
    let content = tokio::fs::read_to_string(&args.suite)
        .await
        .with_context(|| format!("Failed to read suite file {}", args.suite.display()))?;
    let suite: SuiteConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse suite file {}", args.suite.display()))?;

    let reference = match args.reference.clone().or_else(|| config.pipeline.reference_dir.clone()) {
        Some(dir) => Some(
            ReferenceAgent::load(&dir)
                .with_context(|| format!("Failed to load reference agent from {}", dir.display()))?,
        ),
        None => {
            warn!("no reference agent; compliance is not scored");
            None
        }
    };

    let out_dir = args.out.clone().unwrap_or_else(|| config.output.dir.clone());
    let base = args.suite.parent().unwrap_or(Path::new("."));
    let pipeline = Pipeline::from_config(&config, generator);

    info!(cases = suite.test_agents.len(), out = %out_dir.display(), "running agent test suite");
    let mut report = SuiteReport::default();
    for case in &suite.test_agents {
        let result = run_case(&pipeline, case, base, &out_dir, reference.as_ref()).await;
        report.record(result);
    }

    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let results_path = out_dir.join(RESULTS_FILE);
    tokio::fs::write(&results_path, serde_json::to_string_pretty(&report)?)
        .await
        .with_context(|| format!("Failed to write {}", results_path.display()))?;

    info!(
        total = report.total_tests,
        passed = report.passed,
        failed = report.failed,
        results = %results_path.display(),
        "test suite finished"
    );
    Ok(report)
}

async fn run_case(
    pipeline: &Pipeline,
    case: &SuiteCase,
    base: &Path,
    out_dir: &Path,
    reference: Option<&ReferenceAgent>,
) -> CaseResult {
    let mut result = CaseResult::new(case);

    let mut input = match output::read_input(&base.join(&case.input_file)).await {
        Ok(input) => input,
        Err(e) => {
            result.errors.push(ErrorRecord::new("INPUT_ERROR", e.to_string()));
            return result;
        }
    };
    input.pipeline_id = format!("test-{}", case.name);

    let run = pipeline.execute(input).await;
    let missing: Vec<&str> = layout::CRITICAL_FILES
        .into_iter()
        .filter(|path| !run.generated_files.contains_key(*path))
        .collect();

    if run.status != Status::Success || !missing.is_empty() {
        result.errors.extend(run.errors.iter().cloned());
        if !missing.is_empty() && !run.errors.has_code("MISSING_CRITICAL_FILES") {
            let message = format!("Critical files missing: {}", missing.join(", "));
            result.errors.push(
                ErrorRecord::new("MISSING_CRITICAL_FILES", message).with("missing_files", missing),
            );
        }
        return result;
    }

    if let Err(e) = output::write_project(out_dir, &run.pipeline_id, &run.generated_files).await {
        result.errors.push(ErrorRecord::new("WRITE_FAILED", e.to_string()));
        return result;
    }
    result.generation_success = true;
    result.generated_files = run.generated_files.keys().cloned().collect();

    let audit = validators::audit(&run.generated_files, reference);
    result.overall_success = audit.is_valid();
    result.similarity_scores = audit.similarity_scores;
    result.errors = audit.findings.errors;
    result.warnings = audit.findings.warnings;
    result
}
