//! Stage sequencing and the conditional regeneration edge

use super::stages::{
    GenerateFiles, GenerateTests, PackageOutput, PlanProject, SanityChecks, ValidateInput,
};
use super::{PipelineDeps, PipelineStage, RetryPolicy};
use crate::config::ForgeConfig;
use crate::llm::GeneratorCache;
use crate::state::{PipelineInput, PipelineOutput, PipelineState};
use crate::templates::TemplateStore;
use crate::validators::compliance::ReferenceAgent;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

/// The staged workflow:
///
/// ```text
/// validate -> plan -> generate -> tests -> sanity -> package
///                        ^                    |
///                        +---- (retry) -------+
/// ```
///
/// Every stage always runs. The retry edge is only taken under
/// [`RetryPolicy::Once`] when the sanity pass added errors.
pub struct Pipeline {
    validate: ValidateInput,
    plan: PlanProject,
    generate: GenerateFiles,
    tests: GenerateTests,
    sanity: SanityChecks,
    package: PackageOutput,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps, retry: RetryPolicy) -> Self {
        Self {
            validate: ValidateInput,
            plan: PlanProject,
            sanity: SanityChecks::new(&deps),
            generate: GenerateFiles::new(deps),
            tests: GenerateTests,
            package: PackageOutput,
            retry,
        }
    }

    /// Wire templates, the reference agent and timeouts from configuration
    pub fn from_config(config: &ForgeConfig, generator: Arc<GeneratorCache>) -> Self {
        let mut deps = PipelineDeps::new(generator).with_timeout(config.llm.timeout());

        if let Some(dir) = &config.pipeline.templates_dir {
            let templates = TemplateStore::load(dir);
            info!(dir = %dir.display(), count = templates.len(), "reference templates loaded");
            deps = deps.with_templates(templates);
        }

        if let Some(dir) = &config.pipeline.reference_dir {
            match ReferenceAgent::load(dir) {
                Ok(reference) => deps = deps.with_reference(reference),
                Err(e) => warn!(dir = %dir.display(), "reference agent not loaded: {e}"),
            }
        }

        Self::new(deps, config.pipeline.retry)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn step(&self, stage: &dyn PipelineStage, state: PipelineState) -> PipelineState {
        let started = Instant::now();
        let errors_before = state.errors.len();
        let state = stage.execute(state).await;
        debug!(
            stage = stage.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            new_errors = state.errors.len() - errors_before,
            "stage finished"
        );
        state
    }

    /// Run every stage over a fresh state built from `input`
    pub async fn run(&self, input: PipelineInput) -> PipelineState {
        let state = PipelineState::new(input);
        let span = info_span!("pipeline", pipeline_id = %state.pipeline_id);
        self.run_state(state).instrument(span).await
    }

    /// Run and convert to the output document
    pub async fn execute(&self, input: PipelineInput) -> PipelineOutput {
        self.run(input).await.into_output()
    }

    async fn run_state(&self, state: PipelineState) -> PipelineState {
        info!("pipeline started");

        let state = self.step(&self.validate, state).await;
        let state = self.step(&self.plan, state).await;
        let state = self.step(&self.generate, state).await;
        let mut state = self.step(&self.tests, state).await;

        let mut retries = 0;
        loop {
            let errors_before = state.errors.len();
            state = self.step(&self.sanity, state).await;

            let failed = state.errors.len() > errors_before;
            if !failed || retries >= self.retry.max_retries() {
                break;
            }
            retries += 1;
            info!(attempt = retries, "sanity checks failed, regenerating files");
            state = self.step(&self.generate, state).await;
            state = self.step(&self.tests, state).await;
        }

        let state = self.step(&self.package, state).await;
        info!(status = ?state.status(), errors = state.errors.len(), "pipeline finished");
        state
    }
}
