//! Agent generation pipeline
//!
//! A run threads one [`PipelineState`] through six stages in a fixed order.
//! Stages never fail in the Rust sense: problems are appended to the state's
//! error log and every stage still runs, so a caller always gets the full list
//! of problems back in one response.

pub mod orchestrator;
pub mod stages;

#[cfg(test)]
mod tests;

use crate::llm::GeneratorCache;
use crate::state::PipelineState;
use crate::templates::TemplateStore;
use crate::validators::compliance::ReferenceAgent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use orchestrator::Pipeline;

/// Pipeline stage trait that all stages must implement
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Stable stage identifier used in progress events
    fn name(&self) -> &'static str;

    /// Consume the state and hand back the updated one
    async fn execute(&self, state: PipelineState) -> PipelineState;
}

/// Identifiers of the stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageId {
    ValidatingInput,
    PlanningProject,
    GeneratingFiles,
    GeneratingTests,
    RunningSanityChecks,
    PackagingOutput,
}

impl StageId {
    pub const ALL: [StageId; 6] = [
        StageId::ValidatingInput,
        StageId::PlanningProject,
        StageId::GeneratingFiles,
        StageId::GeneratingTests,
        StageId::RunningSanityChecks,
        StageId::PackagingOutput,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageId::ValidatingInput => "VALIDATING_INPUT",
            StageId::PlanningProject => "PLANNING_PROJECT",
            StageId::GeneratingFiles => "GENERATING_FILES",
            StageId::GeneratingTests => "GENERATING_TESTS",
            StageId::RunningSanityChecks => "RUNNING_SANITY_CHECKS",
            StageId::PackagingOutput => "PACKAGING_OUTPUT",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a failed sanity pass sends the run back to generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicy {
    /// Always move forward to packaging
    #[default]
    Never,
    /// Regenerate once when sanity checks added errors
    Once,
}

impl RetryPolicy {
    pub fn max_retries(self) -> usize {
        match self {
            RetryPolicy::Never => 0,
            RetryPolicy::Once => 1,
        }
    }
}

/// Shared collaborators handed to the stages that need them
#[derive(Clone)]
pub struct PipelineDeps {
    pub generator: Arc<GeneratorCache>,
    pub templates: Arc<TemplateStore>,
    pub reference: Option<Arc<ReferenceAgent>>,
    /// Upper bound on a single generation call
    pub timeout: Duration,
}

impl PipelineDeps {
    pub fn new(generator: Arc<GeneratorCache>) -> Self {
        Self {
            generator,
            templates: Arc::new(TemplateStore::empty()),
            reference: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_templates(mut self, templates: TemplateStore) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    pub fn with_reference(mut self, reference: ReferenceAgent) -> Self {
        self.reference = Some(Arc::new(reference));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
