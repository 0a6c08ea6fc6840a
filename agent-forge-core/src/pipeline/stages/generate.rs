//! LLM-backed file generation

use crate::llm::prompts::PromptContext;
use crate::llm::{LLMError, TextGenerator};
use crate::pipeline::{PipelineDeps, PipelineStage, StageId};
use crate::progress::{ErrorRecord, Level};
use crate::state::{AgentSpec, PipelineState};
use async_trait::async_trait;
use regex_utils::{code_fence, placeholders};
use std::sync::Arc;
use tracing::{debug, info, warn};

const PACKAGE_INIT: &str = "from . import agent\n";
const CONFIG_INIT: &str =
    "from .agent_config import get_agent_config\n\n__all__ = ['get_agent_config']\n";
const SETUP_SH: &str = include_str!("../../../assets/setup.sh");
const SETUP_PY: &str = include_str!("../../../assets/setup.py");
const RUN_SH: &str = include_str!("../../../assets/run.sh");

/// Files written verbatim, without a generation call
pub const BOILERPLATE: [(&str, &str); 5] = [
    ("__init__.py", PACKAGE_INIT),
    ("config/__init__.py", CONFIG_INIT),
    ("setup.sh", SETUP_SH),
    ("setup.py", SETUP_PY),
    ("run.sh", RUN_SH),
];

fn is_boilerplate(path: &str) -> bool {
    BOILERPLATE.iter().any(|(file, _)| *file == path)
}

/// Writes boilerplate, then asks the text generator for every other planned
/// file. A failed file is recorded and skipped; the rest still run.
pub struct GenerateFiles {
    deps: PipelineDeps,
}

impl GenerateFiles {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    async fn generate_one(
        &self,
        generator: &Arc<dyn TextGenerator>,
        state: &PipelineState,
        path: &str,
    ) -> Result<String, LLMError> {
        let prompt = PromptContext::from_state(state).build(path, self.deps.templates.get(path))?;
        debug!(file = path, template = self.deps.templates.get(path).is_some(), "prompt built");

        let raw = tokio::time::timeout(self.deps.timeout, generator.generate(path, &prompt))
            .await
            .map_err(|_| LLMError::timeout(self.deps.timeout))??;

        Ok(post_process(&state.agent_spec, path, &raw))
    }
}

/// Strip fences, fill known placeholders and trim one response
pub fn post_process(spec: &AgentSpec, path: &str, raw: &str) -> String {
    let unfenced = code_fence::strip(raw);
    let content = placeholders::substitute(
        &unfenced,
        &spec.identifier(),
        spec.description_text(),
        spec.primary_tool_slug(),
    );

    let leftover = placeholders::remaining(&content);
    if !leftover.is_empty() {
        warn!(
            file = path,
            placeholders = ?leftover,
            "unreplaced template placeholders in generated file"
        );
    }

    content.trim().to_string()
}

fn generation_failed(path: &str, error: &LLMError) -> ErrorRecord {
    ErrorRecord::new("GENERATION_FAILED", format!("Failed to generate {path}: {error}"))
        .with("stage", "generate_files")
        .with("file", path)
        .with("error", error.to_string())
        .with("error_type", error.error_type())
        .with("retryable", error.is_retryable())
}

#[async_trait]
impl PipelineStage for GenerateFiles {
    fn name(&self) -> &'static str {
        StageId::GeneratingFiles.as_str()
    }

    async fn execute(&self, mut state: PipelineState) -> PipelineState {
        let stage = self.name();
        state.progress.emit(stage, "Starting LLM-based file generation", Level::Info);

        let generator = match self.deps.generator.get_or_init().await {
            Ok(generator) => generator,
            Err(e) => {
                state.push_error(
                    ErrorRecord::new(
                        "GENERATION_INIT_FAILED",
                        "Failed to initialize text generator",
                    )
                    .with("stage", "generate_files")
                    .with("error", e.to_string())
                    .with("error_type", e.error_type()),
                );
                state.progress.emit(stage, e.to_string(), Level::Error);
                return state;
            }
        };

        for (path, content) in BOILERPLATE {
            state.put_file(path, content);
        }

        let pending: Vec<String> =
            state.files_to_generate.iter().filter(|path| !is_boilerplate(path)).cloned().collect();
        info!(
            pipeline_id = %state.pipeline_id,
            files = pending.len(),
            generator = generator.name(),
            "generating files"
        );

        let mut failed = 0usize;
        for path in pending {
            state.progress.emit_with(
                stage,
                format!("Generating {path} with LLM"),
                Level::Info,
                crate::data! { "file" => path },
            );

            match self.generate_one(&generator, &state, &path).await {
                Ok(content) => {
                    state.put_file(path.clone(), content);
                    state.progress.emit_with(
                        stage,
                        format!("Successfully generated {path}"),
                        Level::Success,
                        crate::data! { "file" => path },
                    );
                }
                Err(e) => {
                    failed += 1;
                    if e.invalidates_client() {
                        self.deps.generator.invalidate().await;
                    }
                    let record = generation_failed(&path, &e);
                    state.progress.emit_with(
                        stage,
                        record.message.clone(),
                        Level::Error,
                        crate::data! { "file" => path },
                    );
                    state.push_error(record);
                }
            }
        }

        let file_count = state.generated_files().len();
        let level = if failed == 0 { Level::Info } else { Level::Warning };
        state.progress.emit_with(
            stage,
            format!("Generated {file_count} files ({failed} failed)"),
            level,
            crate::data! { "file_count" => file_count, "failed" => failed },
        );
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_process() {
        let spec: AgentSpec = serde_json::from_value(serde_json::json!({
            "name": "Mail Bot",
            "description": "Reads mail",
            "tools_required": [{"tool_slug": "gmail"}]
        }))
        .unwrap();

        let raw = "```python\n\
                   NAME = \"{{ agent_name }}\"\n\
                   SLUG = \"{{ tool.tool_slug }}\"\n\
                   # {{ agent_description }}\n\
                   ```\n";
        let content = post_process(&spec, "agent.py", raw);
        assert_eq!(content, "NAME = \"mail_bot\"\nSLUG = \"gmail\"\n# Reads mail");
    }

    #[test]
    fn test_post_process_keeps_unknown_placeholders() {
        let content = post_process(&AgentSpec::default(), "README.md", "  Hello {{ user }}  \n");
        assert_eq!(content, "Hello {{ user }}");
    }

    #[test]
    fn test_boilerplate_assets() {
        assert!(SETUP_SH.starts_with("#!/bin/bash"));
        assert!(RUN_SH.contains("adk run"));
        assert!(SETUP_PY.contains("def main()"));
        assert!(is_boilerplate("config/__init__.py"));
        assert!(!is_boilerplate("agent.py"));
    }
}
