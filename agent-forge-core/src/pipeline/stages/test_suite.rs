use crate::layout::{TEST_FILE, TEST_PREREQUISITES};
use crate::pipeline::{PipelineStage, StageId};
use crate::progress::{ErrorRecord, Level};
use crate::state::{AgentSpec, PipelineState};
use async_trait::async_trait;
use regex_utils::placeholders;

const TEST_TEMPLATE: &str = include_str!("../../../assets/test_agent.py.tmpl");

/// Checks that the modules under test exist and writes a pytest suite for them
pub struct GenerateTests;

/// Deterministic pytest file for the agent described by `spec`
pub fn render_test_file(spec: &AgentSpec) -> String {
    let description = spec.description_text().replace("\"\"\"", "'''");
    let slug = spec.primary_tool_slug();
    placeholders::substitute(TEST_TEMPLATE, &spec.identifier(), &description, slug)
}

#[async_trait]
impl PipelineStage for GenerateTests {
    fn name(&self) -> &'static str {
        StageId::GeneratingTests.as_str()
    }

    async fn execute(&self, mut state: PipelineState) -> PipelineState {
        let stage = self.name();
        state.progress.emit(stage, "Generating test files", Level::Info);

        for path in TEST_PREREQUISITES {
            if !state.has_file(path) {
                state.push_error(
                    ErrorRecord::new(
                        "MISSING_REQUIRED_FILE",
                        format!("Required file {path} not generated"),
                    )
                    .for_file(path),
                );
            }
        }

        let content = render_test_file(&state.agent_spec);
        state.put_file(TEST_FILE, content);
        let data = crate::data! { "file" => TEST_FILE };
        state.progress.emit_with(stage, "Test file generated", Level::Info, data);

        if state.errors.is_empty() {
            state.progress.emit(stage, "File validation complete", Level::Info);
        } else {
            state.progress.emit_with(
                stage,
                "File validation failed",
                Level::Error,
                crate::data! { "error_count" => state.errors.len() },
            );
        }
        state
    }
}
