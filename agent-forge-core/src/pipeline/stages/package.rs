use crate::layout::CRITICAL_FILES;
use crate::pipeline::{PipelineStage, StageId};
use crate::progress::{ErrorRecord, Level};
use crate::state::{Manifest, PipelineState, Status};
use async_trait::async_trait;

const SMOKE_OUTPUT: &str = "Agent should initialize successfully with:\n\
                            - Google ADK agent created\n\
                            - Pipedream MCP client configured\n\
                            - Tools loaded from Pipedream";

/// Stage name of the final completion event
pub const DONE: &str = "DONE";

fn run_instructions(pipeline_id: &str) -> Vec<String> {
    vec![
        format!("1. Navigate to generated_agents/{pipeline_id}/"),
        "2. Copy .env.example to .env and fill in your credentials".to_string(),
        "3. Install dependencies: pip install -r requirements.txt".to_string(),
        "4. Run the agent: adk run .".to_string(),
        "5. Or use the web UI: adk web (then select your agent from dropdown)".to_string(),
    ]
}

/// Attaches the manifest and decides the terminal status
pub struct PackageOutput;

#[async_trait]
impl PipelineStage for PackageOutput {
    fn name(&self) -> &'static str {
        StageId::PackagingOutput.as_str()
    }

    async fn execute(&self, mut state: PipelineState) -> PipelineState {
        let stage = self.name();
        state.progress.emit(stage, "Packaging output", Level::Info);

        let missing: Vec<&str> =
            CRITICAL_FILES.into_iter().filter(|path| !state.has_file(path)).collect();
        if !missing.is_empty() {
            let count = missing.len();
            let message = format!("Critical files missing: {}", missing.join(", "));
            state.push_error(
                ErrorRecord::new("MISSING_CRITICAL_FILES", message).with("missing_files", missing),
            );
            state.set_status(Status::Error);
            let message = format!("Packaging failed: {count} critical files missing");
            state.progress.emit(stage, message, Level::Error);
            return state;
        }

        state.manifest = Some(Manifest {
            files: state.generated_files().keys().cloned().collect(),
            run_instructions: run_instructions(&state.pipeline_id),
            expected_smoke_output: SMOKE_OUTPUT.to_string(),
        });

        if !state.errors.is_empty() {
            let count = state.errors.len();
            state.set_status(Status::Error);
            let message = format!("Packaging completed with {count} errors");
            state.progress.emit(stage, message, Level::Error);
            return state;
        }

        state.set_status(Status::Success);
        state.progress.emit(stage, "Output packaged successfully", Level::Info);
        let files_generated = state.generated_files().len();
        let pipeline_id = state.pipeline_id.clone();
        state.progress.emit_with(
            DONE,
            "Code generation complete",
            Level::Success,
            crate::data! { "files_generated" => files_generated, "pipeline_id" => pipeline_id },
        );
        state
    }
}
