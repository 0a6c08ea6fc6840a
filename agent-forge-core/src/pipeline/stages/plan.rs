use crate::layout::PLANNED_FILES;
use crate::pipeline::{PipelineStage, StageId};
use crate::progress::Level;
use crate::state::PipelineState;
use async_trait::async_trait;

/// Schedules the fixed project layout; the agent spec does not influence it
pub struct PlanProject;

#[async_trait]
impl PipelineStage for PlanProject {
    fn name(&self) -> &'static str {
        StageId::PlanningProject.as_str()
    }

    async fn execute(&self, mut state: PipelineState) -> PipelineState {
        state.files_to_generate = PLANNED_FILES.iter().map(|path| path.to_string()).collect();
        let count = state.files_to_generate.len();
        state.progress.emit_with(
            self.name(),
            format!("Planned {count} files"),
            Level::Info,
            crate::data! { "file_count" => count },
        );
        state
    }
}
