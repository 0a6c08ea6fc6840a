//! Pipeline state threaded through every stage

use crate::progress::{ErrorLog, ErrorRecord, ProgressLog};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Generated project files keyed by relative path, in insertion order
pub type FileMap = IndexMap<String, String>;

/// Name used when the agent spec does not carry one
pub const DEFAULT_AGENT_NAME: &str = "GeneratedAgent";

/// Model used when the runtime does not name one
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Terminal outcome of a run.
///
/// Transitions only go forward: once `Success` or `Error` is reached the
/// status never changes again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Processing,
    Success,
    Error,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Processing)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runtime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default)]
    pub auth_required: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolRequirement {
    /// Slug if present and non-empty
    pub fn slug(&self) -> Option<&str> {
        self.tool_slug.as_deref().filter(|slug| !slug.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_slug: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Description of the agent to generate.
///
/// Every field is optional at parse time so that validation can report
/// exactly which ones are missing. Unknown keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_required: Option<Vec<ToolRequirement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentSpec {
    pub fn is_empty(&self) -> bool {
        self == &AgentSpec::default()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_AGENT_NAME)
    }

    /// Lowercased agent name with spaces replaced by underscores
    pub fn identifier(&self) -> String {
        self.display_name().to_lowercase().replace(' ', "_")
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn model(&self) -> &str {
        self.runtime.as_ref().and_then(|runtime| runtime.model.as_deref()).unwrap_or(DEFAULT_MODEL)
    }

    pub fn tools(&self) -> &[ToolRequirement] {
        self.tools_required.as_deref().unwrap_or_default()
    }

    pub fn action_list(&self) -> &[Action] {
        self.actions.as_deref().unwrap_or_default()
    }

    /// Slug of the first required tool, or `"default"`
    pub fn primary_tool_slug(&self) -> &str {
        self.tools().first().and_then(|tool| tool.tool_slug.as_deref()).unwrap_or("default")
    }
}

/// One entry of the tool registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_slug: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipedreamIntegration {
    #[serde(default)]
    pub external_user_ids: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Integrations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipedream: Option<PipedreamIntegration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Integrations {
    pub fn is_empty(&self) -> bool {
        self.pipedream.is_none() && self.extra.is_empty()
    }

    pub fn pipedream_user_ids(&self) -> Option<&BTreeMap<String, String>> {
        self.pipedream.as_ref().map(|pipedream| &pipedream.external_user_ids)
    }
}

/// Packaging summary of produced files and usage instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<String>,
    pub run_instructions: Vec<String>,
    pub expected_smoke_output: String,
}

/// The input document accepted by the CLI and the HTTP service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineInput {
    #[serde(default = "default_pipeline_id")]
    pub pipeline_id: String,
    #[serde(default = "default_spec_version")]
    pub agent_spec_version: String,
    #[serde(default)]
    pub user_query: String,
    #[serde(default)]
    pub agent_spec: AgentSpec,
    #[serde(default)]
    pub tool_registry: Vec<ToolRecord>,
    #[serde(default)]
    pub integrations: Integrations,
}

fn default_pipeline_id() -> String {
    "unknown".to_string()
}

fn default_spec_version() -> String {
    "v1".to_string()
}

/// The record every stage consumes and returns
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub pipeline_id: String,
    pub agent_spec_version: String,
    pub user_query: String,
    pub agent_spec: AgentSpec,
    pub tool_registry: Vec<ToolRecord>,
    pub integrations: Integrations,
    pub progress: ProgressLog,
    pub errors: ErrorLog,
    validation_passed: bool,
    pub files_to_generate: Vec<String>,
    generated_files: FileMap,
    pub manifest: Option<Manifest>,
    status: Status,
}

impl PipelineState {
    pub fn new(input: PipelineInput) -> Self {
        Self {
            pipeline_id: input.pipeline_id,
            agent_spec_version: input.agent_spec_version,
            user_query: input.user_query,
            agent_spec: input.agent_spec,
            tool_registry: input.tool_registry,
            integrations: input.integrations,
            progress: ProgressLog::new(),
            errors: ErrorLog::new(),
            validation_passed: false,
            files_to_generate: Vec::new(),
            generated_files: FileMap::new(),
            manifest: None,
            status: Status::Processing,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Move to `next` unless a terminal status was already reached
    pub fn set_status(&mut self, next: Status) {
        if self.status.is_terminal() {
            debug!(
                current = ?self.status,
                requested = ?next,
                "ignoring status change after terminal state"
            );
            return;
        }
        self.status = next;
    }

    pub fn validation_passed(&self) -> bool {
        self.validation_passed
    }

    /// Latch the validation flag; it is never cleared afterwards
    pub fn mark_validated(&mut self) {
        self.validation_passed = true;
    }

    pub fn generated_files(&self) -> &FileMap {
        &self.generated_files
    }

    /// Insert or overwrite one file; paths are never removed
    pub fn put_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.generated_files.insert(path.into(), content.into());
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.generated_files.contains_key(path)
    }

    pub fn push_error(&mut self, record: ErrorRecord) {
        self.errors.push(record);
    }

    pub fn into_output(self) -> PipelineOutput {
        PipelineOutput {
            pipeline_id: self.pipeline_id,
            status: self.status,
            manifest: self.manifest,
            generated_files: self.generated_files,
            progress_events: self.progress,
            errors: self.errors,
        }
    }
}

/// The output document returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub pipeline_id: String,
    pub status: Status,
    pub manifest: Option<Manifest>,
    pub generated_files: FileMap,
    pub progress_events: ProgressLog,
    #[serde(default, skip_serializing_if = "ErrorLog::is_empty")]
    pub errors: ErrorLog,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_defaults() {
        let input: PipelineInput = serde_json::from_value(json!({})).unwrap();
        assert_eq!(input.pipeline_id, "unknown");
        assert_eq!(input.agent_spec_version, "v1");
        assert!(input.agent_spec.is_empty());
        assert!(input.integrations.is_empty());
    }

    #[test]
    fn test_agent_spec_preserves_unknown_keys() {
        let spec: AgentSpec = serde_json::from_value(json!({
            "name": "Mail Bot",
            "persona": "friendly",
            "tools_required": [
                {"tool_slug": "gmail", "provider": "pipedream", "auth_required": true}
            ]
        }))
        .unwrap();

        assert_eq!(spec.identifier(), "mail_bot");
        assert_eq!(spec.primary_tool_slug(), "gmail");
        assert_eq!(spec.extra["persona"], "friendly");
        assert!(spec.tools()[0].auth_required);
        assert_eq!(spec.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_status_is_forward_only() {
        let mut state = PipelineState::new(PipelineInput::default());
        state.set_status(Status::Error);
        state.set_status(Status::Success);
        assert_eq!(state.status(), Status::Error);
    }

    #[test]
    fn test_output_omits_empty_errors() {
        let state = PipelineState::new(PipelineInput::default());
        let json = serde_json::to_value(state.into_output()).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json["manifest"].is_null());
        assert_eq!(json["status"], "processing");
    }
}
