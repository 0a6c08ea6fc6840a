//! Structural validation of the input document

use crate::pipeline::{PipelineStage, StageId};
use crate::progress::{ErrorRecord, Level};
use crate::state::{PipelineState, Status};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Checks the agent spec, tool registry and integrations before anything is
/// generated. Every problem is recorded; the run continues regardless.
pub struct ValidateInput;

#[async_trait]
impl PipelineStage for ValidateInput {
    fn name(&self) -> &'static str {
        StageId::ValidatingInput.as_str()
    }

    async fn execute(&self, mut state: PipelineState) -> PipelineState {
        let stage = self.name();
        state.progress.emit(stage, "Validating input specification", Level::Info);

        let problems = check_input(&state);
        if problems.is_empty() {
            state.mark_validated();
            state.progress.emit(stage, "Input validation passed", Level::Success);
            return state;
        }

        let count = problems.len();
        state.errors.extend(problems);
        state.set_status(Status::Error);
        state.progress.emit_with(
            stage,
            format!("Input validation failed with {count} errors"),
            Level::Error,
            crate::data! { "error_count" => count },
        );
        state
    }
}

/// Every problem with the input, in a stable order
pub fn check_input(state: &PipelineState) -> Vec<ErrorRecord> {
    let mut problems = Vec::new();

    if state.agent_spec.is_empty() {
        problems.push(ErrorRecord::new("MISSING_AGENT_SPEC", "agent_spec is required"));
    }
    if state.tool_registry.is_empty() {
        problems.push(ErrorRecord::new("MISSING_TOOL_REGISTRY", "tool_registry is required"));
    }
    if state.integrations.is_empty() {
        problems.push(ErrorRecord::new("MISSING_INTEGRATIONS", "integrations is required"));
    }
    if !problems.is_empty() {
        return problems;
    }

    check_fields(state, &mut problems);
    check_tools(state, &mut problems);
    check_actions(state, &mut problems);
    problems
}

fn check_fields(state: &PipelineState, problems: &mut Vec<ErrorRecord>) {
    let spec = &state.agent_spec;
    let present = [
        ("name", spec.name.is_some()),
        ("description", spec.description.is_some()),
        ("runtime", spec.runtime.is_some()),
        ("tools_required", spec.tools_required.is_some()),
        ("actions", spec.actions.is_some()),
    ];

    for (field, found) in present {
        if !found {
            problems.push(
                ErrorRecord::new(
                    format!("MISSING_FIELD_{}", field.to_uppercase()),
                    format!("agent_spec missing required field: {field}"),
                )
                .with("field", field),
            );
        }
    }
}

fn check_tools(state: &PipelineState, problems: &mut Vec<ErrorRecord>) {
    let registry: BTreeSet<&str> =
        state.tool_registry.iter().filter_map(|record| record.tool_slug.as_deref()).collect();
    let connected = state.integrations.pipedream_user_ids();

    for (index, tool) in state.agent_spec.tools().iter().enumerate() {
        let Some(slug) = tool.slug() else {
            problems.push(
                ErrorRecord::new(
                    "MISSING_TOOL_SLUG",
                    format!("Tool at index {index} missing tool_slug"),
                )
                .with("index", index),
            );
            continue;
        };

        if !registry.contains(slug) {
            problems.push(
                ErrorRecord::new(
                    "TOOL_NOT_IN_REGISTRY",
                    format!("Tool '{slug}' not found in tool_registry"),
                )
                .with("tool_slug", slug),
            );
        }

        let needs_connection = tool.provider.as_deref() == Some("pipedream") && tool.auth_required;
        if needs_connection && !connected.is_some_and(|ids| ids.contains_key(slug)) {
            problems.push(
                ErrorRecord::new(
                    "MISSING_PIPEDREAM_CONNECTION",
                    format!("Tool '{slug}' requires Pipedream auth but no external_user_id found"),
                )
                .with("tool_slug", slug),
            );
        }
    }
}

fn check_actions(state: &PipelineState, problems: &mut Vec<ErrorRecord>) {
    let declared: BTreeSet<&str> =
        state.agent_spec.tools().iter().filter_map(|tool| tool.slug()).collect();

    for (index, action) in state.agent_spec.action_list().iter().enumerate() {
        let name = action.name.clone().unwrap_or_else(|| format!("#{index}"));
        match action.tool_slug.as_deref().filter(|slug| !slug.is_empty()) {
            None => problems.push(
                ErrorRecord::new(
                    "MISSING_ACTION_TOOL_SLUG",
                    format!("Action '{name}' missing tool_slug"),
                )
                .with("action", name),
            ),
            Some(slug) if !declared.contains(slug) => problems.push(
                ErrorRecord::new(
                    "ACTION_TOOL_NOT_IN_SPEC",
                    format!("Action '{name}' uses tool '{slug}' not in tools_required"),
                )
                .with("action", name)
                .with("tool_slug", slug),
            ),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PipelineInput;
    use crate::testing;
    use serde_json::json;

    fn state_from(value: serde_json::Value) -> PipelineState {
        PipelineState::new(serde_json::from_value::<PipelineInput>(value).unwrap())
    }

    fn codes(problems: &[ErrorRecord]) -> Vec<&str> {
        problems.iter().map(|p| p.code.as_str()).collect()
    }

    #[tokio::test]
    async fn test_valid_input_passes() {
        let state = ValidateInput.execute(PipelineState::new(testing::valid_input())).await;
        assert!(state.validation_passed());
        assert!(state.errors.is_empty());
        assert_eq!(state.status(), Status::Processing);
    }

    #[tokio::test]
    async fn test_empty_document_reports_each_section() {
        let state = ValidateInput.execute(state_from(json!({}))).await;
        let codes: Vec<&str> = state.errors.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, ["MISSING_AGENT_SPEC", "MISSING_TOOL_REGISTRY", "MISSING_INTEGRATIONS"]);
        assert_eq!(state.status(), Status::Error);
        assert!(!state.validation_passed());
    }

    #[test]
    fn test_missing_fields() {
        let state = state_from(json!({
            "agent_spec": {"name": "X", "description": "d", "runtime": {}, "tools_required": []},
            "tool_registry": [{"tool_slug": "gmail"}],
            "integrations": {"pipedream": {}}
        }));
        let problems = check_input(&state);
        assert_eq!(codes(&problems), ["MISSING_FIELD_ACTIONS"]);
        assert_eq!(problems[0].details["field"], "actions");
    }

    #[test]
    fn test_action_checks_without_tools_required() {
        let state = state_from(json!({
            "agent_spec": {"name": "X", "description": "d", "runtime": {},
                           "actions": [{"name": "a1", "tool_slug": "gmail"}, {"name": "a2"}]},
            "tool_registry": [{"tool_slug": "gmail"}],
            "integrations": {"pipedream": {}}
        }));
        let problems = check_input(&state);
        assert_eq!(
            codes(&problems),
            ["MISSING_FIELD_TOOLS_REQUIRED", "ACTION_TOOL_NOT_IN_SPEC", "MISSING_ACTION_TOOL_SLUG"]
        );
    }

    #[test]
    fn test_tool_slug_checks() {
        let state = state_from(json!({
            "agent_spec": {
                "name": "X",
                "description": "d",
                "runtime": {},
                "actions": [],
                "tools_required": [
                    {"provider": "pipedream"},
                    {"tool_slug": ""},
                    {"tool_slug": "notion"}
                ]
            },
            "tool_registry": [{"tool_slug": "gmail"}],
            "integrations": {"pipedream": {}}
        }));
        let problems = check_input(&state);
        assert_eq!(
            codes(&problems),
            ["MISSING_TOOL_SLUG", "MISSING_TOOL_SLUG", "TOOL_NOT_IN_REGISTRY"]
        );
        assert_eq!(problems[2].details["tool_slug"], "notion");
    }

    #[test]
    fn test_connection_only_required_with_auth() {
        let state = state_from(json!({
            "agent_spec": {
                "name": "X",
                "description": "d",
                "runtime": {},
                "actions": [],
                "tools_required": [
                    {"tool_slug": "gmail", "provider": "pipedream", "auth_required": false},
                    {"tool_slug": "slack", "provider": "pipedream", "auth_required": true}
                ]
            },
            "tool_registry": [{"tool_slug": "gmail"}, {"tool_slug": "slack"}],
            "integrations": {"other": {}}
        }));
        let problems = check_input(&state);
        assert_eq!(codes(&problems), ["MISSING_PIPEDREAM_CONNECTION"]);
        assert_eq!(problems[0].details["tool_slug"], "slack");
    }
}
