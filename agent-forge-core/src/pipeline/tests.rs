use super::stages::{GenerateFiles, PackageOutput, PlanProject, ValidateInput};
use super::*;
use crate::layout::{CRITICAL_FILES, PLANNED_FILES, TEST_FILE};
use crate::llm::mock::ScriptedGenerator;
use crate::llm::{LLMError, TextGenerator};
use crate::state::{PipelineInput, Status};
use crate::testing;
use serde_json::json;

fn deps_for(generator: &ScriptedGenerator) -> PipelineDeps {
    PipelineDeps::new(Arc::new(GeneratorCache::with_generator(Arc::new(generator.clone()))))
}

fn pipeline(generator: &ScriptedGenerator, retry: RetryPolicy) -> Pipeline {
    Pipeline::new(deps_for(generator), retry)
}

fn input(value: serde_json::Value) -> PipelineInput {
    serde_json::from_value(value).unwrap()
}

fn assert_error_implies_error_status(state: &PipelineState) {
    if !state.errors.is_empty() {
        assert_eq!(state.status(), crate::state::Status::Error);
    }
}

#[tokio::test]
async fn test_clean_run_succeeds() {
    let generator = ScriptedGenerator::new();
    let state = pipeline(&generator, RetryPolicy::Never).run(testing::valid_input()).await;

    assert!(state.errors.is_empty(), "unexpected errors: {:?}", state.errors);
    assert_eq!(state.status(), Status::Success);
    assert!(state.validation_passed());

    for path in &state.files_to_generate {
        assert!(state.has_file(path), "{path} missing");
    }
    for path in ["setup.sh", "setup.py", "run.sh", TEST_FILE] {
        assert!(state.has_file(path), "{path} missing");
    }

    let manifest = state.manifest.as_ref().unwrap();
    assert_eq!(manifest.files.len(), state.generated_files().len());
    assert_eq!(generator.call_count(), 8);

    let stages: Vec<&str> = state.progress.events().iter().map(|e| e.stage.as_str()).collect();
    let first_of = |name: &str| stages.iter().position(|s| *s == name).unwrap();
    assert!(
        StageId::ALL
            .windows(2)
            .all(|pair| first_of(pair[0].as_str()) < first_of(pair[1].as_str()))
    );
    assert_eq!(stages.last(), Some(&"DONE"));
}

#[tokio::test]
async fn test_pipedream_connection_scenario() {
    let generator = ScriptedGenerator::new();
    let state = pipeline(&generator, RetryPolicy::Never)
        .run(input(json!({
            "pipeline_id": "t1",
            "agent_spec": {
                "name": "X",
                "description": "d",
                "runtime": {},
                "tools_required": [
                    {"tool_slug": "gmail", "provider": "pipedream", "auth_required": true}
                ],
                "actions": [{"name": "a1", "tool_slug": "gmail"}]
            },
            "tool_registry": [{"tool_slug": "gmail"}],
            "integrations": {"pipedream": {"external_user_ids": {}}}
        })))
        .await;

    let connection =
        state.errors.iter().find(|e| e.code == "MISSING_PIPEDREAM_CONNECTION").unwrap();
    assert_eq!(connection.details["tool_slug"], "gmail");
    assert!(!state.validation_passed());
    assert_eq!(state.status(), Status::Error);

    // Later stages still ran
    assert!(state.progress.for_stage(StageId::PackagingOutput.as_str()).next().is_some());
    assert!(state.manifest.is_some());
    assert_eq!(state.errors.len(), 1);
}

#[tokio::test]
async fn test_missing_actions_is_recorded_not_raised() {
    let mut value = serde_json::to_value(testing::valid_input()).unwrap();
    value["agent_spec"].as_object_mut().unwrap().remove("actions");

    let state = ValidateInput.execute(PipelineState::new(input(value))).await;
    assert!(state.errors.has_code("MISSING_FIELD_ACTIONS"));
    assert!(!state.validation_passed());
}

#[tokio::test]
async fn test_tool_cross_reference() {
    let state = ValidateInput
        .execute(PipelineState::new(input(json!({
            "agent_spec": {"name": "X", "description": "d", "runtime": {}, "actions": [],
                           "tools_required": [{"tool_slug": "gmail"}]},
            "tool_registry": [{"tool_slug": "slack"}],
            "integrations": {"pipedream": {}}
        }))))
        .await;

    let record = state.errors.iter().find(|e| e.code == "TOOL_NOT_IN_REGISTRY").unwrap();
    assert_eq!(record.details["tool_slug"], "gmail");
}

#[tokio::test]
async fn test_planning_ignores_agent_spec() {
    let first = PlanProject.execute(PipelineState::new(testing::valid_input())).await;
    let second = PlanProject
        .execute(PipelineState::new(input(json!({
            "agent_spec": {
                "name": "Other",
                "tools_required": [{"tool_slug": "slack"}, {"tool_slug": "notion"}]
            }
        }))))
        .await;

    assert_eq!(first.files_to_generate, second.files_to_generate);
    assert_eq!(first.files_to_generate, PLANNED_FILES);
}

#[tokio::test]
async fn test_generation_never_removes_files() {
    let generator = ScriptedGenerator::new().fail("agent.py", "boom");
    let stage = GenerateFiles::new(deps_for(&generator));

    let mut state = PlanProject.execute(PipelineState::new(testing::valid_input())).await;
    state.put_file("notes/custom.md", "keep me");
    state.put_file("agent.py", "previous = True");
    let before: Vec<String> = state.generated_files().keys().cloned().collect();

    let state = stage.execute(state).await;
    for path in &before {
        assert!(state.has_file(path), "{path} was removed");
    }
    assert_eq!(state.generated_files()["agent.py"], "previous = True");

    let failure = state.errors.iter().find(|e| e.code == "GENERATION_FAILED").unwrap();
    assert_eq!(failure.details["file"], "agent.py");
    assert_eq!(failure.details["error_type"], "ApiError");
    assert_eq!(failure.details["retryable"], true);
}

#[tokio::test]
async fn test_generation_timeout_is_recorded() {
    let generator = ScriptedGenerator::new().with_delay(std::time::Duration::from_millis(200));
    let deps = deps_for(&generator).with_timeout(std::time::Duration::from_millis(10));

    let mut state = PipelineState::new(testing::valid_input());
    state.files_to_generate = vec!["README.md".to_string()];
    let state = GenerateFiles::new(deps).execute(state).await;

    let failure = state.errors.iter().find(|e| e.code == "GENERATION_FAILED").unwrap();
    assert_eq!(failure.details["error_type"], "Timeout");
    assert!(!state.has_file("README.md"));
}

#[tokio::test]
async fn test_init_failure_stops_generation_only() {
    let cache = GeneratorCache::new(Arc::new(|| -> crate::llm::Result<Arc<dyn TextGenerator>> {
        Err(LLMError::auth("GOOGLE_API_KEY is not set"))
    }));
    let pipeline = Pipeline::new(PipelineDeps::new(Arc::new(cache)), RetryPolicy::Never);

    let state = pipeline.run(testing::valid_input()).await;

    let init = state.errors.iter().find(|e| e.code == "GENERATION_INIT_FAILED").unwrap();
    assert_eq!(init.details["error_type"], "AuthenticationError");
    assert!(!state.has_file("__init__.py"));
    assert!(state.has_file(TEST_FILE));
    assert!(state.errors.has_code("MISSING_CRITICAL_FILES"));
    assert!(state.manifest.is_none());
    assert_eq!(state.status(), Status::Error);
}

#[tokio::test]
async fn test_missing_critical_file_blocks_packaging() {
    let mut state = PipelineState::new(testing::valid_input());
    for (path, content) in testing::clean_project() {
        if path != "tools/pipedream_client.py" {
            state.put_file(path, content);
        }
    }

    let state = PackageOutput.execute(state).await;
    let records: Vec<_> =
        state.errors.iter().filter(|e| e.code == "MISSING_CRITICAL_FILES").collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].details["missing_files"], json!(["tools/pipedream_client.py"]));
    assert_eq!(state.status(), Status::Error);
    assert!(state.manifest.is_none());
    assert!(CRITICAL_FILES.contains(&"tools/pipedream_client.py"));
}

#[tokio::test]
async fn test_failed_sanity_is_not_retried_by_default() {
    let generator = ScriptedGenerator::new().respond("agent.py", "def broken(:\n    pass\n");
    let state = pipeline(&generator, RetryPolicy::Never).run(testing::valid_input()).await;

    assert!(state.errors.has_code("SYNTAX_ERROR"));
    assert_eq!(state.status(), Status::Error);
    let agent_calls = generator.calls().iter().filter(|(path, _)| path == "agent.py").count();
    assert_eq!(agent_calls, 1);
    assert_error_implies_error_status(&state);
}

#[tokio::test]
async fn test_retry_once_regenerates_a_single_time() {
    let generator = ScriptedGenerator::new().respond("agent.py", "def broken(:\n    pass\n");
    let state = pipeline(&generator, RetryPolicy::Once).run(testing::valid_input()).await;

    let agent_calls = generator.calls().iter().filter(|(path, _)| path == "agent.py").count();
    assert_eq!(agent_calls, 2);
    assert_eq!(state.progress.for_stage(StageId::RunningSanityChecks.as_str()).count(), 4);
    assert_eq!(state.status(), Status::Error);
    assert_error_implies_error_status(&state);
}

#[tokio::test]
async fn test_retry_once_skips_clean_runs() {
    let generator = ScriptedGenerator::new();
    let state = pipeline(&generator, RetryPolicy::Once).run(testing::valid_input()).await;

    assert_eq!(state.status(), Status::Success);
    assert_eq!(generator.call_count(), 8);
}

#[test]
fn test_retry_policy_serde() {
    assert_eq!(RetryPolicy::default(), RetryPolicy::Never);
    assert_eq!(serde_json::to_value(RetryPolicy::Once).unwrap(), "once");
    assert_eq!(StageId::RunningSanityChecks.to_string(), "RUNNING_SANITY_CHECKS");
}
