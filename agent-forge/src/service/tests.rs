use super::*;
use agent_forge_core::llm::{LLMError, TextGenerator};
use agent_forge_core::{PipelineDeps, RetryPolicy};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, header};
use http_body_util::BodyExt;
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct UnavailableGenerator;

#[async_trait]
impl TextGenerator for UnavailableGenerator {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn generate(
        &self,
        _file_path: &str,
        _prompt: &str,
    ) -> agent_forge_core::llm::Result<String> {
        Err(LLMError::api(503, "model overloaded"))
    }
}

fn test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(GeneratorCache::with_generator(Arc::new(UnavailableGenerator)));
    let pipeline = Pipeline::new(PipelineDeps::new(generator), RetryPolicy::Never);
    (create_app(AppState::new(pipeline, dir.path().to_path_buf())), dir)
}

fn request_body(pipeline_id: &str) -> Value {
    json!({
        "pipeline_id": pipeline_id,
        "agent_spec": {
            "name": "Mail Helper",
            "description": "Reads and sends mail",
            "runtime": {"model": "gemini-2.0-flash"},
            "tools_required": [
                {"tool_slug": "gmail", "provider": "pipedream", "auth_required": true}
            ],
            "actions": [{"name": "send_email", "tool_slug": "gmail"}]
        },
        "tool_registry": [{"tool_slug": "gmail"}],
        "integrations": {"pipedream": {"external_user_ids": {"gmail": "user-1"}}}
    })
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["endpoints"]["generate"].is_string());
}

#[tokio::test]
async fn test_generate_requires_agent_spec() {
    let (app, _dir) = test_app();

    let body = json!({"pipeline_id": "p"}).to_string();
    let (status, body) = send(&app, post("/generate", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Request body must include 'agent_spec'");

    let (status, _) = send(&app, post("/generate", json!({"agent_spec": {}}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_rejects_invalid_json() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, post("/generate", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_generate_reports_llm_failures() {
    let (app, dir) = test_app();
    let (status, body) = send(&app, post("/generate", request_body("p-sync").to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pipeline_id"], "p-sync");
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Generation completed with errors");

    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["code"] == "GENERATION_FAILED"));
    assert!(errors.iter().any(|e| e["code"] == "MISSING_CRITICAL_FILES"));
    assert!(body["manifest"].is_null());

    // Boilerplate is still written
    assert!(body["generated_files"]["__init__.py"].is_string());
    assert!(dir.path().join("p-sync").join("__init__.py").exists());
    assert!(body["output_directory"].as_str().unwrap().ends_with("p-sync"));
}

#[tokio::test]
async fn test_async_job_flow() {
    let (app, _dir) = test_app();
    let request = post("/generate/async", request_body("p-async").to_string());
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["check_status_url"], "/jobs/p-async");

    let mut job = Value::Null;
    for _ in 0..100 {
        let (status, body) = send(&app, get("/jobs/p-async")).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] != "pending" {
            job = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(job["status"], "error");
    assert!(job["completed_at"].is_string());
    assert!(job["errors"].as_array().unwrap().iter().any(|e| e["code"] == "GENERATION_FAILED"));

    let (_, listing) = send(&app, get("/jobs")).await;
    let jobs = listing["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["pipeline_id"], "p-async");
}

#[tokio::test]
async fn test_async_rejects_before_starting_a_job() {
    let (app, _dir) = test_app();
    let body = json!({"pipeline_id": "x"}).to_string();
    let (status, _) = send(&app, post("/generate/async", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listing) = send(&app, get("/jobs")).await;
    assert!(listing["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_job() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, get("/jobs/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Job not found: nope");
}

#[tokio::test]
async fn test_fallback_is_not_found() {
    let (app, _dir) = test_app();
    let (status, _) = send(&app, get("/does/not/exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
