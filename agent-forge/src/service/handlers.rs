use agent_forge_core::progress::{ErrorLog, ProgressLog};
use agent_forge_core::state::{FileMap, Manifest};
use agent_forge_core::{PipelineInput, Status};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use super::jobs::JobRecord;
use super::{ApiError, AppState, Generation, run_generation};

/// Body of a synchronous generation response
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub pipeline_id: String,
    pub status: Status,
    pub message: String,
    pub manifest: Option<Manifest>,
    pub generated_files: FileMap,
    pub output_directory: Option<String>,
    pub progress_events: ProgressLog,
    pub errors: ErrorLog,
}

impl From<Generation> for GenerateResponse {
    fn from(generation: Generation) -> Self {
        let output = generation.output;
        let message = if output.status == Status::Success {
            "Agent code generated successfully"
        } else {
            "Generation completed with errors"
        };
        Self {
            pipeline_id: output.pipeline_id,
            status: output.status,
            message: message.to_string(),
            manifest: output.manifest,
            generated_files: output.generated_files,
            output_directory: generation.output_directory.map(|dir| dir.display().to_string()),
            progress_events: output.progress_events,
            errors: output.errors,
        }
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        Value::Bool(flag) => *flag,
        Value::Number(_) => true,
    }
}

/// Body must be JSON with a non-empty `agent_spec` that fits the input document
fn parse_request(body: Result<Json<Value>, JsonRejection>) -> Result<PipelineInput, ApiError> {
    let Json(value) = body
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))?;

    if !value.get("agent_spec").is_some_and(is_present) {
        return Err(ApiError::BadRequest("Request body must include 'agent_spec'".to_string()));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Malformed input document: {e}")))
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Agent Forge API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "generate": "POST /generate - Generate agent code from specification",
            "generate_async": "POST /generate/async - Generate agent code asynchronously",
            "job_status": "GET /jobs/{pipeline_id} - Get status of a generation job",
            "jobs": "GET /jobs - List generation jobs",
            "health": "GET /health - Health check"
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now() }))
}

#[tracing::instrument(skip_all, fields(pipeline_id))]
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let input = parse_request(body)?;
    tracing::Span::current().record("pipeline_id", input.pipeline_id.as_str());
    tracing::info!("received generation request");

    let generation = run_generation(&state, input).await?;
    Ok(Json(generation.into()))
}

#[tracing::instrument(skip_all, fields(pipeline_id))]
pub async fn generate_async(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let input = parse_request(body)?;
    let pipeline_id = input.pipeline_id.clone();
    tracing::Span::current().record("pipeline_id", pipeline_id.as_str());

    state.jobs.start(&pipeline_id).await;

    let task_state = state.clone();
    let task_id = pipeline_id.clone();
    tokio::spawn(async move {
        match run_generation(&task_state, input).await {
            Ok(generation) => {
                let output = generation.output;
                let directory = generation.output_directory.as_deref();
                let errors = output.errors.as_slice().to_vec();
                task_state.jobs.complete(&task_id, output.status, directory, errors).await;
            }
            Err(e) => task_state.jobs.fail(&task_id, e.to_string()).await,
        }
    });

    Ok(Json(json!({
        "pipeline_id": pipeline_id,
        "status": "accepted",
        "message": "Generation job started. Use /jobs/{pipeline_id} to check status.",
        "check_status_url": format!("/jobs/{pipeline_id}"),
    })))
}

pub async fn job_status(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .jobs
        .get(&pipeline_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {pipeline_id}")))
}

pub async fn list_jobs(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "jobs": state.jobs.list().await }))
}
