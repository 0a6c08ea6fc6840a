//! HTTP service wrapping the generation pipeline

pub mod handlers;
pub mod jobs;
pub mod routes;

#[cfg(test)]
mod tests;

use agent_forge_core::llm::GeneratorCache;
use agent_forge_core::{ForgeConfig, Pipeline, PipelineError, PipelineInput, PipelineOutput, output};
use axum::Json;
use axum::Router;
use axum::response::{IntoResponse, Response};
use hyper::StatusCode;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use jobs::JobRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub output_dir: PathBuf,
    pub jobs: Arc<JobRegistry>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, output_dir: PathBuf) -> Self {
        Self { pipeline: Arc::new(pipeline), output_dir, jobs: Arc::new(JobRegistry::default()) }
    }

    /// Gemini-backed pipeline; the client is built on first use and shared by all requests
    pub fn from_config(config: &ForgeConfig) -> Self {
        let generator = Arc::new(GeneratorCache::gemini(config.llm.clone()));
        Self::new(Pipeline::from_config(config, generator), config.output.dir.clone())
    }
}

pub fn create_app(state: AppState) -> Router {
    routes::build_router(state)
}

/// Pipeline output plus where it was written
pub struct Generation {
    pub output: PipelineOutput,
    pub output_directory: Option<PathBuf>,
}

/// Run the pipeline and write whatever it produced
pub async fn run_generation(
    state: &AppState,
    input: PipelineInput,
) -> Result<Generation, PipelineError> {
    let output = state.pipeline.execute(input).await;
    let output_directory = if output.generated_files.is_empty() {
        None
    } else {
        let files = &output.generated_files;
        Some(output::write_project(&state.output_dir, &output.pipeline_id, files).await?)
    };
    Ok(Generation { output, output_directory })
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
