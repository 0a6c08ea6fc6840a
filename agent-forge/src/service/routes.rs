use axum::Router;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use hyper::StatusCode;
use tower_http::cors::{Any, CorsLayer};

use super::AppState;
use super::handlers;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/generate", post(handlers::generate))
        .route("/generate/async", post(handlers::generate_async))
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/{pipeline_id}", get(handlers::job_status))
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
}

async fn not_found(req: axum::extract::Request) -> impl IntoResponse {
    tracing::warn!("unhandled path: {}", req.uri());
    (StatusCode::NOT_FOUND, "Not Found")
}
