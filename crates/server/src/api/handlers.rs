use archiver_core::ProcessorStatus;
use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Processor status plus the number of non-terminal tasks.
#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub processor: ProcessorStatus,
    pub active_tasks: usize,
}

pub async fn root() -> &'static str {
    "file-archiver: service is up"
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        processor: state.processor().status(),
        active_tasks: state.store().active_count(),
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
