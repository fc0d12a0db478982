//! Task API handlers.

use archiver_core::{processor::url_extension, Task, TaskError, ValidationConfig};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::metrics::{ITEMS_ADDED_TOTAL, TASKS_CREATED_TOTAL};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for adding an item to a task
#[derive(Debug, Deserialize)]
pub struct AddItemBody {
    pub url: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TaskErrorResponse {
    pub error: String,
}

/// Status code plus JSON error body.
pub type ApiError = (StatusCode, Json<TaskErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(TaskErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<TaskError> for TaskErrorResponse {
    fn from(e: TaskError) -> Self {
        let error = match e {
            TaskError::NotFound(_) => "task not found".to_string(),
            other => other.to_string(),
        };
        Self { error }
    }
}

fn task_error(e: TaskError) -> ApiError {
    let status = match e {
        TaskError::NotFound(_) => StatusCode::NOT_FOUND,
        TaskError::TooManyItems(_) | TaskError::TaskFinalized { .. } => StatusCode::CONFLICT,
    };
    (status, Json(TaskErrorResponse::from(e)))
}

/// Check that `raw` is an absolute URL whose path ends in an allowed extension.
pub fn validate_url(raw: &str, rules: &ValidationConfig) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|_| "invalid url".to_string())?;
    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return Err("invalid url".to_string());
    }

    let ext = url_extension(url.as_str()).to_ascii_lowercase();
    if !rules.is_allowed(&ext) {
        return Err(format!("unsupported file type: {}", ext));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new empty task
pub async fn create_task(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Task>) {
    let task = state.store().create();
    TASKS_CREATED_TOTAL.inc();
    info!(task_id = %task.id, "Task created");
    (StatusCode::CREATED, Json(task))
}

/// Get a task by ID
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    state.store().get(&id).map(Json).map_err(task_error)
}

/// Add an item to a task, handing the task to the processor once it is ready
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<AddItemBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = body.map_err(|e| {
        debug!(task_id = %id, error = %e, "Rejected add-item body");
        ITEMS_ADDED_TOTAL.with_label_values(&["invalid"]).inc();
        api_error(StatusCode::BAD_REQUEST, "invalid request")
    })?;

    if let Err(message) = validate_url(&body.url, state.validation()) {
        ITEMS_ADDED_TOTAL.with_label_values(&["invalid"]).inc();
        return Err(api_error(StatusCode::BAD_REQUEST, message));
    }

    let ready = state.store().add_item(&id, &body.url).map_err(|e| {
        ITEMS_ADDED_TOTAL.with_label_values(&["rejected"]).inc();
        task_error(e)
    })?;
    ITEMS_ADDED_TOTAL.with_label_values(&["accepted"]).inc();

    if ready && !state.processor().enqueue(&id) {
        warn!(task_id = %id, "Ready task was not queued and stays pending");
    }

    Ok(StatusCode::NO_CONTENT)
}
