//! Task API endpoints
//!
//! RESTful /v1 surface for listing, creating, fetching and deleting
//! tasks.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tm_core::error::ValidationErrors;
use tm_core::task::{
    CreateTaskInput, DueFilter, TaskFilter, TaskPage, TaskStatus, TaskWithCategory,
    DEFAULT_PER_PAGE,
};
use tm_core::Error;

use super::{error_response, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Query parameters for GET /v1/tasks
///
/// Everything arrives as an optional raw string; clients send empty
/// values for cleared filters, which mean "no constraint".
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

fn trim_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl ListTasksQuery {
    /// Convert raw query params into a TaskFilter.
    ///
    /// Unknown `due` values are no constraint; malformed `status` or
    /// `category_id` values fail validation instead of silently matching
    /// nothing.
    fn into_filter(self) -> Result<TaskFilter, Error> {
        let mut errors = ValidationErrors::new();
        let mut filter = TaskFilter::new();

        if let Some(raw) = trim_to_none(self.status.as_deref()) {
            match TaskStatus::parse(raw) {
                Some(status) => filter = filter.with_status(status),
                None => errors.add("status", "The selected status is invalid."),
            }
        }

        if let Some(raw) = trim_to_none(self.category_id.as_deref()) {
            match raw.parse::<Uuid>() {
                Ok(id) => filter = filter.with_category(id),
                Err(_) => errors.add("category_id", "The category id is invalid."),
            }
        }

        if let Some(raw) = trim_to_none(self.search.as_deref()) {
            filter = filter.with_search(raw);
        }

        if let Some(raw) = trim_to_none(self.due.as_deref()) {
            if let Some(due) = DueFilter::parse(raw) {
                filter = filter.with_due(due);
            }
        }

        // Anything unparseable falls back to the first page
        let page = trim_to_none(self.page.as_deref())
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        filter = filter.with_page(page);

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(Error::Validation(errors))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/tasks - List tasks with filters and pagination
async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<TaskPage>, (StatusCode, Json<ErrorResponse>)> {
    let filter = query.into_filter().map_err(error_response)?;

    let page = state
        .service()
        .get_tasks(&filter, DEFAULT_PER_PAGE)
        .await
        .map_err(error_response)?;

    Ok(Json(page))
}

/// POST /v1/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<CreateTaskInput>,
) -> Result<(StatusCode, Json<TaskWithCategory>), (StatusCode, Json<ErrorResponse>)> {
    let created = state
        .service()
        .create_task(input)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskWithCategory>, (StatusCode, Json<ErrorResponse>)> {
    let task = state
        .service()
        .find_task(id)
        .await
        .map_err(error_response)?;

    Ok(Json(task))
}

/// DELETE /v1/tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .service()
        .delete_task(id)
        .await
        .map_err(error_response)?;

    Ok(Json(DeleteResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/tasks", get(list_tasks).post(create_task))
        .route("/v1/tasks/{id}", get(get_task).delete(delete_task))
}
