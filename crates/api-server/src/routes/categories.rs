//! Category API endpoints
//!
//! Read-only listing of categories with their derived task counts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use tm_core::category::CategoryWithCount;

use super::{error_response, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub data: Vec<CategoryWithCount>,
}

/// GET /v1/categories - List categories with task counts
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let data = state
        .service()
        .list_categories()
        .await
        .map_err(error_response)?;

    Ok(Json(CategoryListResponse { data }))
}

/// GET /v1/categories/{id} - Get a single category with its task count
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryWithCount>, (StatusCode, Json<ErrorResponse>)> {
    let category = state
        .service()
        .get_category(id)
        .await
        .map_err(error_response)?;

    Ok(Json(category))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/categories", get(list_categories))
        .route("/v1/categories/{id}", get(get_category))
}
