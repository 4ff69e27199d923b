//! Route handlers

pub mod categories;
pub mod health;
pub mod tasks;

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use tm_core::Error;

/// JSON error body: a message, plus field-level errors for validation
/// failures
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Map a core error onto its HTTP status and JSON body
pub fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::TaskNotFound(_) | Error::CategoryNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let (message, errors) = match err {
        Error::Validation(errors) => (
            "The given data was invalid.".to_string(),
            Some(errors.into_map()),
        ),
        other => (other.to_string(), None),
    };

    (status, Json(ErrorResponse { message, errors }))
}
