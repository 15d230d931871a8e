//! REST API handlers grouped by domain.

pub mod commands;
pub mod events;
pub mod settings;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult = Result<Json<Value>, ApiError>;

/// Standard error response.
pub fn err_json(status: u16, message: &str) -> ApiError {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "status": "error", "error": message })),
    )
}
