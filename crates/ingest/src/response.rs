//! HTTP response helpers

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Success response body
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub status: &'static str,
}

pub fn ok_response() -> Response {
    (StatusCode::OK, Json(OkResponse { status: "ok" })).into_response()
}

pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}
