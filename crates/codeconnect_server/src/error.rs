//! Maps lifecycle failures onto the HTTP error contract.
//!
//! Every error body is `{ "error": <message> }`. Unexpected failures are
//! logged here and answered with a fixed message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use codeconnect_core::{ServiceError, ServiceErrorKind};
use log::{error, warn};
use serde::Serialize;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn unauthorized() -> ApiError {
    error_response(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
}

pub fn internal(details: &str) -> ApiError {
    error!("event=request_failed module=server status=error details={details}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}

pub fn map_service_error(err: ServiceError) -> ApiError {
    match err.kind() {
        ServiceErrorKind::Unauthenticated => unauthorized(),
        ServiceErrorKind::Validation => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        ServiceErrorKind::NotFound => error_response(StatusCode::NOT_FOUND, err.to_string()),
        ServiceErrorKind::Unexpected => internal(&err.to_string()),
    }
}

/// Unreadable request bodies are a client error, never a 500.
pub fn map_json_rejection(rejection: JsonRejection) -> ApiError {
    warn!(
        "event=body_reject module=server status=error reason={}",
        rejection.body_text().replace(['\n', '\r'], " ")
    );
    error_response(StatusCode::BAD_REQUEST, "Invalid request body")
}
