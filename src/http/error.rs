//! Translation of service failures into HTTP responses.
//!
//! Every error leaves the API as `{ code, message, details? }` with a status
//! the client can dispatch on; the mapping from `ScheduleError` kinds is
//! fixed so frontends can rely on it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::services::ScheduleError;

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn payload(code: &str, message: impl Into<String>) -> ApiError {
    ApiError {
        code: code.to_string(),
        message: message.into(),
        details: None,
    }
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    /// Anything the service layer reported; see [`ScheduleError`].
    Service(ScheduleError),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::Service(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, payload("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, payload("BAD_REQUEST", msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                payload("INTERNAL_ERROR", msg),
            ),
            AppError::Service(err) => service_response(err),
        };
        (status, Json(body)).into_response()
    }
}

/// Status and code for each service failure kind. Provider trouble is a 502
/// (the upstream misbehaved), storage trouble a 500, bad input a 400.
fn service_response(err: ScheduleError) -> (StatusCode, ApiError) {
    match err {
        ScheduleError::InvalidInput(_) => (
            StatusCode::BAD_REQUEST,
            payload("BAD_REQUEST", err.to_string()),
        ),
        ScheduleError::NotFound(_) => {
            (StatusCode::NOT_FOUND, payload("NOT_FOUND", err.to_string()))
        }
        ScheduleError::MalformedResponse(_) => (
            StatusCode::BAD_GATEWAY,
            payload("MALFORMED_RESPONSE", err.to_string()),
        ),
        ScheduleError::GenerationEmpty => (
            StatusCode::BAD_GATEWAY,
            payload("GENERATION_EMPTY", err.to_string()),
        ),
        ScheduleError::ProviderFailure(_) => (
            StatusCode::BAD_GATEWAY,
            payload("PROVIDER_ERROR", err.to_string()),
        ),
        ScheduleError::PersistenceFailure(source) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError {
                code: "STORAGE_ERROR".to_string(),
                message: "storage operation failed".to_string(),
                details: Some(source.to_string()),
            },
        ),
    }
}
