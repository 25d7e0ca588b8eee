use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures talking to the work item tracking backend.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("work item {id} not found")]
    NotFound { id: u64 },
    #[error("backend returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected backend response: {0}")]
    Decode(String),
}

/// Errors surfaced to HTTP clients as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Remote(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Remote(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Any backend failure as a 500, including a missing work item.
    pub fn remote(err: TrackerError) -> Self {
        ApiError::Remote(format!("error retrieving work items: {err}"))
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            _ => ApiError::remote(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
