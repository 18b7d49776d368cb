use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::engine::EngineError;

/// Client-facing error: a status plus `{"error": kind, "detail": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub detail: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", detail)
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", detail)
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let detail = e.to_string();
        match e {
            EngineError::Validation(_) => Self::bad_request(detail),
            EngineError::InvalidInterval => Self::new(StatusCode::BAD_REQUEST, "invalid_interval", detail),
            EngineError::DuplicateName(_) => Self::new(StatusCode::BAD_REQUEST, "duplicate_name", detail),
            EngineError::UnknownTable(_) => Self::new(StatusCode::BAD_REQUEST, "unknown_table", detail),
            EngineError::SchedulingConflict { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "scheduling_conflict", detail)
            }
            EngineError::LimitExceeded(_) => Self::new(StatusCode::BAD_REQUEST, "limit_exceeded", detail),
            EngineError::Storage(_) => {
                tracing::error!(error = %detail, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "internal storage error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.kind, "detail": self.detail }));
        (self.status, body).into_response()
    }
}
