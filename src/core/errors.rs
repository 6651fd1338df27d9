use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the HTTP shell itself.
///
/// Domain-level problems (provider failures, malformed model output) never
/// become an `ApiError`; they are folded into the response payload so the
/// caller always receives a well-formed turn.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Failures inside the retrieval-and-orchestration pipeline.
///
/// `Provider` covers embedding, similarity-search, LLM and web-search calls
/// (timeouts included). `MalformedManagerOutput` carries the raw text the
/// Manager stage emitted when it could not be parsed. `SearchUnavailable`
/// marks a missing search credential and aborts only the search step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("malformed manager output: {raw}")]
    MalformedManagerOutput { raw: String },
    #[error("web search unavailable: {0}")]
    SearchUnavailable(String),
}

impl PipelineError {
    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Provider(err.to_string())
    }
}
