use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::config::PipelineMode;
use crate::pipeline::TurnOutcome;
use crate::state::AppState;

pub async fn index() -> impl IntoResponse {
    Html(include_str!("../../../static/index.html"))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

/// One chat turn. Domain-level failures (provider errors, malformed model
/// output) come back as error-shaped payload fields, never as transport
/// failures.
pub async fn process_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Json<Value> {
    match state.config.pipeline_mode {
        PipelineMode::SingleStage => {
            let response = state.orchestrator.answer(&request.query).await;
            Json(json!({ "response": response }))
        }
        PipelineMode::TwoStage => match state.orchestrator.handle_turn(&request.query).await {
            TurnOutcome::Farewell(text) => Json(json!({ "response": text })),
            TurnOutcome::TwoStage(payload) => {
                Json(serde_json::to_value(&payload).unwrap_or(Value::Null))
            }
        },
    }
}
