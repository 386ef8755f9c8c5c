//! HTTP surface: `GET /read-mode?url=` and `GET /health`.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use readmode_core::{FailureReason, Pipeline, PipelineError, PipelineOutcome, ReadModeResponse};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
pub struct ReadModeQuery {
    url: Option<String>,
}

pub fn router(pipeline: Pipeline) -> Router {
    let state = AppState { pipeline: Arc::new(pipeline) };
    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]);

    Router::new()
        .route("/read-mode", get(read_mode))
        .route("/health", get(health))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn read_mode(
    State(state): State<AppState>, query: Result<Query<ReadModeQuery>, QueryRejection>,
) -> (StatusCode, Json<ReadModeResponse>) {
    let outcome = match query {
        Ok(Query(ReadModeQuery { url: Some(url) })) => state.pipeline.run(&url).await,
        Ok(Query(ReadModeQuery { url: None })) => {
            PipelineOutcome::Failure(PipelineError::from_reason(FailureReason::InvalidInput))
        }
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "rejected query string");
            PipelineOutcome::Failure(PipelineError::invalid_input("Invalid URL"))
        }
    };

    let status = StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.to_response()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
