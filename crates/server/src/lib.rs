//! HTTP surface for the interview report renderer.

pub mod errors;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use interview_report::{DocumentRenderer, ReportRequest};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    pub fn new(renderer: impl DocumentRenderer + 'static) -> Self {
        Self {
            renderer: Arc::new(renderer),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/generate-pdf", post(generate_pdf))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn generate_pdf(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request = parse_request(&body)?;
    info!(interview_id = %request.interview_id, "Generating report");

    let renderer = Arc::clone(&state.renderer);
    let document = tokio::task::spawn_blocking(move || renderer.render(&request))
        .await
        .map_err(|err| ApiError::Internal(format!("render task failed: {}", err)))??;

    let disposition =
        HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", document.filename).as_bytes())
            .map_err(|err| ApiError::Internal(format!("invalid download filename: {}", err)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// Accepts only a non-empty JSON object; any other body is treated as missing.
fn parse_request(body: &[u8]) -> Result<ReportRequest, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) if !fields.is_empty() => {
            serde_json::from_value(Value::Object(fields)).map_err(|_| ApiError::NoJson)
        }
        _ => Err(ApiError::NoJson),
    }
}
