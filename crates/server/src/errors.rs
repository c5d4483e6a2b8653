use axum::{http::StatusCode, response::IntoResponse, Json};
use interview_report::RenderError;
use serde_json::json;
use thiserror::Error;

/// Message returned for any body that is not a non-empty JSON object.
pub const NO_JSON_MESSAGE: &str = "No JSON data provided";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", NO_JSON_MESSAGE)]
    NoJson,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::NoJson => StatusCode::BAD_REQUEST,
            ApiError::Render(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "Report generation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
