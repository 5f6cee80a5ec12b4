use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No TeX engine available")]
    EngineUnavailable,

    #[error("Compilation timed out after {}s", .0.as_secs())]
    Timeout(std::time::Duration),

    #[error("Engine output exceeded {0} bytes")]
    ResourceExceeded(usize),

    #[error("LaTeX compilation failed")]
    Compilation { details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::EngineUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "No TeX engine (tectonic or pdflatex) is installed on the server"
                }),
            ),
            AppError::Timeout(limit) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": format!("LaTeX compilation timed out after {}s", limit.as_secs())
                }),
            ),
            AppError::ResourceExceeded(cap) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("Engine output exceeded the {cap} byte limit") }),
            ),
            AppError::Compilation { details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "LaTeX compilation failed",
                    "details": details,
                    "hint": "Check your LaTeX syntax. Common issues: missing packages, syntax errors, or invalid commands."
                }),
            ),
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An internal I/O error occurred" }),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Analysis service request failed" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
