//! Axum route handlers for LaTeX compilation.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::compile::compile_document;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    pub latex: String,
}

/// POST /render (alias: /api/compile-latex)
///
/// Compiles the submitted LaTeX source and returns the PDF inline.
pub async fn handle_compile(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> Result<Response, AppError> {
    if request.latex.trim().is_empty() {
        return Err(AppError::Validation("LaTeX code is required".to_string()));
    }

    info!(bytes = request.latex.len(), "received LaTeX compilation request");

    let pdf = compile_document(
        &state.deny_list,
        state.engine,
        &state.config.scratch_root,
        &request.latex,
    )
    .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"resume.pdf\""),
        ],
        pdf,
    )
        .into_response())
}
