//! Axum route handlers for the analysis relay.

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::analyze::AnalyzeSubmission;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/analyze
///
/// Accepts a multipart upload (resume file, role_name, job_description,
/// optional company_url), forwards it to the configured webhook, and relays
/// the webhook's response body and content type as-is.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let webhook_url = state
        .config
        .webhook_url
        .clone()
        .ok_or_else(|| AppError::Upstream("ANALYZE_WEBHOOK_URL is not configured".to_string()))?;

    let mut role_name = None;
    let mut job_description = None;
    let mut company_url = None;
    let mut file: Option<(String, Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "role_name" => role_name = Some(read_text(field).await?),
            "job_description" => job_description = Some(read_text(field).await?),
            "company_url" => company_url = Some(read_text(field).await?),
            "resume" => {
                let file_name = field
                    .file_name()
                    .unwrap_or("resume.pdf")
                    .to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read resume: {e}")))?;
                file = Some((file_name, content_type, bytes));
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let submission =
        AnalyzeSubmission::from_parts(role_name, job_description, company_url, file)?;
    info!(
        role = %submission.role_name,
        resume_bytes = submission.file_bytes.len(),
        "relaying analysis upload"
    );

    let upstream = state
        .http
        .post(&webhook_url)
        .multipart(submission.into_form()?)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("webhook request failed: {e}")))?;

    let status = upstream.status().as_u16();
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let body = upstream
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(format!("failed to read webhook response: {e}")))?;

    if status >= 400 {
        warn!(status, "analysis webhook returned an error");
    }

    Response::builder()
        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY))
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build relay response: {e}")))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart field: {e}")))
}
