//! Relay for the external AI-analysis webhook.
//!
//! The webhook (an n8n workflow) receives the uploaded resume plus job
//! metadata and answers with either a JSON analysis payload or a PDF. This
//! module forwards the form and passes the response through untouched; the
//! webhook's internals are not this service's concern.

pub mod handlers;

use bytes::Bytes;

use crate::errors::AppError;

/// A parsed and validated analysis upload.
#[derive(Debug)]
pub struct AnalyzeSubmission {
    pub role_name: String,
    pub job_description: String,
    pub company_url: Option<String>,
    pub file_name: String,
    pub file_content_type: Option<String>,
    pub file_bytes: Bytes,
}

impl AnalyzeSubmission {
    /// Assembles a submission from the collected multipart fields, rejecting
    /// incomplete uploads.
    pub fn from_parts(
        role_name: Option<String>,
        job_description: Option<String>,
        company_url: Option<String>,
        file: Option<(String, Option<String>, Bytes)>,
    ) -> Result<Self, AppError> {
        let role_name = role_name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("role_name is required".to_string()))?;
        let job_description = job_description
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("job_description is required".to_string()))?;
        let (file_name, file_content_type, file_bytes) = file
            .ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;

        Ok(Self {
            role_name,
            job_description,
            company_url: company_url.filter(|s| !s.trim().is_empty()),
            file_name,
            file_content_type,
            file_bytes,
        })
    }

    /// Rebuilds the upload as an outbound multipart form, field names as the
    /// webhook expects them.
    pub fn into_form(self) -> Result<reqwest::multipart::Form, AppError> {
        let mut part = reqwest::multipart::Part::bytes(self.file_bytes.to_vec())
            .file_name(self.file_name);
        if let Some(content_type) = &self.file_content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::Validation(format!("invalid resume content type: {e}")))?;
        }

        let mut form = reqwest::multipart::Form::new()
            .text("role_name", self.role_name)
            .text("job_description", self.job_description)
            .part("resume", part);
        if let Some(url) = self.company_url {
            form = form.text("company_url", url);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> Option<(String, Option<String>, Bytes)> {
        Some((
            "resume.pdf".to_string(),
            Some("application/pdf".to_string()),
            Bytes::from_static(b"%PDF-1.5"),
        ))
    }

    #[test]
    fn test_complete_submission_is_accepted() {
        let s = AnalyzeSubmission::from_parts(
            Some("Backend Engineer".to_string()),
            Some("Builds backends".to_string()),
            Some("https://example.com".to_string()),
            file(),
        )
        .unwrap();
        assert_eq!(s.role_name, "Backend Engineer");
        assert_eq!(s.company_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_missing_role_name_is_rejected() {
        let result = AnalyzeSubmission::from_parts(
            None,
            Some("Builds backends".to_string()),
            None,
            file(),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_job_description_is_rejected() {
        let result = AnalyzeSubmission::from_parts(
            Some("Backend Engineer".to_string()),
            Some("   ".to_string()),
            None,
            file(),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let result = AnalyzeSubmission::from_parts(
            Some("Backend Engineer".to_string()),
            Some("Builds backends".to_string()),
            None,
            None,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_company_url_is_dropped() {
        let s = AnalyzeSubmission::from_parts(
            Some("Backend Engineer".to_string()),
            Some("Builds backends".to_string()),
            Some("".to_string()),
            file(),
        )
        .unwrap();
        assert!(s.company_url.is_none());
    }

    #[test]
    fn test_bad_content_type_fails_form_build() {
        let s = AnalyzeSubmission::from_parts(
            Some("Backend Engineer".to_string()),
            Some("Builds backends".to_string()),
            None,
            Some(("resume.pdf".to_string(), Some("not a mime".to_string()), Bytes::new())),
        )
        .unwrap();
        assert!(matches!(s.into_form(), Err(AppError::Validation(_))));
    }
}
