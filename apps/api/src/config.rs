use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; the service starts with an empty environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Root directory under which per-job working directories are created.
    pub scratch_root: PathBuf,
    /// n8n-style webhook receiving resume uploads for AI analysis.
    /// Optional: the /api/analyze endpoint rejects requests when unset.
    pub webhook_url: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            scratch_root: std::env::var("SCRATCH_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("texforge-jobs")),
            webhook_url: std::env::var("ANALYZE_WEBHOOK_URL").ok(),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
