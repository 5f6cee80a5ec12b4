//! Per-request job directory lifecycle.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;

pub const SOURCE_FILE: &str = "document.tex";
pub const OUTPUT_FILE: &str = "document.pdf";
pub const LOG_FILE: &str = "document.log";
pub const JOB_DIR_PREFIX: &str = "job-";

/// An ephemeral compilation job owning a uniquely named working directory
/// under the scratch root. The directory exists only for the job's lifetime:
/// dropping the job removes it recursively, on success, failure, timeout,
/// panic and cancelled request futures alike.
pub struct CompileJob {
    id: Uuid,
    dir: PathBuf,
}

impl CompileJob {
    /// Creates the scratch root if absent, then a fresh `job-<uuid>`
    /// directory under it.
    pub async fn begin(scratch_root: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(scratch_root).await?;

        let id = Uuid::new_v4();
        let dir = scratch_root.join(format!("{JOB_DIR_PREFIX}{id}"));
        fs::create_dir(&dir).await?;
        debug!(job_id = %id, dir = %dir.display(), "created job directory");

        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.join(SOURCE_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    /// Writes the validated LaTeX source verbatim as the job's main document.
    pub async fn write_source(&self, source: &str) -> Result<(), AppError> {
        fs::write(self.source_path(), source.as_bytes()).await?;
        Ok(())
    }
}

impl Drop for CompileJob {
    // Cleanup lives in Drop so it runs on every exit path, including panics
    // and dropped request futures. Drop cannot await; the directory holds a
    // handful of small files, so blocking removal is acceptable here.
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(job_id = %self.id, error = %e, "failed to remove job directory");
            }
        }
    }
}
