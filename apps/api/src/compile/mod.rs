//! LaTeX compilation job sandbox.
//!
//! Accepts arbitrary LaTeX text, rejects dangerous constructs, compiles the
//! rest to a PDF in an isolated per-job directory via an external TeX engine,
//! and reclaims all working state on every exit path.

pub mod engine;
pub mod handlers;
pub mod job;
pub mod sweeper;
pub mod validate;

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;

use crate::errors::AppError;
use self::engine::EngineKind;
use self::job::CompileJob;
use self::validate::DenyList;

/// Upper bound on submitted LaTeX source.
pub const MAX_SOURCE_BYTES: usize = 1024 * 1024;

/// Wall-clock budget for a single engine run.
pub const COMPILE_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on captured engine stdout/stderr, per stream.
pub const MAX_ENGINE_OUTPUT: usize = 10 * 1024 * 1024;

/// Diagnostics returned to the caller are cut at this many characters.
pub const MAX_DIAGNOSTIC_CHARS: usize = 5000;

/// Validates and compiles one LaTeX document, returning the PDF bytes.
///
/// Ordering matters: validation and the engine check run before any job
/// directory exists, so rejected requests leave no trace on disk. The job
/// directory is removed when `job` drops, on success and on every error
/// path; the artifact is fully read into memory before that happens.
pub async fn compile_document(
    deny_list: &DenyList,
    engine: Option<EngineKind>,
    scratch_root: &Path,
    source: &str,
) -> Result<Bytes, AppError> {
    let source = deny_list.check(source)?;
    let engine = engine.ok_or(AppError::EngineUnavailable)?;

    let job = CompileJob::begin(scratch_root).await?;
    job.write_source(source).await?;
    engine::compile(&job, engine).await
}
