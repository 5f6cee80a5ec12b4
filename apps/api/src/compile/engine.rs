//! TeX engine detection and bounded subprocess invocation.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::compile::job::{CompileJob, SOURCE_FILE};
use crate::compile::{COMPILE_TIMEOUT, MAX_DIAGNOSTIC_CHARS, MAX_ENGINE_OUTPUT};
use crate::errors::AppError;

/// The TeX engines this service knows how to drive. One strategy, selected
/// per request from the engine detected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Tectonic,
    Pdflatex,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Tectonic => "tectonic",
            EngineKind::Pdflatex => "pdflatex",
        }
    }

    /// Engine-specific arguments, applied before the source file name.
    /// Tectonic is single-pass and locked down by default. pdflatex runs
    /// non-interactively, halts on the first error, and has shell-escape
    /// explicitly disabled.
    fn args(self) -> &'static [&'static str] {
        match self {
            EngineKind::Tectonic => &[],
            EngineKind::Pdflatex => &[
                "-interaction=nonstopmode",
                "-halt-on-error",
                "-no-shell-escape",
            ],
        }
    }
}

/// Probes for an available TeX engine, preferring the sandboxed one.
/// Called once at startup; the result is cached in `AppState`.
pub async fn detect_engine() -> Option<EngineKind> {
    for kind in [EngineKind::Tectonic, EngineKind::Pdflatex] {
        let probe = Command::new(kind.as_str())
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if matches!(probe, Ok(status) if status.success()) {
            info!(engine = kind.as_str(), "detected TeX engine");
            return Some(kind);
        }
    }
    warn!("no TeX engine found on PATH (tried tectonic, pdflatex)");
    None
}

/// Runs the engine in the job's directory and extracts the result.
pub async fn compile(job: &CompileJob, kind: EngineKind) -> Result<Bytes, AppError> {
    let mut cmd = Command::new(kind.as_str());
    cmd.args(kind.args())
        .arg(SOURCE_FILE)
        .current_dir(job.dir());

    debug!(job_id = %job.id(), engine = kind.as_str(), "starting engine");
    let run = run_bounded(cmd, COMPILE_TIMEOUT, MAX_ENGINE_OUTPUT).await?;
    debug!(job_id = %job.id(), status = ?run.status, "engine exited");

    collect_artifact(job, run).await
}

pub(crate) struct EngineRun {
    pub status: ExitStatus,
    /// Combined stdout + stderr, lossily decoded.
    pub output: String,
}

enum DrainError {
    Overflow,
    Io(std::io::Error),
}

/// Spawns `cmd` with stdin closed, captures stdout and stderr concurrently
/// with a per-stream size cap, and enforces a wall-clock timeout. The child
/// is killed on timeout and on cap overflow; no exit path leaves it running.
pub(crate) async fn run_bounded(
    mut cmd: Command,
    timeout: Duration,
    output_cap: usize,
) -> Result<EngineRun, AppError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take().expect("stdout is piped");
    let stderr = child.stderr.take().expect("stderr is piped");

    let bounded = tokio::time::timeout(timeout, async {
        // Both streams drain concurrently; reading them one after the other
        // can deadlock once a pipe buffer fills.
        let (out, err) = tokio::try_join!(
            drain_capped(stdout, output_cap),
            drain_capped(stderr, output_cap),
        )?;
        let status = child.wait().await.map_err(DrainError::Io)?;
        Ok::<_, DrainError>((out, err, status))
    })
    .await;

    match bounded {
        Err(_elapsed) => {
            warn!(timeout_s = timeout.as_secs(), "engine hit wall-clock limit, killing");
            kill(&mut child).await;
            Err(AppError::Timeout(timeout))
        }
        Ok(Err(DrainError::Overflow)) => {
            warn!(cap = output_cap, "engine output exceeded cap, killing");
            kill(&mut child).await;
            Err(AppError::ResourceExceeded(output_cap))
        }
        Ok(Err(DrainError::Io(e))) => {
            kill(&mut child).await;
            Err(AppError::Io(e))
        }
        Ok(Ok((out, err, status))) => {
            let mut output = String::from_utf8_lossy(&out).into_owned();
            output.push_str(&String::from_utf8_lossy(&err));
            Ok(EngineRun { status, output })
        }
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill engine subprocess");
    }
}

async fn drain_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    cap: usize,
) -> Result<Vec<u8>, DrainError> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await.map_err(DrainError::Io)?;
        if n == 0 {
            return Ok(buf);
        }
        if buf.len() + n > cap {
            return Err(DrainError::Overflow);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Reads the PDF artifact into memory, or assembles a bounded diagnostic.
///
/// Success is decided by the presence of the output PDF, not the exit
/// status: pdflatex can exit nonzero after producing a usable document.
/// Tectonic writes its diagnostics to stderr rather than a log file, so the
/// captured output is the fallback.
async fn collect_artifact(job: &CompileJob, run: EngineRun) -> Result<Bytes, AppError> {
    match tokio::fs::read(job.output_path()).await {
        Ok(pdf) => {
            info!(job_id = %job.id(), bytes = pdf.len(), "compilation succeeded");
            Ok(Bytes::from(pdf))
        }
        Err(_) => {
            let diagnostic = match tokio::fs::read_to_string(job.log_path()).await {
                Ok(log) if !log.trim().is_empty() => log,
                _ => run.output,
            };
            Err(AppError::Compilation {
                details: truncate_diagnostic(&diagnostic, MAX_DIAGNOSTIC_CHARS),
            })
        }
    }
}

/// Cuts a diagnostic at `max_chars` characters, appending a marker when cut.
fn truncate_diagnostic(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\n[diagnostic truncated]", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::job::CompileJob;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_pdflatex_args_disable_shell_escape() {
        let args = EngineKind::Pdflatex.args();
        assert!(args.contains(&"-no-shell-escape"));
        assert!(args.contains(&"-halt-on-error"));
        assert!(args.contains(&"-interaction=nonstopmode"));
    }

    #[test]
    fn test_tectonic_uses_default_invocation() {
        assert!(EngineKind::Tectonic.args().is_empty());
    }

    #[tokio::test]
    async fn test_run_bounded_captures_both_streams() {
        let run = run_bounded(
            sh("echo to-stdout; echo to-stderr 1>&2"),
            Duration::from_secs(5),
            64 * 1024,
        )
        .await
        .unwrap();

        assert!(run.status.success());
        assert!(run.output.contains("to-stdout"));
        assert!(run.output.contains("to-stderr"));
    }

    #[tokio::test]
    async fn test_run_bounded_kills_on_timeout() {
        let started = Instant::now();
        let result = run_bounded(sh("sleep 30"), Duration::from_millis(250), 64 * 1024).await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
        // Killed within a bounded margin of the timeout, not after 30s.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_bounded_enforces_output_cap() {
        let result = run_bounded(
            sh("head -c 1000000 /dev/zero"),
            Duration::from_secs(10),
            64 * 1024,
        )
        .await;

        assert!(matches!(result, Err(AppError::ResourceExceeded(_))));
    }

    #[tokio::test]
    async fn test_run_bounded_reports_spawn_failure_as_io() {
        let cmd = Command::new("definitely-not-a-real-binary-texforge");
        let result = run_bounded(cmd, Duration::from_secs(1), 1024).await;

        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_collect_artifact_reads_pdf() {
        let root = tempfile::tempdir().unwrap();
        let job = CompileJob::begin(root.path()).await.unwrap();
        std::fs::write(job.output_path(), b"%PDF-1.5 fake").unwrap();

        let run = run_bounded(sh("true"), Duration::from_secs(5), 1024).await.unwrap();
        let pdf = collect_artifact(&job, run).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_collect_artifact_prefers_log_file_diagnostic() {
        let root = tempfile::tempdir().unwrap();
        let job = CompileJob::begin(root.path()).await.unwrap();
        std::fs::write(job.log_path(), "! Undefined control sequence.").unwrap();

        let run = run_bounded(sh("echo engine-output"), Duration::from_secs(5), 1024)
            .await
            .unwrap();
        match collect_artifact(&job, run).await {
            Err(AppError::Compilation { details }) => {
                assert!(details.contains("Undefined control sequence"));
            }
            other => panic!("expected Compilation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_collect_artifact_falls_back_to_captured_output() {
        let root = tempfile::tempdir().unwrap();
        let job = CompileJob::begin(root.path()).await.unwrap();

        let run = run_bounded(sh("echo engine-said-this 1>&2"), Duration::from_secs(5), 1024)
            .await
            .unwrap();
        match collect_artifact(&job, run).await {
            Err(AppError::Compilation { details }) => {
                assert!(details.contains("engine-said-this"));
            }
            other => panic!("expected Compilation error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncate_diagnostic_passes_short_text_through() {
        assert_eq!(truncate_diagnostic("short", 5000), "short");
    }

    #[test]
    fn test_truncate_diagnostic_cuts_and_marks() {
        let long = "x".repeat(6000);
        let cut = truncate_diagnostic(&long, 5000);
        assert!(cut.ends_with("[diagnostic truncated]"));
        assert!(cut.len() < long.len());
    }

    #[test]
    fn test_truncate_diagnostic_respects_char_boundaries() {
        let long = "é".repeat(10);
        let cut = truncate_diagnostic(&long, 4);
        assert!(cut.starts_with("éééé"));
        assert!(cut.ends_with("[diagnostic truncated]"));
    }
}
