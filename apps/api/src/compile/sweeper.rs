//! Background reclamation of abandoned job directories.
//!
//! Jobs clean up after themselves; the sweeper only recovers scratch state
//! orphaned by a crash. The retention threshold dwarfs the per-job timeout,
//! so a live job is never swept.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How often the scratch root is scanned.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Entries older than this are considered abandoned.
pub const RETENTION: Duration = Duration::from_secs(3600);

/// Spawns the hourly sweep task. The first sweep runs immediately to pick
/// up anything left behind by a previous process.
pub fn spawn(scratch_root: PathBuf) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep(&scratch_root, RETENTION).await;
        }
    });
}

/// One pass over the scratch root. Per-entry failures are logged and do not
/// abort the rest of the sweep. Returns the number of entries removed.
pub async fn sweep(scratch_root: &Path, retention: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(scratch_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!(root = %scratch_root.display(), error = %e, "failed to read scratch root");
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read scratch entry");
                break;
            }
        };

        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "failed to stat scratch entry");
                continue;
            }
        };

        let age = now.duration_since(modified).unwrap_or_default();
        if age < retention {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => {
                debug!(path = %entry.path().display(), age_s = age.as_secs(), "removed stale entry");
                removed += 1;
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "failed to remove stale entry");
            }
        }
    }

    if removed > 0 {
        info!(removed, "swept stale job directories");
    }
    removed
}
