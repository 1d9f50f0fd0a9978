//! Expiry Sweeper
//!
//! Deletes directory entries older than a retention window. Sweeps share
//! their directories with live requests, so every per-entry failure is logged
//! and skipped; a sweep never returns an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One directory and the maximum age its entries may reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub dir: PathBuf,
    pub max_age: Duration,
}

impl RetentionPolicy {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }
}

/// Outcome of one sweep over one directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub dir: PathBuf,
    pub started_at: DateTime<Utc>,
    /// Direct entries examined
    pub scanned: usize,
    /// Expired entries removed
    pub deleted: usize,
    /// Expired entries that could not be removed
    pub failed: usize,
}

impl SweepReport {
    fn empty(dir: &Path, started_at: DateTime<Utc>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            started_at,
            scanned: 0,
            deleted: 0,
            failed: 0,
        }
    }
}

/// Sweep `policy.dir` against the current time.
pub async fn sweep(policy: &RetentionPolicy) -> SweepReport {
    sweep_at(policy, SystemTime::now()).await
}

/// Sweep every policy in order.
pub async fn sweep_all(policies: &[RetentionPolicy]) -> Vec<SweepReport> {
    let mut reports = Vec::with_capacity(policies.len());
    for policy in policies {
        reports.push(sweep(policy).await);
    }
    reports
}

/// Sweep `policy.dir` as if the current time were `now`.
///
/// An entry is expired when `now - created >= max_age`. Entries whose
/// creation time is unavailable fall back to their modification time.
/// Directories are removed recursively.
pub async fn sweep_at(policy: &RetentionPolicy, now: SystemTime) -> SweepReport {
    let mut report = SweepReport::empty(&policy.dir, DateTime::<Utc>::from(now));

    let mut entries = match tokio::fs::read_dir(&policy.dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(dir = %policy.dir.display(), "Sweep target does not exist yet");
            return report;
        }
        Err(e) => {
            tracing::warn!(dir = %policy.dir.display(), error = %e, "Cannot read sweep target");
            return report;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %policy.dir.display(), error = %e, "Directory listing interrupted");
                break;
            }
        };
        report.scanned += 1;

        let path = entry.path();
        let meta = match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot stat entry, skipping");
                report.failed += 1;
                continue;
            }
        };

        let Some(stamp) = meta.created().or_else(|_| meta.modified()).ok() else {
            tracing::warn!(path = %path.display(), "Entry has no usable timestamp, skipping");
            report.failed += 1;
            continue;
        };
        // A timestamp in the future counts as age zero.
        let age = now.duration_since(stamp).unwrap_or(Duration::ZERO);
        if age < policy.max_age {
            continue;
        }

        let removed = if meta.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };

        match removed {
            Ok(()) => report.deleted += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Entry already removed");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete expired entry");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        dir = %policy.dir.display(),
        scanned = report.scanned,
        deleted = report.deleted,
        failed = report.failed,
        "Sweep finished"
    );
    report
}
