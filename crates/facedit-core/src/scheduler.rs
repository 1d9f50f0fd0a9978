//! Scheduler Driver
//!
//! Runs the expiry sweeper on a fixed interval in one background task.
//! A [`SweepScheduler`] is the idle state; [`SweepScheduler::start`] moves it
//! to running and hands back a [`SchedulerHandle`]. The task sleeps first and
//! sweeps after each interval, for as long as the process lives or until
//! [`SchedulerHandle::shutdown`] is called.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::sweeper::{sweep_all, RetentionPolicy, SweepReport};

/// Periodic sweep configuration, not yet running
#[derive(Debug, Clone)]
pub struct SweepScheduler {
    policies: Arc<Vec<RetentionPolicy>>,
    interval: Duration,
}

impl SweepScheduler {
    pub fn new(policies: Vec<RetentionPolicy>, interval: Duration) -> Self {
        Self {
            policies: Arc::new(policies),
            interval,
        }
    }

    pub fn policies(&self) -> &[RetentionPolicy] {
        &self.policies
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sweep every policy once, now.
    pub async fn run_once(&self) -> Vec<SweepReport> {
        sweep_all(&self.policies).await
    }

    /// Spawn the background loop on the current tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = Arc::clone(&shutdown);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            policies = self.policies.len(),
            "Starting sweep scheduler"
        );

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_clone.notified() => {
                        tracing::info!("Sweep scheduler shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(self.interval) => {
                        let reports = self.run_once().await;
                        let deleted: usize = reports.iter().map(|r| r.deleted).sum();
                        let failed: usize = reports.iter().map(|r| r.failed).sum();
                        tracing::debug!(deleted, failed, "Scheduled sweep complete");
                    }
                }
            }
        });

        SchedulerHandle { shutdown, task }
    }
}

/// Handle to a running scheduler.
///
/// Dropping the handle does not stop the task; it keeps running until the
/// process exits.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop and wait for it to exit. A sweep in progress completes first.
    pub async fn shutdown(self) {
        // notify_one stores a permit, so a signal sent mid-sweep is not lost.
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Sweep scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_scheduler_sweeps_periodically() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("old.png");
        std::fs::write(&file, b"x").unwrap();

        let scheduler = SweepScheduler::new(
            vec![RetentionPolicy::new(dir.path(), Duration::ZERO)],
            Duration::from_millis(20),
        );
        let handle = scheduler.start();
        assert!(handle.is_running());

        assert!(wait_until(|| !file.exists()).await, "file should be swept");

        // A file created later is picked up by a later tick.
        let second = dir.path().join("second.png");
        std::fs::write(&second, b"x").unwrap();
        assert!(wait_until(|| !second.exists()).await);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick_sweeps_nothing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("kept.png");
        std::fs::write(&file, b"x").unwrap();

        let scheduler = SweepScheduler::new(
            vec![RetentionPolicy::new(dir.path(), Duration::ZERO)],
            Duration::from_secs(3600),
        );
        let handle = scheduler.start();
        handle.shutdown().await;

        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_run_once_sweeps_immediately() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();

        let scheduler = SweepScheduler::new(
            vec![RetentionPolicy::new(dir.path(), Duration::ZERO)],
            Duration::from_secs(3600),
        );
        let reports = scheduler.run_once().await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].deleted, 1);
    }

    #[tokio::test]
    async fn test_scheduler_survives_missing_directories() {
        let dir = TempDir::new().unwrap();
        let scheduler = SweepScheduler::new(
            vec![RetentionPolicy::new(dir.path().join("absent"), Duration::ZERO)],
            Duration::from_millis(10),
        );
        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_running());
        handle.shutdown().await;
    }
}
