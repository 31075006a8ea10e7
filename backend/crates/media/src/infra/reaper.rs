//! Resource Reaper
//!
//! Deletes aged files from the upload and output directories and prunes idle
//! admission records. Runs once at startup, then on a fixed tick, and early
//! whenever a handler nudges it.

use crate::application::config::MediaConfig;
use platform::rate_limit::AdmissionController;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;

/// Outcome of a single sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub files_removed: usize,
    pub files_failed: usize,
    pub clients_pruned: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub struct Reaper {
    dirs: Vec<PathBuf>,
    retention: Duration,
    client_staleness: Duration,
    admission: Arc<AdmissionController>,
    wake: Notify,
}

impl Reaper {
    pub fn new(
        dirs: Vec<PathBuf>,
        retention: Duration,
        client_staleness: Duration,
        admission: Arc<AdmissionController>,
    ) -> Self {
        Self {
            dirs,
            retention,
            client_staleness,
            admission,
            wake: Notify::new(),
        }
    }

    pub fn from_config(config: &MediaConfig, admission: Arc<AdmissionController>) -> Self {
        Self::new(
            vec![config.upload_dir.clone(), config.output_dir.clone()],
            config.artifact_retention,
            config.client_staleness,
            admission,
        )
    }

    /// Ask the background loop to sweep soon; repeated nudges coalesce
    pub fn nudge(&self) {
        self.wake.notify_one();
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(SystemTime::now(), Instant::now()).await
    }

    /// Sweep against caller-supplied clocks (wall clock for file ages,
    /// monotonic clock for admission records)
    pub async fn sweep_at(&self, wall_now: SystemTime, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();

        for dir in &self.dirs {
            match self.sweep_dir(dir, wall_now, &mut report).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(dir = %dir.display(), "Sweep skipped missing directory");
                }
                Err(e) => {
                    tracing::warn!(
                        dir = %dir.display(),
                        error = %e,
                        "Sweep could not read directory"
                    );
                }
            }
        }

        report.clients_pruned = self.admission.prune_at(now, self.client_staleness);
        report
    }

    async fn sweep_dir(
        &self,
        dir: &Path,
        wall_now: SystemTime,
        report: &mut SweepReport,
    ) -> io::Result<()> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let modified = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta.modified(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };
            let modified = match modified {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "Skipping file without mtime"
                    );
                    continue;
                }
            };

            // Files stamped in the future count as fresh.
            let age = wall_now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= self.retention {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    report.files_removed += 1;
                    tracing::debug!(
                        path = %path.display(),
                        age_secs = age.as_secs(),
                        "Reaped file"
                    );
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    report.files_failed += 1;
                    tracing::warn!(path = %path.display(), error = %e, "Failed to reap file");
                }
            }
        }
        Ok(())
    }

    /// Sweep on every tick or nudge until `shutdown` turns true
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; startup already swept.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let report = self.sweep().await;
            if !report.is_empty() {
                tracing::info!(
                    files_removed = report.files_removed,
                    files_failed = report.files_failed,
                    clients_pruned = report.clients_pruned,
                    "Reaper sweep"
                );
            }
        }

        tracing::info!("Reaper stopped");
    }
}
