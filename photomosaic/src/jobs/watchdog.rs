//! Stuck-job watchdog.
//!
//! A job whose worker dies (or wedges inside a single step) would
//! otherwise sit in `Running` forever. The watchdog periodically sweeps
//! all registered jobs and materials and fails any that have reported no
//! activity for longer than the configured threshold, so pollers see a
//! terminal `Error` instead of a silent hang.

use super::id::JobId;
use super::state::{JobEntry, MaterialEntry};
use crate::material::MaterialId;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Periodic sweeper that moves stalled jobs to `Error`.
pub(crate) struct StuckJobWatchdog {
    jobs: Arc<DashMap<JobId, Arc<JobEntry>>>,
    materials: Arc<DashMap<MaterialId, Arc<MaterialEntry>>>,
    threshold: Duration,
    interval: Duration,
}

impl StuckJobWatchdog {
    pub(crate) fn new(
        jobs: Arc<DashMap<JobId, Arc<JobEntry>>>,
        materials: Arc<DashMap<MaterialId, Arc<MaterialEntry>>>,
        threshold: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            jobs,
            materials,
            threshold,
            interval,
        }
    }

    /// Runs the watchdog until `shutdown` is cancelled.
    pub(crate) async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => self.sweep(),
            }
        }

        debug!("stuck-job watchdog stopped");
    }

    /// Fails every job/material with no activity past the threshold.
    pub(crate) fn sweep(&self) {
        let threshold_ms = self.threshold.as_millis() as u64;

        for entry in self.jobs.iter() {
            let job = entry.value();
            if job.is_stuck(threshold_ms) {
                warn!(
                    job_id = %job.id(),
                    threshold_secs = self.threshold.as_secs(),
                    "job stalled with no progress; failing it"
                );
                job.cancel_token().cancel();
                job.finish_error(format!(
                    "job stalled: no progress for {}s",
                    self.threshold.as_secs()
                ));
            }
        }

        for entry in self.materials.iter() {
            let material = entry.value();
            if material.is_stuck(threshold_ms) {
                warn!(
                    material_id = %material.id(),
                    threshold_secs = self.threshold.as_secs(),
                    "material ingest stalled with no progress; failing it"
                );
                material.cancel_token().cancel();
                material.finish_error(format!(
                    "ingest stalled: no progress for {}s",
                    self.threshold.as_secs()
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::status::JobStatus;

    fn watchdog_over(
        jobs: &Arc<DashMap<JobId, Arc<JobEntry>>>,
        materials: &Arc<DashMap<MaterialId, Arc<MaterialEntry>>>,
    ) -> StuckJobWatchdog {
        StuckJobWatchdog::new(
            Arc::clone(jobs),
            Arc::clone(materials),
            Duration::ZERO,
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_sweep_fails_stalled_running_job() {
        let jobs = Arc::new(DashMap::new());
        let materials = Arc::new(DashMap::new());

        let entry = JobEntry::new(JobId::new("stalled"));
        entry.try_claim();
        jobs.insert(entry.id().clone(), Arc::clone(&entry));

        std::thread::sleep(Duration::from_millis(5));
        watchdog_over(&jobs, &materials).sweep();

        let snap = entry.snapshot();
        assert_eq!(snap.status, JobStatus::Error);
        assert!(snap.message.contains("stalled"));
        assert!(entry.cancel_token().is_cancelled());
    }

    #[test]
    fn test_sweep_leaves_queued_and_terminal_jobs() {
        let jobs = Arc::new(DashMap::new());
        let materials = Arc::new(DashMap::new());

        let queued = JobEntry::new(JobId::new("queued"));
        jobs.insert(queued.id().clone(), Arc::clone(&queued));

        let done = JobEntry::new(JobId::new("done"));
        done.try_claim();
        done.finish_done(vec![1]);
        jobs.insert(done.id().clone(), Arc::clone(&done));

        std::thread::sleep(Duration::from_millis(5));
        watchdog_over(&jobs, &materials).sweep();

        assert_eq!(queued.snapshot().status, JobStatus::Queued);
        assert_eq!(done.snapshot().status, JobStatus::Done);
    }

    #[tokio::test]
    async fn test_watchdog_stops_on_cancellation() {
        let jobs = Arc::new(DashMap::new());
        let materials = Arc::new(DashMap::new());
        let shutdown = CancellationToken::new();

        let watchdog = StuckJobWatchdog::new(jobs, materials, Duration::ZERO, Duration::from_secs(10));

        shutdown.cancel();
        let result =
            tokio::time::timeout(Duration::from_millis(100), watchdog.run(shutdown)).await;
        assert!(result.is_ok());
    }
}
