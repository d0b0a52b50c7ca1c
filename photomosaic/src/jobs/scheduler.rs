//! The job scheduler.
//!
//! Owns every computation request end-to-end: submission enqueues an
//! entry and returns a handle immediately; bounded worker pools pull
//! queued work, claim it atomically (so a job is picked up by at most one
//! worker, ever), and drive it to a terminal state. Mosaic and ingest
//! jobs run on separate pools so neither kind can starve the other.
//!
//! Jobs are observed by polling: [`Scheduler::job`] and
//! [`Scheduler::material`] return snapshots with monotonically
//! non-decreasing progress and terminal states that never revert.
//! Cancellation is best-effort and cooperative; the engine checks the
//! job's token between cells. A watchdog moves jobs that stop reporting
//! progress to `Error` rather than letting them hang.

use super::handle::{JobHandle, MaterialHandle};
use super::id::JobId;
use super::state::{JobEntry, MaterialEntry};
use super::status::JobSnapshot;
use super::watchdog::StuckJobWatchdog;
use crate::config::{IngestLimits, SchedulerConfig};
use crate::engine::{encode_jpeg, synthesize, MosaicParams, TargetImage};
use crate::error::MosaicError;
use crate::index::TileIndex;
use crate::material::{build_material_index, MaterialId, MaterialSnapshot};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

struct MosaicWork {
    entry: Arc<JobEntry>,
    target: Vec<u8>,
    index: Arc<TileIndex>,
    params: MosaicParams,
}

struct IngestWork {
    entry: Arc<MaterialEntry>,
    archive: Vec<u8>,
}

/// Asynchronous scheduler for mosaic and material-ingest jobs.
///
/// Must be created inside a Tokio runtime; worker tasks and the watchdog
/// are spawned at construction and stop when the scheduler is shut down
/// or dropped.
pub struct Scheduler {
    jobs: Arc<DashMap<JobId, Arc<JobEntry>>>,
    materials: Arc<DashMap<MaterialId, Arc<MaterialEntry>>>,
    mosaic_tx: mpsc::Sender<MosaicWork>,
    ingest_tx: mpsc::Sender<IngestWork>,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Creates a scheduler and spawns its worker pools and watchdog.
    pub fn new(config: SchedulerConfig) -> Self {
        let jobs: Arc<DashMap<JobId, Arc<JobEntry>>> = Arc::new(DashMap::new());
        let materials: Arc<DashMap<MaterialId, Arc<MaterialEntry>>> = Arc::new(DashMap::new());
        let shutdown = CancellationToken::new();

        let (mosaic_tx, mosaic_rx) = mpsc::channel::<MosaicWork>(config.queue_depth);
        let (ingest_tx, ingest_rx) = mpsc::channel::<IngestWork>(config.queue_depth);

        let mosaic_rx = Arc::new(Mutex::new(mosaic_rx));
        for worker in 0..config.mosaic_workers {
            let rx = Arc::clone(&mosaic_rx);
            let shutdown = shutdown.clone();
            let timeout = config.job_timeout;
            tokio::spawn(async move {
                debug!(worker, "mosaic worker started");
                mosaic_worker_loop(rx, timeout, shutdown).await;
                debug!(worker, "mosaic worker stopped");
            });
        }

        let ingest_rx = Arc::new(Mutex::new(ingest_rx));
        for worker in 0..config.ingest_workers {
            let rx = Arc::clone(&ingest_rx);
            let shutdown = shutdown.clone();
            let timeout = config.job_timeout;
            let limits = config.ingest_limits.clone();
            tokio::spawn(async move {
                debug!(worker, "ingest worker started");
                ingest_worker_loop(rx, limits, timeout, shutdown).await;
                debug!(worker, "ingest worker stopped");
            });
        }

        let watchdog = StuckJobWatchdog::new(
            Arc::clone(&jobs),
            Arc::clone(&materials),
            config.stuck_threshold,
            config.watchdog_interval,
        );
        tokio::spawn(watchdog.run(shutdown.clone()));

        Self {
            jobs,
            materials,
            mosaic_tx,
            ingest_tx,
            shutdown,
        }
    }

    /// Submits a material archive for ingestion and returns immediately.
    ///
    /// The returned handle starts in `Queued`. If the ingest queue is
    /// full the entry goes straight to `Error` with a descriptive
    /// message, visible through the same handle.
    pub fn submit_ingest(&self, archive: Vec<u8>, name: impl Into<String>) -> MaterialHandle {
        let entry = MaterialEntry::new(MaterialId::auto(), name);
        self.materials.insert(entry.id().clone(), Arc::clone(&entry));

        let work = IngestWork {
            entry: Arc::clone(&entry),
            archive,
        };
        if self.shutdown.is_cancelled() || self.ingest_tx.try_send(work).is_err() {
            entry.finish_error("ingest queue is full or shut down");
        }

        debug!(material_id = %entry.id(), "material ingest submitted");
        MaterialHandle::new(entry)
    }

    /// Submits a mosaic job against a ready material set.
    ///
    /// # Errors
    ///
    /// - [`MosaicError::InvalidInput`] for out-of-range parameters
    /// - [`MosaicError::PreconditionFailed`] when the material set is
    ///   unknown or not `Ready`
    pub fn submit_mosaic(
        &self,
        target: Vec<u8>,
        material_id: &MaterialId,
        params: MosaicParams,
    ) -> Result<JobHandle, MosaicError> {
        params.validate()?;

        let material = self.materials.get(material_id).ok_or_else(|| {
            MosaicError::PreconditionFailed(format!("unknown material set: {}", material_id))
        })?;
        let index = material.index().ok_or_else(|| {
            MosaicError::PreconditionFailed(format!(
                "material set {} is not ready: {}",
                material_id,
                material.snapshot().status
            ))
        })?;
        drop(material);

        let entry = JobEntry::new(JobId::auto());
        self.jobs.insert(entry.id().clone(), Arc::clone(&entry));

        let work = MosaicWork {
            entry: Arc::clone(&entry),
            target,
            index,
            params,
        };
        if self.mosaic_tx.try_send(work).is_err() {
            entry.finish_error("mosaic queue is full or shut down");
        }

        debug!(job_id = %entry.id(), material_id = %material_id, "mosaic job submitted");
        Ok(JobHandle::new(entry))
    }

    /// Returns a snapshot of a job. Polling has no side effects.
    pub fn job(&self, id: &JobId) -> Option<JobSnapshot> {
        self.jobs.get(id).map(|entry| entry.snapshot())
    }

    /// Returns a snapshot of a material set. Polling has no side effects.
    pub fn material(&self, id: &MaterialId) -> Option<MaterialSnapshot> {
        self.materials.get(id).map(|entry| entry.snapshot())
    }

    /// Returns the encoded result of a `Done` job.
    ///
    /// Idempotent: every call returns the same bytes for a given job id.
    pub fn result(&self, id: &JobId) -> Option<Arc<Vec<u8>>> {
        self.jobs.get(id).and_then(|entry| entry.result())
    }

    /// Requests best-effort cancellation of a job.
    ///
    /// Returns false when the job id is unknown.
    pub fn cancel_job(&self, id: &JobId) -> bool {
        match self.jobs.get(id) {
            Some(entry) => {
                entry.request_cancel();
                true
            }
            None => false,
        }
    }

    /// Removes a terminal job and its retained result.
    pub fn delete_job(&self, id: &JobId) -> bool {
        match self.jobs.remove(id) {
            Some((_, entry)) => {
                entry.request_cancel();
                true
            }
            None => false,
        }
    }

    /// Removes a material set, releasing its tile index.
    ///
    /// Jobs already running against the index keep their `Arc` until they
    /// finish; no new jobs can reference the set afterwards.
    pub fn delete_material(&self, id: &MaterialId) -> bool {
        match self.materials.remove(id) {
            Some((_, entry)) => {
                entry.request_cancel();
                entry.release_index();
                info!(material_id = %id, "material set deleted");
                true
            }
            None => false,
        }
    }

    /// Stops the worker pools and watchdog. In-flight jobs finish their
    /// current work; queued jobs are not picked up afterwards.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn mosaic_worker_loop(
    rx: Arc<Mutex<mpsc::Receiver<MosaicWork>>>,
    timeout: Duration,
    shutdown: CancellationToken,
) {
    loop {
        let work = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = shutdown.cancelled() => None,
                work = rx.recv() => work,
            }
        };
        let Some(work) = work else { break };
        run_mosaic_job(work, timeout).await;
    }
}

async fn run_mosaic_job(work: MosaicWork, timeout: Duration) {
    let MosaicWork {
        entry,
        target,
        index,
        params,
    } = work;

    // Single-assignment claim: loses only to a pre-pickup cancellation.
    if !entry.try_claim() {
        debug!(job_id = %entry.id(), "mosaic job no longer claimable, skipping");
        return;
    }

    let worker_entry = Arc::clone(&entry);
    let cancel = entry.cancel_token().clone();
    let task = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, MosaicError> {
        let target = TargetImage::decode(&target)?;
        let mosaic = synthesize(&target, &index, &params, &cancel, |progress| {
            worker_entry.set_progress(progress)
        })?;
        encode_jpeg(&mosaic)
    });

    match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            // Stop the detached blocking loop at its next cell boundary.
            entry.cancel_token().cancel();
            entry.finish_error(MosaicError::Timeout(timeout).user_message());
        }
        Ok(Err(join_err)) => {
            error!(job_id = %entry.id(), error = %join_err, "mosaic worker task failed");
            entry.finish_error("internal error: mosaic worker failed");
        }
        Ok(Ok(Ok(bytes))) => {
            info!(job_id = %entry.id(), bytes = bytes.len(), "mosaic job done");
            entry.finish_done(bytes);
        }
        Ok(Ok(Err(err))) => {
            entry.finish_error(err.user_message());
        }
    }
}

async fn ingest_worker_loop(
    rx: Arc<Mutex<mpsc::Receiver<IngestWork>>>,
    limits: IngestLimits,
    timeout: Duration,
    shutdown: CancellationToken,
) {
    loop {
        let work = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = shutdown.cancelled() => None,
                work = rx.recv() => work,
            }
        };
        let Some(work) = work else { break };
        run_ingest_job(work, &limits, timeout).await;
    }
}

async fn run_ingest_job(work: IngestWork, limits: &IngestLimits, timeout: Duration) {
    let IngestWork { entry, archive } = work;

    if !entry.try_claim() {
        debug!(material_id = %entry.id(), "ingest no longer claimable, skipping");
        return;
    }

    let worker_entry = Arc::clone(&entry);
    let cancel = entry.cancel_token().clone();
    let limits = limits.clone();
    let task = tokio::task::spawn_blocking(move || {
        build_material_index(&archive, &limits, &cancel, |progress, accepted| {
            worker_entry.set_progress(progress, accepted)
        })
    });

    match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            entry.cancel_token().cancel();
            entry.finish_error(MosaicError::Timeout(timeout).user_message());
        }
        Ok(Err(join_err)) => {
            error!(material_id = %entry.id(), error = %join_err, "ingest worker task failed");
            entry.finish_error("internal error: ingest worker failed");
        }
        Ok(Ok(Ok(index))) => {
            info!(
                material_id = %entry.id(),
                tiles = index.len(),
                skipped = index.skipped(),
                "material set ready"
            );
            entry.finish_ready(Arc::new(index));
        }
        Ok(Ok(Err(err))) => {
            entry.finish_error(err.user_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialStatus;

    #[tokio::test]
    async fn test_submit_mosaic_unknown_material() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let err = scheduler
            .submit_mosaic(vec![1, 2, 3], &MaterialId::new("nope"), MosaicParams::new(32))
            .unwrap_err();
        assert!(matches!(err, MosaicError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_submit_mosaic_invalid_params() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let err = scheduler
            .submit_mosaic(vec![], &MaterialId::new("any"), MosaicParams::new(1))
            .unwrap_err();
        assert!(matches!(err, MosaicError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_ingest_of_garbage_archive_errors() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let mut handle = scheduler.submit_ingest(vec![0xba, 0xad], "junk");

        let snap = handle.wait().await;
        assert_eq!(snap.status, MaterialStatus::Error);
        assert!(!snap.message.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids_poll_as_none() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        assert!(scheduler.job(&JobId::new("missing")).is_none());
        assert!(scheduler.material(&MaterialId::new("missing")).is_none());
        assert!(!scheduler.cancel_job(&JobId::new("missing")));
        assert!(!scheduler.delete_material(&MaterialId::new("missing")));
    }
}
