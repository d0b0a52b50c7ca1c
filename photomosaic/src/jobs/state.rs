//! Internal job and material entry state.
//!
//! An entry is the single source of truth for one job's status, progress,
//! message, and result. All transitions go through the methods here, which
//! enforce the state machine: terminal states are never left, progress
//! never decreases, and the `Queued → Running` claim is atomic so at most
//! one worker ever processes a job.

use super::id::JobId;
use super::status::{JobSnapshot, JobStatus};
use crate::index::TileIndex;
use crate::material::{MaterialId, MaterialSnapshot, MaterialStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

struct JobState {
    status: JobStatus,
    progress: u8,
    message: String,
    result: Option<Arc<Vec<u8>>>,
}

/// Shared mutable state of one mosaic job.
pub(crate) struct JobEntry {
    id: JobId,
    state: Mutex<JobState>,
    status_tx: watch::Sender<JobStatus>,
    cancel: CancellationToken,
    last_activity_ms: AtomicU64,
}

impl JobEntry {
    pub(crate) fn new(id: JobId) -> Arc<Self> {
        let (status_tx, _) = watch::channel(JobStatus::Queued);
        Arc::new(Self {
            id,
            state: Mutex::new(JobState {
                status: JobStatus::Queued,
                progress: 0,
                message: "Queued".to_string(),
                result: None,
            }),
            status_tx,
            cancel: CancellationToken::new(),
            last_activity_ms: AtomicU64::new(now_ms()),
        })
    }

    pub(crate) fn id(&self) -> &JobId {
        &self.id
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status_tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> JobSnapshot {
        let state = self.state.lock().expect("job state lock poisoned");
        JobSnapshot {
            status: state.status,
            progress: state.progress,
            message: state.message.clone(),
            result_ready: state.result.is_some(),
        }
    }

    /// Atomically claims the job for a worker.
    ///
    /// Returns false if the job is no longer `Queued` (already claimed, or
    /// cancelled before pickup).
    pub(crate) fn try_claim(&self) -> bool {
        let mut state = self.state.lock().expect("job state lock poisoned");
        if state.status != JobStatus::Queued {
            return false;
        }
        state.status = JobStatus::Running;
        state.message = "Building mosaic...".to_string();
        drop(state);

        self.touch();
        let _ = self.status_tx.send_replace(JobStatus::Running);
        true
    }

    /// Raises progress while running; lower values are ignored.
    pub(crate) fn set_progress(&self, progress: u8) {
        let mut state = self.state.lock().expect("job state lock poisoned");
        if state.status != JobStatus::Running {
            return;
        }
        if progress > state.progress {
            state.progress = progress.min(100);
        }
        drop(state);
        self.touch();
    }

    /// Marks the job `Done` with its encoded result.
    pub(crate) fn finish_done(&self, result: Vec<u8>) {
        let mut state = self.state.lock().expect("job state lock poisoned");
        if state.status.is_terminal() {
            return;
        }
        state.status = JobStatus::Done;
        state.progress = 100;
        state.message = "Done".to_string();
        state.result = Some(Arc::new(result));
        drop(state);

        let _ = self.status_tx.send_replace(JobStatus::Done);
    }

    /// Marks the job `Error`. Progress stays at its last reported value.
    pub(crate) fn finish_error(&self, message: impl Into<String>) {
        let mut state = self.state.lock().expect("job state lock poisoned");
        if state.status.is_terminal() {
            return;
        }
        state.status = JobStatus::Error;
        state.message = message.into();
        drop(state);

        let _ = self.status_tx.send_replace(JobStatus::Error);
    }

    /// Best-effort cancellation.
    ///
    /// A queued job is preempted straight to `Error`; a running one gets
    /// its token cancelled and fails when the engine notices between cells.
    pub(crate) fn request_cancel(&self) {
        self.cancel.cancel();

        let mut state = self.state.lock().expect("job state lock poisoned");
        if state.status == JobStatus::Queued {
            state.status = JobStatus::Error;
            state.message = "job cancelled".to_string();
            drop(state);
            let _ = self.status_tx.send_replace(JobStatus::Error);
        }
    }

    /// Returns the encoded result once `Done`.
    ///
    /// Every call returns the same bytes; retrieval has no side effect.
    pub(crate) fn result(&self) -> Option<Arc<Vec<u8>>> {
        self.state
            .lock()
            .expect("job state lock poisoned")
            .result
            .clone()
    }

    /// True when the job is `Running` but has reported no activity for
    /// longer than `threshold_ms`.
    pub(crate) fn is_stuck(&self, threshold_ms: u64) -> bool {
        {
            let state = self.state.lock().expect("job state lock poisoned");
            if state.status != JobStatus::Running {
                return false;
            }
        }
        now_ms().saturating_sub(self.last_activity_ms.load(Ordering::Relaxed)) > threshold_ms
    }

    fn touch(&self) {
        self.last_activity_ms.store(now_ms(), Ordering::Relaxed);
    }
}

struct MaterialState {
    status: MaterialStatus,
    progress: u8,
    message: String,
    tile_count: usize,
    index: Option<Arc<TileIndex>>,
}

/// Shared mutable state of one material ingest.
pub(crate) struct MaterialEntry {
    id: MaterialId,
    name: String,
    state: Mutex<MaterialState>,
    status_tx: watch::Sender<MaterialStatus>,
    cancel: CancellationToken,
    last_activity_ms: AtomicU64,
}

impl MaterialEntry {
    pub(crate) fn new(id: MaterialId, name: impl Into<String>) -> Arc<Self> {
        let (status_tx, _) = watch::channel(MaterialStatus::Queued);
        Arc::new(Self {
            id,
            name: name.into(),
            state: Mutex::new(MaterialState {
                status: MaterialStatus::Queued,
                progress: 0,
                message: "Queued".to_string(),
                tile_count: 0,
                index: None,
            }),
            status_tx,
            cancel: CancellationToken::new(),
            last_activity_ms: AtomicU64::new(now_ms()),
        })
    }

    pub(crate) fn id(&self) -> &MaterialId {
        &self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<MaterialStatus> {
        self.status_tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> MaterialSnapshot {
        let state = self.state.lock().expect("material state lock poisoned");
        MaterialSnapshot {
            status: state.status,
            progress: state.progress,
            message: state.message.clone(),
            tile_count: state.tile_count,
        }
    }

    pub(crate) fn try_claim(&self) -> bool {
        let mut state = self.state.lock().expect("material state lock poisoned");
        if state.status != MaterialStatus::Queued {
            return false;
        }
        state.status = MaterialStatus::Processing;
        state.message = "Reading archive...".to_string();
        drop(state);

        self.touch();
        let _ = self.status_tx.send_replace(MaterialStatus::Processing);
        true
    }

    /// Raises progress and records the running tile count while processing.
    pub(crate) fn set_progress(&self, progress: u8, tile_count: usize) {
        let mut state = self.state.lock().expect("material state lock poisoned");
        if state.status != MaterialStatus::Processing {
            return;
        }
        if progress > state.progress {
            state.progress = progress.min(100);
            state.message = "Processing...".to_string();
        }
        if tile_count > state.tile_count {
            state.tile_count = tile_count;
        }
        drop(state);
        self.touch();
    }

    /// Marks the set `Ready`, retaining the built index for synthesis.
    pub(crate) fn finish_ready(&self, index: Arc<TileIndex>) {
        let mut state = self.state.lock().expect("material state lock poisoned");
        if state.status.is_terminal() {
            return;
        }
        state.status = MaterialStatus::Ready;
        state.progress = 100;
        state.tile_count = index.len();
        state.message = format!("Ready: {} tiles", index.len());
        state.index = Some(index);
        drop(state);

        let _ = self.status_tx.send_replace(MaterialStatus::Ready);
    }

    pub(crate) fn finish_error(&self, message: impl Into<String>) {
        let mut state = self.state.lock().expect("material state lock poisoned");
        if state.status.is_terminal() {
            return;
        }
        state.status = MaterialStatus::Error;
        state.message = message.into();
        drop(state);

        let _ = self.status_tx.send_replace(MaterialStatus::Error);
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.cancel();

        let mut state = self.state.lock().expect("material state lock poisoned");
        if state.status == MaterialStatus::Queued {
            state.status = MaterialStatus::Error;
            state.message = "ingest cancelled".to_string();
            drop(state);
            let _ = self.status_tx.send_replace(MaterialStatus::Error);
        }
    }

    /// Returns the index once `Ready` (and not yet released).
    pub(crate) fn index(&self) -> Option<Arc<TileIndex>> {
        self.state
            .lock()
            .expect("material state lock poisoned")
            .index
            .clone()
    }

    /// Drops the retained index so its memory can be reclaimed once the
    /// last in-flight job using it completes.
    pub(crate) fn release_index(&self) {
        self.state
            .lock()
            .expect("material state lock poisoned")
            .index = None;
    }

    pub(crate) fn is_stuck(&self, threshold_ms: u64) -> bool {
        {
            let state = self.state.lock().expect("material state lock poisoned");
            if state.status != MaterialStatus::Processing {
                return false;
            }
        }
        now_ms().saturating_sub(self.last_activity_ms.load(Ordering::Relaxed)) > threshold_ms
    }

    fn touch(&self) {
        self.last_activity_ms.store(now_ms(), Ordering::Relaxed);
    }
}
