//! Handles for status queries and signalling.
//!
//! A handle is returned when work is submitted to the scheduler. It
//! provides snapshot polling, an awaitable terminal state, and best-effort
//! cancellation. Handles are cloneable; all clones refer to the same
//! underlying job.
//!
//! # Example
//!
//! ```ignore
//! let mut handle = scheduler.submit_mosaic(target, &material_id, params)?;
//!
//! if handle.status() == JobStatus::Running {
//!     println!("progress: {}%", handle.snapshot().progress);
//! }
//!
//! let final_snapshot = handle.wait().await;
//! ```

use super::id::JobId;
use super::state::{JobEntry, MaterialEntry};
use super::status::{JobSnapshot, JobStatus};
use crate::material::{MaterialId, MaterialSnapshot, MaterialStatus};
use std::sync::Arc;
use tokio::sync::watch;

/// Handle to a submitted mosaic job.
#[derive(Clone)]
pub struct JobHandle {
    entry: Arc<JobEntry>,
    status_rx: watch::Receiver<JobStatus>,
}

impl JobHandle {
    pub(crate) fn new(entry: Arc<JobEntry>) -> Self {
        let status_rx = entry.subscribe();
        Self { entry, status_rx }
    }

    /// Returns the job's unique identifier.
    pub fn id(&self) -> &JobId {
        self.entry.id()
    }

    /// Returns the current status without blocking.
    pub fn status(&self) -> JobStatus {
        *self.status_rx.borrow()
    }

    /// Returns a full point-in-time snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.entry.snapshot()
    }

    /// Requests best-effort cancellation.
    ///
    /// A queued job is preempted immediately; a running one stops at the
    /// next cell boundary and ends in `Error`.
    pub fn cancel(&self) {
        self.entry.request_cancel();
    }

    /// Returns the encoded result image once the job is `Done`.
    ///
    /// Repeated calls return the same bytes.
    pub fn result(&self) -> Option<Arc<Vec<u8>>> {
        self.entry.result()
    }

    /// Waits until the job reaches a terminal state and returns the final
    /// snapshot.
    pub async fn wait(&mut self) -> JobSnapshot {
        loop {
            if self.status().is_terminal() {
                break;
            }
            // Channel closed means the scheduler is gone; the snapshot
            // still reflects the last recorded state.
            if self.status_rx.changed().await.is_err() {
                break;
            }
        }
        self.entry.snapshot()
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("job_id", self.entry.id())
            .field("status", &self.status())
            .finish()
    }
}

/// Handle to a submitted material ingest.
#[derive(Clone)]
pub struct MaterialHandle {
    entry: Arc<MaterialEntry>,
    status_rx: watch::Receiver<MaterialStatus>,
}

impl MaterialHandle {
    pub(crate) fn new(entry: Arc<MaterialEntry>) -> Self {
        let status_rx = entry.subscribe();
        Self { entry, status_rx }
    }

    /// Returns the material set's unique identifier.
    pub fn id(&self) -> &MaterialId {
        self.entry.id()
    }

    /// Returns the declared material set name.
    pub fn name(&self) -> &str {
        self.entry.name()
    }

    /// Returns the current status without blocking.
    pub fn status(&self) -> MaterialStatus {
        *self.status_rx.borrow()
    }

    /// Returns a full point-in-time snapshot.
    pub fn snapshot(&self) -> MaterialSnapshot {
        self.entry.snapshot()
    }

    /// Requests best-effort cancellation of the ingest.
    pub fn cancel(&self) {
        self.entry.request_cancel();
    }

    /// Waits until the ingest reaches `Ready` or `Error` and returns the
    /// final snapshot.
    pub async fn wait(&mut self) -> MaterialSnapshot {
        loop {
            if self.status().is_terminal() {
                break;
            }
            if self.status_rx.changed().await.is_err() {
                break;
            }
        }
        self.entry.snapshot()
    }
}

impl std::fmt::Debug for MaterialHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialHandle")
            .field("material_id", self.entry.id())
            .field("status", &self.status())
            .finish()
    }
}
