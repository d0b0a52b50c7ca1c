//! Mosaic job status and snapshot types.

/// Lifecycle status of a mosaic job.
///
/// `Queued → Running → Done | Error`; no transition leaves a terminal
/// state, and exactly one worker ever processes a given job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted, waiting for a worker.
    #[default]
    Queued,

    /// A worker is synthesizing the mosaic.
    Running,

    /// Finished successfully; the result image is available.
    Done,

    /// Failed or cancelled; the snapshot message says why.
    Error,
}

impl JobStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Returns true if the job is queued or running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Returns true if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time view of a job, safe to poll repeatedly.
///
/// Successive snapshots of one job always show non-decreasing progress and
/// a status that, once terminal, never changes.
#[derive(Clone, Debug)]
pub struct JobSnapshot {
    /// Current lifecycle status.
    pub status: JobStatus,

    /// Progress in `[0, 100]`; exactly 100 only once `Done`.
    pub progress: u8,

    /// Human-readable status message.
    pub message: String,

    /// True once the encoded result image can be retrieved.
    pub result_ready: bool,
}
