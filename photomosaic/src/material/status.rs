//! Material set status and snapshot types.

/// Lifecycle status of a material ingest.
///
/// `Queued → Processing → Ready | Error`; no transition leaves a terminal
/// state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaterialStatus {
    /// Accepted, waiting for an ingest worker.
    #[default]
    Queued,

    /// An ingest worker is unpacking and indexing the archive.
    Processing,

    /// The tile index is built and available for synthesis.
    Ready,

    /// Ingestion failed; the snapshot message says why.
    Error,
}

impl MaterialStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Returns true if the material set can serve synthesis jobs.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Processing => write!(f, "processing"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time view of a material set, safe to poll repeatedly.
#[derive(Clone, Debug)]
pub struct MaterialSnapshot {
    /// Current lifecycle status.
    pub status: MaterialStatus,

    /// Progress in `[0, 100]`; reaches 100 only at a terminal state.
    pub progress: u8,

    /// Human-readable status message.
    pub message: String,

    /// Number of tiles accepted so far (final count once `Ready`).
    pub tile_count: usize,
}
