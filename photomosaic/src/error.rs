//! Error types for the mosaic engine and pipeline.
//!
//! Errors are categorized by who can act on them: `InvalidInput` and
//! `PreconditionFailed` are user-correctable and surfaced verbatim,
//! `Internal` carries a display-safe summary while diagnostic detail goes
//! to the log. Jobs are never retried automatically; resubmission is an
//! explicit caller action.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during ingestion, synthesis, or job processing.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// Malformed or unsupported image/archive data (user-correctable)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation attempted on a resource not in the required state
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// No usable data survived processing (e.g., archive with zero decodable images)
    #[error("no usable input: {0}")]
    ResourceExhausted(String),

    /// Unexpected I/O or decoding fault during processing
    #[error("internal error: {0}")]
    Internal(String),

    /// Job was cancelled cooperatively
    #[error("job cancelled")]
    Cancelled,

    /// Job exceeded its maximum allowed duration
    #[error("job timed out after {0:?}")]
    Timeout(Duration),
}

impl MosaicError {
    /// Returns true if this error was caused by a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Human-readable message suitable for direct display to the end user.
    ///
    /// Identical to the `Display` output today; kept as a named method so
    /// status snapshots have one sanctioned way to stringify failures.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
