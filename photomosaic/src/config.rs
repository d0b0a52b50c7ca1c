//! Configuration types for the pipeline and scheduler.
//!
//! Each config struct groups the parameters of one concern and provides
//! sensible defaults plus builder-style `with_*` methods, so call sites
//! only spell out what they change.
//!
//! # Example
//!
//! ```
//! use photomosaic::config::{IngestLimits, SchedulerConfig};
//! use std::time::Duration;
//!
//! let limits = IngestLimits::default().with_max_entries(10_000);
//! let config = SchedulerConfig::default()
//!     .with_mosaic_workers(4)
//!     .with_job_timeout(Duration::from_secs(120));
//! ```

use std::time::Duration;

/// Default edge length of stored tile thumbnails, in pixels.
pub const DEFAULT_THUMB_EDGE: u32 = 64;

/// Default maximum number of entries accepted from one archive.
pub const DEFAULT_MAX_ENTRIES: usize = 200_000;

/// Default maximum size of a single archive entry, in bytes.
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 200 * 1024 * 1024;

/// Limits applied while unpacking and indexing a material archive.
#[derive(Debug, Clone)]
pub struct IngestLimits {
    /// Maximum number of entries read from one archive.
    pub max_entries: usize,

    /// Maximum size of a single entry; larger entries are skipped.
    pub max_entry_bytes: u64,

    /// Edge length of the square thumbnail stored per tile.
    pub thumb_edge: u32,
}

impl IngestLimits {
    /// Sets the maximum number of archive entries.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the per-entry size cap in bytes.
    pub fn with_max_entry_bytes(mut self, max_entry_bytes: u64) -> Self {
        self.max_entry_bytes = max_entry_bytes;
        self
    }

    /// Sets the stored thumbnail edge length.
    pub fn with_thumb_edge(mut self, thumb_edge: u32) -> Self {
        self.thumb_edge = thumb_edge;
        self
    }
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
            thumb_edge: DEFAULT_THUMB_EDGE,
        }
    }
}

/// Configuration for the job scheduler and its worker pools.
///
/// Mosaic and ingest jobs run on separate pools so a flood of one kind
/// cannot starve the other.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of workers processing mosaic jobs.
    pub mosaic_workers: usize,

    /// Number of workers processing material ingest jobs.
    pub ingest_workers: usize,

    /// Capacity of each queue; submission fails when a queue is full.
    pub queue_depth: usize,

    /// Maximum wall-clock duration for a single job.
    pub job_timeout: Duration,

    /// A running job with no progress update for this long is failed.
    pub stuck_threshold: Duration,

    /// How often the watchdog sweeps for stuck jobs.
    pub watchdog_interval: Duration,

    /// Limits applied to material ingestion.
    pub ingest_limits: IngestLimits,
}

impl SchedulerConfig {
    /// Sets the mosaic worker pool size.
    pub fn with_mosaic_workers(mut self, workers: usize) -> Self {
        self.mosaic_workers = workers.max(1);
        self
    }

    /// Sets the ingest worker pool size.
    pub fn with_ingest_workers(mut self, workers: usize) -> Self {
        self.ingest_workers = workers.max(1);
        self
    }

    /// Sets the queue capacity for both pools.
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Sets the per-job timeout.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Sets the stuck-job threshold used by the watchdog.
    pub fn with_stuck_threshold(mut self, threshold: Duration) -> Self {
        self.stuck_threshold = threshold;
        self
    }

    /// Sets the watchdog sweep interval.
    pub fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    /// Sets the ingest limits.
    pub fn with_ingest_limits(mut self, limits: IngestLimits) -> Self {
        self.ingest_limits = limits;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mosaic_workers: 2,
            ingest_workers: 2,
            queue_depth: 64,
            job_timeout: Duration::from_secs(600),
            stuck_threshold: Duration::from_secs(120),
            watchdog_interval: Duration::from_secs(10),
            ingest_limits: IngestLimits::default(),
        }
    }
}
