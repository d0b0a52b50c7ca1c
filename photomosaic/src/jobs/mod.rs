//! Asynchronous job execution for mosaic synthesis and material ingest.
//!
//! All long-running work in the crate flows through the [`Scheduler`]:
//! callers submit a mosaic request or a material archive, get back a
//! handle immediately, and observe progress by polling snapshots or
//! awaiting a terminal state. Workers run on bounded pools (one per job
//! kind), claim each job exactly once, and report progress through the
//! shared entry so every observer sees the same monotonic story.
//!
//! # Example
//!
//! ```ignore
//! use photomosaic::config::SchedulerConfig;
//! use photomosaic::engine::MosaicParams;
//! use photomosaic::jobs::Scheduler;
//!
//! let scheduler = Scheduler::new(SchedulerConfig::default());
//!
//! let mut material = scheduler.submit_ingest(archive_bytes, "holiday photos");
//! material.wait().await;
//!
//! let params = MosaicParams::new(32).with_no_repeat_k(8);
//! let mut job = scheduler.submit_mosaic(target_bytes, material.id(), params)?;
//! let snapshot = job.wait().await;
//!
//! if snapshot.result_ready {
//!     let jpeg = job.result().unwrap();
//! }
//! ```

mod handle;
mod id;
mod scheduler;
mod state;
mod status;
mod watchdog;

pub use handle::{JobHandle, MaterialHandle};
pub use id::JobId;
pub use scheduler::Scheduler;
pub use status::{JobSnapshot, JobStatus};
