//! Photomosaic - mosaic synthesis from a library of material images.
//!
//! This library reconstructs a target photograph as a mosaic of small
//! material images ("tiles"). It provides:
//!
//! - [`index`] - decoding material images into a searchable tile index
//! - [`material`] - archive ingestion that builds a tile index with progress
//! - [`engine`] - the mosaic synthesis algorithm (grid, selection, color
//!   correction, overlay)
//! - [`jobs`] - an asynchronous scheduler running ingest and mosaic jobs on
//!   bounded worker pools with polling, cancellation, and stall detection
//! - [`registry`] - the session/resource ownership boundary
//!
//! # High-Level API
//!
//! ```ignore
//! use photomosaic::jobs::Scheduler;
//! use photomosaic::engine::MosaicParams;
//! use photomosaic::config::SchedulerConfig;
//!
//! let scheduler = Scheduler::new(SchedulerConfig::default());
//!
//! let material = scheduler.submit_ingest(archive_bytes, "tiles");
//! // ... poll material.snapshot() until Ready ...
//!
//! let params = MosaicParams::new(32).with_color_strength(0.35);
//! let mut job = scheduler.submit_mosaic(target_bytes, material.id(), params)?;
//! let snapshot = job.wait().await;
//! let jpeg = job.result();
//! ```

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod jobs;
pub mod logging;
pub mod material;
pub mod registry;

pub use error::MosaicError;

/// Version of the photomosaic library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
