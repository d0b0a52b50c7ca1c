//! Mosaic synthesis engine.
//!
//! Given a decoded target image, a ready tile index, and validated
//! parameters, [`synthesize`] assigns a tile to every grid cell, applies
//! color correction, composites the result, and optionally blends the
//! original target back over the mosaic.
//!
//! The engine is synchronous and CPU-bound; the scheduler runs it under
//! `spawn_blocking` and passes a cancellation token that is checked
//! between cells.

mod grid;
mod params;
mod selector;
mod synthesize;
mod target;

pub use grid::{Cell, CellGrid};
pub use params::MosaicParams;
pub use selector::RepeatWindow;
pub use synthesize::{encode_jpeg, synthesize};
pub use target::TargetImage;
