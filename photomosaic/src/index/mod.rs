//! Tile index - material images reduced to searchable color descriptors.
//!
//! The index is built once per material set by [`IndexBuilder`] and is
//! read-only afterwards, so any number of concurrent mosaic jobs can share
//! it behind an `Arc` without copying.
//!
//! Nearest-tile lookup goes through a coarse color-bin map: tile average
//! colors are quantized into bins, and a search expands outward from the
//! query color's bin until candidates are found, falling back to a full
//! linear scan only when the bins come up empty.

mod builder;
mod descriptor;
mod search;

pub use builder::IndexBuilder;
pub use descriptor::{TileDescriptor, TileId};

use std::collections::HashMap;

/// A read-only, searchable collection of decoded tiles.
///
/// Invariants:
/// - No two descriptors share a [`TileId`] (ids are ordinals within the
///   index).
/// - An index is only ever exposed fully built; a failed build never
///   produces a partial index.
pub struct TileIndex {
    /// Descriptors in ingest order; `TileId` is the position in this vec.
    descriptors: Vec<TileDescriptor>,

    /// Quantized color bin -> tile ids whose average falls in that bin.
    bins: HashMap<(u8, u8, u8), Vec<TileId>>,

    /// Entries that failed to decode and were skipped during the build.
    skipped: usize,
}

impl TileIndex {
    pub(crate) fn new(
        descriptors: Vec<TileDescriptor>,
        bins: HashMap<(u8, u8, u8), Vec<TileId>>,
        skipped: usize,
    ) -> Self {
        Self {
            descriptors,
            bins,
            skipped,
        }
    }

    /// Returns the number of tiles in the index.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the index holds no tiles.
    ///
    /// Never true for an index returned by [`IndexBuilder::build`], which
    /// fails instead of producing an empty index.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns the number of entries skipped during the build.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns the descriptor for a tile id.
    pub fn get(&self, id: TileId) -> Option<&TileDescriptor> {
        self.descriptors.get(id.index())
    }

    /// Iterates over all descriptors in ingest order.
    pub fn descriptors(&self) -> impl Iterator<Item = &TileDescriptor> {
        self.descriptors.iter()
    }

    pub(crate) fn bins(&self) -> &HashMap<(u8, u8, u8), Vec<TileId>> {
        &self.bins
    }
}

impl std::fmt::Debug for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileIndex")
            .field("tiles", &self.descriptors.len())
            .field("bins", &self.bins.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}
