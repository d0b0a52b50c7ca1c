//! Tile descriptor and identifier types.

use image::{Rgb, RgbImage};
use std::fmt;

/// Identifier of a tile within one [`TileIndex`](super::TileIndex).
///
/// Ids are ordinals assigned in ingest order, so they are unique within
/// their index but carry no meaning across indexes.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TileId(u32);

impl TileId {
    pub(crate) fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    /// Returns the ordinal as a usable vec index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Test-only constructor for ids without building an index.
    #[cfg(test)]
    pub fn test_from_ordinal(ordinal: u32) -> Self {
        Self(ordinal)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile-{}", self.0)
    }
}

/// One material image reduced to a compact, comparable form.
///
/// Immutable once built; owned exclusively by the index that created it.
pub struct TileDescriptor {
    /// Ordinal id within the owning index.
    pub id: TileId,

    /// Source entry name (archive path), kept for diagnostics.
    pub name: String,

    /// Square thumbnail at the configured thumb edge, used as the pixel
    /// source when compositing the tile into a mosaic cell.
    pub thumbnail: RgbImage,

    /// Average color of the thumbnail.
    pub average: Rgb<u8>,

    /// Native dimensions of the source image before downsampling.
    pub native_width: u32,

    /// Native dimensions of the source image before downsampling.
    pub native_height: u32,
}

impl fmt::Debug for TileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("average", &self.average)
            .field("native", &(self.native_width, self.native_height))
            .finish()
    }
}
