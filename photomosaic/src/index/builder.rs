//! Tile index builder.
//!
//! Decodes raw material images into [`TileDescriptor`]s and assembles the
//! color-bin candidate map. Entries that fail to decode are skipped with a
//! warning and counted; the build as a whole fails only when zero tiles
//! survive.

use super::descriptor::{TileDescriptor, TileId};
use super::TileIndex;
use crate::color::{average_color, bin_key};
use crate::config::DEFAULT_THUMB_EDGE;
use crate::error::MosaicError;
use image::imageops::FilterType;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Builds a [`TileIndex`] from raw image bytes.
///
/// The thumbnail edge is fixed per builder, so color summary computation
/// cost is O(thumb pixels) per tile regardless of source image size.
///
/// # Example
///
/// ```no_run
/// use photomosaic::index::IndexBuilder;
///
/// let entries = vec![("cat.jpg".to_string(), std::fs::read("cat.jpg").unwrap())];
/// let index = IndexBuilder::default().build(entries).unwrap();
/// assert_eq!(index.len(), 1);
/// ```
pub struct IndexBuilder {
    thumb_edge: u32,
}

impl IndexBuilder {
    /// Creates a builder producing thumbnails of the given square edge.
    pub fn new(thumb_edge: u32) -> Self {
        Self {
            thumb_edge: thumb_edge.max(1),
        }
    }

    /// Decodes all entries and builds the index.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::ResourceExhausted`] if no entry decodes to a
    /// usable tile. Individual decode failures are skipped, not fatal.
    pub fn build<I>(&self, entries: I) -> Result<TileIndex, MosaicError>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        self.build_with_progress(entries, &CancellationToken::new(), |_, _| {})
    }

    /// Like [`build`](Self::build), invoking `on_entry` after each entry
    /// (decoded or skipped) with the number of entries consumed so far and
    /// the number of tiles accepted so far, and checking `cancel` between
    /// entries.
    pub fn build_with_progress<I, F>(
        &self,
        entries: I,
        cancel: &CancellationToken,
        mut on_entry: F,
    ) -> Result<TileIndex, MosaicError>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
        F: FnMut(usize, usize),
    {
        let mut descriptors: Vec<TileDescriptor> = Vec::new();
        let mut bins: HashMap<(u8, u8, u8), Vec<TileId>> = HashMap::new();
        let mut skipped = 0usize;
        let mut consumed = 0usize;

        for (name, bytes) in entries {
            if cancel.is_cancelled() {
                return Err(MosaicError::Cancelled);
            }
            consumed += 1;

            match self.decode_entry(&name, &bytes) {
                Some(mut descriptor) => {
                    let id = TileId::new(descriptors.len() as u32);
                    descriptor.id = id;
                    bins.entry(bin_key(descriptor.average)).or_default().push(id);
                    descriptors.push(descriptor);
                }
                None => {
                    skipped += 1;
                }
            }

            on_entry(consumed, descriptors.len());
        }

        if descriptors.is_empty() {
            return Err(MosaicError::ResourceExhausted(format!(
                "no decodable images among {} entries",
                consumed
            )));
        }

        debug!(
            tiles = descriptors.len(),
            skipped,
            bins = bins.len(),
            "tile index built"
        );

        Ok(TileIndex::new(descriptors, bins, skipped))
    }

    /// Decodes one entry, or returns None if it is not a usable raster image.
    fn decode_entry(&self, name: &str, bytes: &[u8]) -> Option<TileDescriptor> {
        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(err) => {
                warn!(entry = %name, error = %err, "skipping undecodable material entry");
                return None;
            }
        };

        let (native_width, native_height) = (decoded.width(), decoded.height());
        if native_width == 0 || native_height == 0 {
            warn!(entry = %name, "skipping zero-sized material entry");
            return None;
        }

        let thumbnail = image::imageops::resize(
            &decoded.to_rgb8(),
            self.thumb_edge,
            self.thumb_edge,
            FilterType::Lanczos3,
        );
        let average = average_color(&thumbnail);

        Some(TileDescriptor {
            // Placeholder; the real ordinal is assigned by the caller once
            // the entry is known to survive.
            id: TileId::new(0),
            name: name.to_string(),
            thumbnail,
            average,
            native_width,
            native_height,
        })
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_THUMB_EDGE)
    }
}
