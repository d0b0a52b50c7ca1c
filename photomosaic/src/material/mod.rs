//! Material set pipeline - from uploaded archive to ready tile index.
//!
//! An uploaded archive is unpacked into image entries ([`archive`]), the
//! entries are fed to the index builder, and status/progress is reported
//! through the scheduler's material handle. The pieces here are synchronous
//! and side-effect free; the scheduler runs them on its ingest worker pool.

mod archive;
mod status;

pub use archive::{unpack_archive, UnpackedArchive, ALLOWED_EXTENSIONS};
pub use status::{MaterialSnapshot, MaterialStatus};

use crate::config::IngestLimits;
use crate::error::MosaicError;
use crate::index::{IndexBuilder, TileIndex};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Global counter for generating unique material set IDs.
static MATERIAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a material set.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct MaterialId(String);

impl MaterialId {
    /// Creates a material id with the given string value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a unique auto-generated material id (`material-{counter}`).
    pub fn auto() -> Self {
        let counter = MATERIAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("material-{}", counter))
    }

    /// Returns the string value of this id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaterialId({})", self.0)
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MaterialId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unpacks an archive and builds a tile index from its image entries.
///
/// `on_progress` receives a progress value in `[0, 99]` and the running
/// count of tiles accepted so far, once per consumed entry; the caller
/// reports 100 once the result is recorded as terminal.
///
/// # Errors
///
/// - [`MosaicError::InvalidInput`] for a corrupt archive
/// - [`MosaicError::ResourceExhausted`] when zero entries decode to tiles
pub fn build_material_index<F>(
    archive_bytes: &[u8],
    limits: &IngestLimits,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<TileIndex, MosaicError>
where
    F: FnMut(u8, usize),
{
    let unpacked = unpack_archive(archive_bytes, limits)?;
    if unpacked.entries.is_empty() {
        return Err(MosaicError::ResourceExhausted(format!(
            "archive contains no supported images ({} entries skipped)",
            unpacked.skipped
        )));
    }

    let total = unpacked.entries.len();
    IndexBuilder::new(limits.thumb_edge).build_with_progress(
        unpacked.entries,
        cancel,
        |consumed, accepted| {
            let progress = ((consumed * 99) / total) as u8;
            on_progress(progress.min(99), accepted);
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn png_bytes(color: Rgb<u8>) -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, color);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn zip_of(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut buf);
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_material_id_auto_is_unique() {
        let a = MaterialId::auto();
        let b = MaterialId::auto();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("material-"));
    }

    #[test]
    fn test_build_material_index() {
        let archive = zip_of(&[
            ("a.png", png_bytes(Rgb([10, 10, 10]))),
            ("b.png", png_bytes(Rgb([200, 200, 200]))),
        ]);

        let mut last = 0u8;
        let index = build_material_index(
            &archive,
            &IngestLimits::default(),
            &CancellationToken::new(),
            |p, _| {
                assert!(p >= last, "progress must not decrease");
                last = p;
            },
        )
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(last, 99);
    }

    #[test]
    fn test_build_reports_running_tile_count() {
        let archive = zip_of(&[
            ("a.png", png_bytes(Rgb([10, 10, 10]))),
            ("broken.png", vec![0xde, 0xad]),
            ("b.png", png_bytes(Rgb([200, 200, 200]))),
        ]);

        let mut counts = Vec::new();
        build_material_index(
            &archive,
            &IngestLimits::default(),
            &CancellationToken::new(),
            |_, accepted| counts.push(accepted),
        )
        .unwrap();

        assert_eq!(counts, vec![1, 1, 2]);
    }

    #[test]
    fn test_build_material_index_empty_archive() {
        let archive = zip_of(&[("readme.txt", b"not an image".to_vec())]);
        let err = build_material_index(
            &archive,
            &IngestLimits::default(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .unwrap_err();
        assert!(matches!(err, MosaicError::ResourceExhausted(_)));
    }

    #[test]
    fn test_build_material_index_corrupt_archive() {
        let err = build_material_index(
            &[1, 2, 3, 4],
            &IngestLimits::default(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .unwrap_err();
        assert!(matches!(err, MosaicError::InvalidInput(_)));
    }
}
