//! Archive unpacking for material uploads.
//!
//! Pulls individual image entries out of a ZIP archive. Non-image entries,
//! directories, oversized files, and path-traversal names are skipped and
//! counted, never fatal; only a corrupt archive aborts the unpack.

use crate::config::IngestLimits;
use crate::error::MosaicError;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

/// File extensions accepted as raster image entries.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Result of unpacking an archive: surviving entries plus a skip count.
#[derive(Debug)]
pub struct UnpackedArchive {
    /// (entry name, raw bytes) pairs in archive order.
    pub entries: Vec<(String, Vec<u8>)>,

    /// Entries ignored by the filters (directories, wrong extension,
    /// oversized, unsafe names).
    pub skipped: usize,
}

/// Unpacks a ZIP archive into image entries.
///
/// # Errors
///
/// - [`MosaicError::InvalidInput`] when the bytes are not a readable ZIP
///   archive or the entry count exceeds `limits.max_entries`.
pub fn unpack_archive(bytes: &[u8], limits: &IngestLimits) -> Result<UnpackedArchive, MosaicError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| MosaicError::InvalidInput(format!("unreadable archive: {}", err)))?;

    if archive.len() > limits.max_entries {
        return Err(MosaicError::InvalidInput(format!(
            "archive has too many entries: {} > {}",
            archive.len(),
            limits.max_entries
        )));
    }

    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(index = i, error = %err, "skipping unreadable archive entry");
                skipped += 1;
                continue;
            }
        };

        if entry.is_dir() {
            skipped += 1;
            continue;
        }

        let name = entry.name().replace('\\', "/");
        if !is_safe_name(&name) {
            warn!(entry = %name, "skipping archive entry with unsafe path");
            skipped += 1;
            continue;
        }
        if !has_allowed_extension(&name) {
            skipped += 1;
            continue;
        }
        if entry.size() > limits.max_entry_bytes {
            warn!(entry = %name, size = entry.size(), "skipping oversized archive entry");
            skipped += 1;
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        if let Err(err) = entry.read_to_end(&mut data) {
            warn!(entry = %name, error = %err, "skipping archive entry that failed to read");
            skipped += 1;
            continue;
        }

        entries.push((name, data));
    }

    debug!(
        entries = entries.len(),
        skipped, "archive unpacked"
    );

    Ok(UnpackedArchive { entries, skipped })
}

/// Rejects absolute paths and any `..` component.
fn is_safe_name(name: &str) -> bool {
    !name.starts_with('/') && !name.split('/').any(|part| part == "..")
}

fn has_allowed_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.iter().any(|allowed| *allowed == ext)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
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
    fn test_unpack_filters_by_extension() {
        let archive = zip_of(&[
            ("a.png", b"png-data"),
            ("b.JPG", b"jpg-data"),
            ("notes.txt", b"text"),
            ("c.webp", b"webp-data"),
        ]);

        let unpacked = unpack_archive(&archive, &IngestLimits::default()).unwrap();
        let names: Vec<&str> = unpacked.entries.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names, vec!["a.png", "b.JPG", "c.webp"]);
        assert_eq!(unpacked.skipped, 1);
    }

    #[test]
    fn test_unpack_rejects_traversal_names() {
        let archive = zip_of(&[("../evil.png", b"data"), ("ok.png", b"data")]);
        let unpacked = unpack_archive(&archive, &IngestLimits::default()).unwrap();

        assert_eq!(unpacked.entries.len(), 1);
        assert_eq!(unpacked.entries[0].0, "ok.png");
        assert_eq!(unpacked.skipped, 1);
    }

    #[test]
    fn test_unpack_nested_directories_kept_as_entries() {
        // Images inside subdirectories are valid entries; only the
        // directory records themselves are skipped.
        let archive = zip_of(&[("pets/cats/a.png", b"data")]);
        let unpacked = unpack_archive(&archive, &IngestLimits::default()).unwrap();
        assert_eq!(unpacked.entries.len(), 1);
    }

    #[test]
    fn test_unpack_corrupt_archive() {
        let err = unpack_archive(&[0xff, 0x00, 0x12], &IngestLimits::default()).unwrap_err();
        assert!(matches!(err, MosaicError::InvalidInput(_)));
    }

    #[test]
    fn test_unpack_entry_count_cap() {
        let archive = zip_of(&[("a.png", b"1"), ("b.png", b"2")]);
        let limits = IngestLimits::default().with_max_entries(1);
        let err = unpack_archive(&archive, &limits).unwrap_err();
        assert!(matches!(err, MosaicError::InvalidInput(_)));
    }

    #[test]
    fn test_unpack_oversized_entry_skipped() {
        let archive = zip_of(&[("big.png", &[0u8; 128]), ("small.png", b"ok")]);
        let limits = IngestLimits::default().with_max_entry_bytes(16);
        let unpacked = unpack_archive(&archive, &limits).unwrap();

        assert_eq!(unpacked.entries.len(), 1);
        assert_eq!(unpacked.entries[0].0, "small.png");
    }
}
