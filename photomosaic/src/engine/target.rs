//! Target image decoding.

use crate::error::MosaicError;
use image::RgbImage;

/// The photograph being reconstructed.
///
/// Decoded once, then read-only for the duration of its job.
#[derive(Debug)]
pub struct TargetImage {
    image: RgbImage,
}

impl TargetImage {
    /// Decodes a target from raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::InvalidInput`] for unsupported or corrupt
    /// data. This fires before any job progress is reported.
    pub fn decode(bytes: &[u8]) -> Result<Self, MosaicError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|err| MosaicError::InvalidInput(format!("unreadable target image: {}", err)))?;

        let image = decoded.to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(MosaicError::InvalidInput(
                "target image has zero area".to_string(),
            ));
        }

        Ok(Self { image })
    }

    /// Wraps an already-decoded RGB buffer.
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The decoded pixel buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }
}
