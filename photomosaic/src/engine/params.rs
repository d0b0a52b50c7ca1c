//! Mosaic synthesis parameters.

use crate::error::MosaicError;

/// Smallest accepted cell edge, in pixels.
pub const MIN_TILE_SIZE: u32 = 8;

/// Largest accepted cell edge, in pixels.
pub const MAX_TILE_SIZE: u32 = 256;

/// Largest accepted no-repeat window.
pub const MAX_NO_REPEAT_K: usize = 500;

/// Immutable parameter bundle for one synthesis run.
///
/// Validated once before a job starts; the engine assumes a validated
/// bundle.
///
/// # Example
///
/// ```
/// use photomosaic::engine::MosaicParams;
///
/// let params = MosaicParams::new(32)
///     .with_no_repeat_k(30)
///     .with_color_strength(0.35);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct MosaicParams {
    /// Edge length of each output cell, in pixels.
    pub tile_size: u32,

    /// Minimum scan-order distance before a tile id may be reused.
    /// Zero disables the constraint.
    pub no_repeat_k: usize,

    /// Blend factor pulling tile pixels toward the cell's average target
    /// color. 0 = tile verbatim, 1 = flat cell-average color.
    pub color_strength: f32,

    /// Uniform blend of the original target over the finished mosaic.
    /// 0 = no blend, 1 = output equals the target.
    pub overlay_strength: f32,
}

impl MosaicParams {
    /// Creates a parameter bundle with the given tile size and all
    /// optional effects disabled.
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            no_repeat_k: 0,
            color_strength: 0.0,
            overlay_strength: 0.0,
        }
    }

    /// Sets the no-repeat window.
    pub fn with_no_repeat_k(mut self, k: usize) -> Self {
        self.no_repeat_k = k;
        self
    }

    /// Sets the color correction strength.
    pub fn with_color_strength(mut self, strength: f32) -> Self {
        self.color_strength = strength;
        self
    }

    /// Sets the overlay blend strength.
    pub fn with_overlay_strength(mut self, strength: f32) -> Self {
        self.overlay_strength = strength;
        self
    }

    /// Validates all parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::InvalidInput`] naming the offending
    /// parameter.
    pub fn validate(&self) -> Result<(), MosaicError> {
        if self.tile_size < MIN_TILE_SIZE || self.tile_size > MAX_TILE_SIZE {
            return Err(MosaicError::InvalidInput(format!(
                "tile_size must be between {} and {}, got {}",
                MIN_TILE_SIZE, MAX_TILE_SIZE, self.tile_size
            )));
        }
        if self.no_repeat_k > MAX_NO_REPEAT_K {
            return Err(MosaicError::InvalidInput(format!(
                "no_repeat_k must be at most {}, got {}",
                MAX_NO_REPEAT_K, self.no_repeat_k
            )));
        }
        if !(0.0..=1.0).contains(&self.color_strength) {
            return Err(MosaicError::InvalidInput(format!(
                "color_strength must be within [0, 1], got {}",
                self.color_strength
            )));
        }
        if !(0.0..=1.0).contains(&self.overlay_strength) {
            return Err(MosaicError::InvalidInput(format!(
                "overlay_strength must be within [0, 1], got {}",
                self.overlay_strength
            )));
        }
        Ok(())
    }
}
