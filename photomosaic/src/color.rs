//! Color math shared by the tile index and the synthesis engine.
//!
//! All comparisons use squared Euclidean distance in sRGB. That is cheap,
//! deterministic, and sufficient for average-color matching; no perceptual
//! color space conversion is performed.

use image::{Rgb, RgbImage};

/// Quantization step for the color-bin candidate index.
pub const BIN_QUANT: u8 = 8;

/// Computes the exact mean color of an image region.
///
/// Sums are accumulated in `u64` so arbitrarily large regions cannot
/// overflow. An empty image yields black.
pub fn average_color(image: &RgbImage) -> Rgb<u8> {
    let pixel_count = (image.width() as u64) * (image.height() as u64);
    if pixel_count == 0 {
        return Rgb([0, 0, 0]);
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        sums[0] += pixel.0[0] as u64;
        sums[1] += pixel.0[1] as u64;
        sums[2] += pixel.0[2] as u64;
    }

    Rgb([
        (sums[0] / pixel_count) as u8,
        (sums[1] / pixel_count) as u8,
        (sums[2] / pixel_count) as u8,
    ])
}

/// Computes the mean color of a rectangular window of an image.
///
/// The window must lie within the image bounds.
pub fn average_color_region(image: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> Rgb<u8> {
    let pixel_count = (w as u64) * (h as u64);
    if pixel_count == 0 {
        return Rgb([0, 0, 0]);
    }

    let mut sums = [0u64; 3];
    for py in y..y + h {
        for px in x..x + w {
            let pixel = image.get_pixel(px, py);
            sums[0] += pixel.0[0] as u64;
            sums[1] += pixel.0[1] as u64;
            sums[2] += pixel.0[2] as u64;
        }
    }

    Rgb([
        (sums[0] / pixel_count) as u8,
        (sums[1] / pixel_count) as u8,
        (sums[2] / pixel_count) as u8,
    ])
}

/// Squared Euclidean distance between two sRGB colors.
///
/// Maximum value is 3 * 255^2 = 195,075, well within `u32`.
#[inline]
pub fn distance_squared(a: Rgb<u8>, b: Rgb<u8>) -> u32 {
    let dr = a.0[0] as i32 - b.0[0] as i32;
    let dg = a.0[1] as i32 - b.0[1] as i32;
    let db = a.0[2] as i32 - b.0[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Per-channel linear interpolation from `a` toward `b`.
///
/// `t = 0.0` returns `a` exactly; `t = 1.0` returns `b` exactly.
#[inline]
pub fn lerp(a: Rgb<u8>, b: Rgb<u8>, t: f32) -> Rgb<u8> {
    Rgb([
        lerp_channel(a.0[0], b.0[0], t),
        lerp_channel(a.0[1], b.0[1], t),
        lerp_channel(a.0[2], b.0[2], t),
    ])
}

#[inline]
fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    let v = a as f32 + (b as f32 - a as f32) * t;
    v.round().clamp(0.0, 255.0) as u8
}

/// Quantizes a color into a coarse bin key for the candidate index.
#[inline]
pub fn bin_key(rgb: Rgb<u8>) -> (u8, u8, u8) {
    (
        rgb.0[0] / BIN_QUANT,
        rgb.0[1] / BIN_QUANT,
        rgb.0[2] / BIN_QUANT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_color_uniform() {
        let img = RgbImage::from_pixel(10, 10, Rgb([100, 150, 200]));
        assert_eq!(average_color(&img), Rgb([100, 150, 200]));
    }

    #[test]
    fn test_average_color_mixed() {
        // Half black, half white
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        assert_eq!(average_color(&img), Rgb([127, 127, 127]));
    }

    #[test]
    fn test_average_color_empty() {
        let img = RgbImage::new(0, 0);
        assert_eq!(average_color(&img), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_average_color_region() {
        let img = RgbImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgb([10, 10, 10])
            } else {
                Rgb([200, 200, 200])
            }
        });
        assert_eq!(average_color_region(&img, 0, 0, 2, 4), Rgb([10, 10, 10]));
        assert_eq!(average_color_region(&img, 2, 0, 2, 4), Rgb([200, 200, 200]));
        assert_eq!(average_color_region(&img, 0, 0, 4, 4), Rgb([105, 105, 105]));
    }

    #[test]
    fn test_distance_squared() {
        assert_eq!(distance_squared(Rgb([0, 0, 0]), Rgb([0, 0, 0])), 0);
        assert_eq!(distance_squared(Rgb([1, 2, 3]), Rgb([4, 6, 3])), 9 + 16);
        assert_eq!(
            distance_squared(Rgb([0, 0, 0]), Rgb([255, 255, 255])),
            3 * 255 * 255
        );
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb([10, 20, 30]);
        let b = Rgb([200, 100, 0]);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Rgb([0, 0, 0]);
        let b = Rgb([100, 200, 50]);
        assert_eq!(lerp(a, b, 0.5), Rgb([50, 100, 25]));
    }

    #[test]
    fn test_bin_key() {
        assert_eq!(bin_key(Rgb([0, 7, 8])), (0, 0, 1));
        assert_eq!(bin_key(Rgb([255, 128, 64])), (31, 16, 8));
    }
}
