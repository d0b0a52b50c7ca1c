//! The mosaic synthesis loop.
//!
//! For each grid cell in scan order: average the target region, pick the
//! nearest tile (honoring the no-repeat window), resize it to the cell,
//! color-correct toward the cell average, and composite. After all cells
//! are placed the original target can be blended back over the mosaic.
//!
//! Progress is reported as completed cells scaled into `[0, 99]`; 100 is
//! reserved for full completion including result encoding, which the
//! scheduler reports. Cancellation is checked between cells, never inside
//! one, so the loop yields promptly without tearing a cell.

use super::grid::CellGrid;
use super::params::MosaicParams;
use super::selector::RepeatWindow;
use super::target::TargetImage;
use crate::color::{average_color_region, lerp};
use crate::error::MosaicError;
use crate::index::{TileId, TileIndex};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// JPEG quality used for encoded mosaic results.
const RESULT_JPEG_QUALITY: u8 = 92;

/// Synthesizes a mosaic of `target` from the tiles in `index`.
///
/// The returned image always has the target's exact dimensions; truncated
/// edge cells are cropped, never omitted.
///
/// # Errors
///
/// - [`MosaicError::InvalidInput`] for out-of-range parameters
/// - [`MosaicError::PreconditionFailed`] for an empty tile index
/// - [`MosaicError::Cancelled`] when `cancel` fires between cells
pub fn synthesize<F>(
    target: &TargetImage,
    index: &TileIndex,
    params: &MosaicParams,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<RgbImage, MosaicError>
where
    F: FnMut(u8),
{
    params.validate()?;
    if index.is_empty() {
        return Err(MosaicError::PreconditionFailed(
            "tile index holds no tiles".to_string(),
        ));
    }

    let source = target.as_rgb();
    let grid = CellGrid::new(target.width(), target.height(), params.tile_size);
    let total_cells = grid.cell_count();
    let mut output = RgbImage::new(target.width(), target.height());

    // Tiles resized to the full cell edge, reused across cells within this
    // run only; the index itself stays untouched.
    let mut resized: HashMap<TileId, RgbImage> = HashMap::new();
    let mut window = RepeatWindow::new(params.no_repeat_k);

    debug!(
        cells = total_cells,
        tile_size = params.tile_size,
        no_repeat_k = params.no_repeat_k,
        "starting mosaic synthesis"
    );

    for (done, cell) in grid.cells().enumerate() {
        if cancel.is_cancelled() {
            return Err(MosaicError::Cancelled);
        }

        let cell_average = average_color_region(source, cell.x, cell.y, cell.width, cell.height);

        let chosen = if params.no_repeat_k > 0 {
            index.nearest_avoiding(cell_average, window.forbidden())
        } else {
            index.nearest(cell_average)
        }
        .ok_or_else(|| {
            MosaicError::PreconditionFailed("tile index holds no tiles".to_string())
        })?;

        let tile_pixels = resized.entry(chosen).or_insert_with(|| {
            // Ids come from this index, so the descriptor is present.
            let thumbnail = &index
                .get(chosen)
                .expect("tile id produced by this index")
                .thumbnail;
            image::imageops::resize(
                thumbnail,
                params.tile_size,
                params.tile_size,
                FilterType::Lanczos3,
            )
        });

        for dy in 0..cell.height {
            for dx in 0..cell.width {
                let tile_px = *tile_pixels.get_pixel(dx, dy);
                let corrected = if params.color_strength > 0.0 {
                    lerp(tile_px, cell_average, params.color_strength)
                } else {
                    tile_px
                };
                output.put_pixel(cell.x + dx, cell.y + dy, corrected);
            }
        }

        if params.no_repeat_k > 0 {
            window.record(chosen);
        }

        on_progress((((done + 1) * 99) / total_cells) as u8);
    }

    if params.overlay_strength > 0.0 {
        if cancel.is_cancelled() {
            return Err(MosaicError::Cancelled);
        }
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            *pixel = lerp(*pixel, *source.get_pixel(x, y), params.overlay_strength);
        }
    }

    debug!(tiles_used = resized.len(), "mosaic synthesis complete");
    Ok(output)
}

/// Encodes a finished mosaic as JPEG bytes for retrieval.
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, MosaicError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, RESULT_JPEG_QUALITY)
        .encode_image(image)
        .map_err(|err| MosaicError::Internal(format!("result encoding failed: {}", err)))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use image::Rgb;
    use std::io::Cursor;

    fn index_of_colors(colors: &[Rgb<u8>]) -> TileIndex {
        let entries: Vec<(String, Vec<u8>)> = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let img = RgbImage::from_pixel(8, 8, c);
                let mut bytes = Vec::new();
                img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                    .unwrap();
                (format!("{}.png", i), bytes)
            })
            .collect();
        IndexBuilder::new(8).build(entries).unwrap()
    }

    fn quad_target() -> TargetImage {
        // Four 8×8 quadrants: black, red, green, white
        let img = RgbImage::from_fn(16, 16, |x, y| match (x < 8, y < 8) {
            (true, true) => Rgb([0, 0, 0]),
            (false, true) => Rgb([255, 0, 0]),
            (true, false) => Rgb([0, 255, 0]),
            (false, false) => Rgb([255, 255, 255]),
        });
        TargetImage::from_image(img)
    }

    #[test]
    fn test_output_matches_target_dimensions() {
        let target = TargetImage::from_image(RgbImage::from_pixel(100, 70, Rgb([50, 50, 50])));
        let index = index_of_colors(&[Rgb([50, 50, 50])]);
        let params = MosaicParams::new(32);

        let out = synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap();
        assert_eq!(out.dimensions(), (100, 70));
    }

    #[test]
    fn test_color_strength_zero_keeps_tile_colors() {
        let target = quad_target();
        let tile_color = Rgb([40, 80, 120]);
        let index = index_of_colors(&[tile_color]);
        let params = MosaicParams::new(8).with_color_strength(0.0);

        let out = synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap();
        // The single uniform tile must appear verbatim in every cell.
        for pixel in out.pixels() {
            assert_eq!(*pixel, tile_color);
        }
    }

    #[test]
    fn test_color_strength_one_flattens_to_cell_average() {
        let target = quad_target();
        let index = index_of_colors(&[Rgb([40, 80, 120])]);
        let params = MosaicParams::new(8).with_color_strength(1.0);

        let out = synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap();
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(15, 0), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(0, 15), Rgb([0, 255, 0]));
        assert_eq!(*out.get_pixel(15, 15), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_overlay_strength_one_reproduces_target() {
        let target = quad_target();
        let index = index_of_colors(&[Rgb([10, 20, 30]), Rgb([200, 100, 50])]);
        let params = MosaicParams::new(8).with_overlay_strength(1.0);

        let out = synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap();
        for (x, y, pixel) in out.enumerate_pixels() {
            assert_eq!(pixel, target.as_rgb().get_pixel(x, y));
        }
    }

    #[test]
    fn test_overlay_strength_zero_is_noop() {
        let target = quad_target();
        let index = index_of_colors(&[Rgb([10, 20, 30])]);
        let plain = MosaicParams::new(8);
        let with_overlay = MosaicParams::new(8).with_overlay_strength(0.0);

        let a = synthesize(&target, &index, &plain, &CancellationToken::new(), |_| {}).unwrap();
        let b = synthesize(
            &target,
            &index,
            &with_overlay,
            &CancellationToken::new(),
            |_| {},
        )
        .unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_progress_is_monotonic_and_capped_at_99() {
        let target = TargetImage::from_image(RgbImage::from_pixel(64, 64, Rgb([128, 128, 128])));
        let index = index_of_colors(&[Rgb([128, 128, 128])]);
        let params = MosaicParams::new(16);

        let mut reports = Vec::new();
        synthesize(&target, &index, &params, &CancellationToken::new(), |p| {
            reports.push(p)
        })
        .unwrap();

        assert!(!reports.is_empty());
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*reports.last().unwrap(), 99);
    }

    #[test]
    fn test_no_repeat_window_bounds_reuse() {
        // Three near-identical tiles, uniform target: every cell is nearest
        // to tile 0, but K=2 forces rotation through the alternatives.
        let target = TargetImage::from_image(RgbImage::from_pixel(80, 16, Rgb([100, 100, 100])));
        let index = index_of_colors(&[
            Rgb([100, 100, 100]),
            Rgb([101, 101, 101]),
            Rgb([102, 102, 102]),
        ]);
        let params = MosaicParams::new(16).with_no_repeat_k(2).with_color_strength(0.0);

        let out = synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap();

        // Recover the assignment sequence from each cell's rendered color.
        let assigned: Vec<u8> = (0..5).map(|i| out.get_pixel(i * 16, 0).0[0] - 100).collect();
        for window in assigned.windows(3) {
            let mut distinct: Vec<u8> = window.to_vec();
            distinct.sort_unstable();
            distinct.dedup();
            assert!(
                distinct.len() >= 2,
                "window {:?} reuses one tile too densely",
                window
            );
        }
        // And no id may repeat within any 3 consecutive assignments.
        for window in assigned.windows(3) {
            assert_ne!(window[0], window[1]);
            assert_ne!(window[1], window[2]);
            assert_ne!(window[0], window[2]);
        }
    }

    #[test]
    fn test_no_repeat_zero_allows_adjacent_reuse() {
        let target = TargetImage::from_image(RgbImage::from_pixel(32, 16, Rgb([100, 100, 100])));
        let index = index_of_colors(&[Rgb([100, 100, 100]), Rgb([200, 200, 200])]);
        let params = MosaicParams::new(16);

        let out = synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap();
        assert_eq!(*out.get_pixel(0, 0), *out.get_pixel(16, 0));
    }

    #[test]
    fn test_empty_index_is_precondition_failure() {
        // An index can't be built empty, so exercise the guard through the
        // params path instead: a valid index with an invalid tile size.
        let target = quad_target();
        let index = index_of_colors(&[Rgb([1, 1, 1])]);
        let params = MosaicParams::new(4); // below MIN_TILE_SIZE

        let err =
            synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap_err();
        assert!(matches!(err, MosaicError::InvalidInput(_)));
    }

    #[test]
    fn test_cancellation_between_cells() {
        let target = TargetImage::from_image(RgbImage::from_pixel(64, 64, Rgb([1, 1, 1])));
        let index = index_of_colors(&[Rgb([1, 1, 1])]);
        let params = MosaicParams::new(8);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = synthesize(&target, &index, &params, &cancel, |_| {}).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_truncated_cells_are_filled() {
        let target = TargetImage::from_image(RgbImage::from_pixel(20, 20, Rgb([77, 77, 77])));
        let index = index_of_colors(&[Rgb([77, 77, 77])]);
        let params = MosaicParams::new(16).with_color_strength(1.0);

        let out = synthesize(&target, &index, &params, &CancellationToken::new(), |_| {}).unwrap();
        // Remainder strip pixels must be written, not left at default black.
        assert_eq!(*out.get_pixel(19, 19), Rgb([77, 77, 77]));
    }

    #[test]
    fn test_encode_jpeg_round_trips_dimensions() {
        let img = RgbImage::from_pixel(24, 18, Rgb([10, 200, 30]));
        let bytes = encode_jpeg(&img).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 24);
        assert_eq!(decoded.height(), 18);
    }
}
