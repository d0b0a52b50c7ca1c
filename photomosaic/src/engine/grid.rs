//! Cell grid partitioning of the target image.
//!
//! The target is divided into cells of the configured tile size in
//! row-major order. The final row and column may be truncated remainder
//! cells; they are still assigned tiles, cropped to fit, so the output
//! always covers the full target area.

/// One grid partition of the target image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Left edge in target pixels.
    pub x: u32,
    /// Top edge in target pixels.
    pub y: u32,
    /// Cell width; equals the tile size except in the last column.
    pub width: u32,
    /// Cell height; equals the tile size except in the last row.
    pub height: u32,
}

impl Cell {
    /// Returns true if this cell is smaller than a full tile.
    pub fn is_truncated(&self, tile_size: u32) -> bool {
        self.width != tile_size || self.height != tile_size
    }
}

/// Row-major cell partition of a `width × height` image.
#[derive(Clone, Copy, Debug)]
pub struct CellGrid {
    width: u32,
    height: u32,
    tile_size: u32,
}

impl CellGrid {
    /// Creates a grid over the given image dimensions.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        debug_assert!(tile_size > 0);
        Self {
            width,
            height,
            tile_size,
        }
    }

    /// Number of cell columns (ceiling division).
    pub fn columns(&self) -> u32 {
        self.width.div_ceil(self.tile_size)
    }

    /// Number of cell rows (ceiling division).
    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.tile_size)
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        (self.columns() as usize) * (self.rows() as usize)
    }

    /// Iterates over cells in row-major scan order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let tile_size = self.tile_size;
        let (width, height) = (self.width, self.height);
        (0..self.rows()).flat_map(move |row| {
            (0..width.div_ceil(tile_size)).map(move |col| {
                let x = col * tile_size;
                let y = row * tile_size;
                Cell {
                    x,
                    y,
                    width: tile_size.min(width - x),
                    height: tile_size.min(height - y),
                }
            })
        })
    }
}
