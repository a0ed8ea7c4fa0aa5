//! Mosaic grid geometry and row-major tile enumeration
//!
//! The input photo is resampled to exactly `cols * tile_width` by
//! `rows * tile_height`, so the grid covers it with no remainder. Tile `i`
//! sits at column `i % cols` and row `i / cols`; every later stage relies
//! on this ordering to place results.

use crate::color::extraction::Region;
use crate::io::error::{Result, invalid_parameter};
use image::RgbImage;
use image::imageops::{self, FilterType};

/// One cell of the mosaic grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    /// Flat row-major index
    pub index: usize,
    /// Grid column
    pub column: u32,
    /// Grid row
    pub row: u32,
    /// Pixel rectangle inside the resized canvas
    pub region: Region,
}

/// Uniform grid of equally sized tiles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MosaicGrid {
    cols: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
}

impl MosaicGrid {
    /// Create a grid from explicit dimensions
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any dimension is zero or the canvas
    /// would not fit in `u32` pixels
    pub fn new(cols: u32, rows: u32, tile_width: u32, tile_height: u32) -> Result<Self> {
        for (parameter, value) in [
            ("cols", cols),
            ("rows", rows),
            ("tile_width", tile_width),
            ("tile_height", tile_height),
        ] {
            if value == 0 {
                return Err(invalid_parameter(parameter, &value, &"must be at least 1"));
            }
        }
        if cols.checked_mul(tile_width).is_none() || rows.checked_mul(tile_height).is_none() {
            return Err(invalid_parameter(
                "grid",
                &format!("{cols}x{rows} of {tile_width}x{tile_height}"),
                &"canvas exceeds the maximum image size",
            ));
        }
        Ok(Self {
            cols,
            rows,
            tile_width,
            tile_height,
        })
    }

    /// Derive the grid for an image of `image_size` pixels
    ///
    /// `cols = max(1, round(width / tile_width * scale))`, likewise for rows.
    /// Larger `scale` gives more, smaller-looking tiles.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the image or tile size is zero, or
    /// `scale` is not a positive finite number
    pub fn compute(image_size: (u32, u32), tile_size: (u32, u32), scale: f64) -> Result<Self> {
        let (width, height) = image_size;
        let (tile_width, tile_height) = tile_size;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(invalid_parameter(
                "scale",
                &scale,
                &"must be a positive finite number",
            ));
        }
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "image_size",
                &format!("{width}x{height}"),
                &"image has no pixels",
            ));
        }
        if tile_width == 0 || tile_height == 0 {
            return Err(invalid_parameter(
                "tile_size",
                &format!("{tile_width}x{tile_height}"),
                &"tiles must be at least 1x1",
            ));
        }

        let cols = cell_count(width, tile_width, scale)?;
        let rows = cell_count(height, tile_height, scale)?;
        Self::new(cols, rows, tile_width, tile_height)
    }

    /// Number of grid columns
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Number of grid rows
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile size as `(width, height)`
    pub const fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Total number of tiles
    pub const fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Canvas size as `(cols * tile_width, rows * tile_height)`
    pub const fn canvas_size(&self) -> (u32, u32) {
        (self.cols * self.tile_width, self.rows * self.tile_height)
    }

    /// Grid `(column, row)` of a flat tile index
    pub const fn grid_coordinate(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.tile_count() {
            return None;
        }
        let cols = self.cols as usize;
        Some(((index % cols) as u32, (index / cols) as u32))
    }

    /// Top-left pixel `(x, y)` of a flat tile index
    pub const fn tile_origin(&self, index: usize) -> Option<(u32, u32)> {
        match self.grid_coordinate(index) {
            Some((column, row)) => Some((column * self.tile_width, row * self.tile_height)),
            None => None,
        }
    }

    /// Tile at a flat index
    pub const fn tile(&self, index: usize) -> Option<Tile> {
        match self.grid_coordinate(index) {
            Some((column, row)) => Some(Tile {
                index,
                column,
                row,
                region: Region::new(
                    column * self.tile_width,
                    row * self.tile_height,
                    self.tile_width,
                    self.tile_height,
                ),
            }),
            None => None,
        }
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = Tile> {
        let grid = *self;
        (0..grid.tile_count()).filter_map(move |index| grid.tile(index))
    }

    /// Resample `image` to exactly the canvas size with a Lanczos filter
    pub fn resize_to_canvas(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = self.canvas_size();
        if image.dimensions() == (width, height) {
            return image.clone();
        }
        imageops::resize(image, width, height, FilterType::Lanczos3)
    }
}

fn cell_count(pixels: u32, tile_pixels: u32, scale: f64) -> Result<u32> {
    let cells = (f64::from(pixels) / f64::from(tile_pixels) * scale).round();
    if cells > f64::from(u32::MAX) {
        return Err(invalid_parameter(
            "scale",
            &scale,
            &"produces more tiles than can be addressed",
        ));
    }
    Ok((cells as u32).max(1))
}
