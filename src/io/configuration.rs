//! Pipeline constants and runtime configuration defaults

use crate::color::point::{ColorPoint, NEUTRAL_COLOR};
use crate::io::error::{Result, invalid_parameter};

// Tile geometry matches the aspect ratio of a standard trading card scan
/// Default tile width in pixels
pub const DEFAULT_TILE_WIDTH: u32 = 177;
/// Default tile height in pixels
pub const DEFAULT_TILE_HEIGHT: u32 = 250;

/// Default density multiplier applied to the tile grid
pub const DEFAULT_SCALE: f64 = 1.0;

/// Default number of points per k-d tree leaf
pub const DEFAULT_LEAF_SIZE: usize = 10;

/// Default size of the worker pool used for parallel stages
pub const DEFAULT_WORKERS: usize = 8;

/// Fraction cropped from each side of a reference image before color extraction
pub const REFERENCE_MARGIN: f32 = 0.10;

/// Margin crops at or beyond half the image would leave no pixels
pub const MAX_REFERENCE_MARGIN: f32 = 0.5;

/// Fill color used when a tile's reference image cannot be decoded
pub const PLACEHOLDER_COLOR: [u8; 3] = [0, 0, 0];

// Asset store conventions
/// Suffix appended to an item identifier to form its local image file name
pub const ASSET_IMAGE_SUFFIX: &str = "_sd.jpg";
/// Directory holding downloaded reference images
pub const DEFAULT_ASSET_DIR: &str = "data/images";

// Default data locations
/// Raw catalog document
pub const DEFAULT_CATALOG_PATH: &str = "data/json/pokemon_cards.json";
/// Catalog document enriched with colors and image paths
pub const DEFAULT_ENRICHED_CATALOG_PATH: &str = "data/json/pokemon_cards_labs.json";
/// Persisted color index blob
pub const DEFAULT_INDEX_PATH: &str = "data/kdtree/pokemon_kdtree.bin";
/// Finished mosaic
pub const DEFAULT_OUTPUT_PATH: &str = "data/output/mosaic_output.png";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Tunable parameters shared by catalog preparation and mosaic assembly
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MosaicConfig {
    /// Width of one mosaic cell in pixels
    pub tile_width: u32,
    /// Height of one mosaic cell in pixels
    pub tile_height: u32,
    /// Worker threads for parallel stages
    pub workers: usize,
    /// Points per k-d tree leaf
    pub leaf_size: usize,
    /// Fraction cropped from each side of reference images
    pub margin: f32,
    /// Color substituted when an image yields no pixels
    pub default_color: ColorPoint,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            workers: DEFAULT_WORKERS,
            leaf_size: DEFAULT_LEAF_SIZE,
            margin: REFERENCE_MARGIN,
            default_color: NEUTRAL_COLOR,
        }
    }
}

impl MosaicConfig {
    /// Tile dimensions as `(width, height)`
    pub const fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Check every parameter against its valid range
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the first parameter out of range
    pub fn validate(&self) -> Result<()> {
        if self.tile_width == 0 {
            return Err(invalid_parameter(
                "tile_width",
                &self.tile_width,
                &"must be at least 1 pixel",
            ));
        }
        if self.tile_height == 0 {
            return Err(invalid_parameter(
                "tile_height",
                &self.tile_height,
                &"must be at least 1 pixel",
            ));
        }
        if self.workers == 0 {
            return Err(invalid_parameter(
                "workers",
                &self.workers,
                &"worker pool needs at least one thread",
            ));
        }
        if self.leaf_size == 0 {
            return Err(invalid_parameter(
                "leaf_size",
                &self.leaf_size,
                &"leaves must hold at least one point",
            ));
        }
        validate_margin(self.margin)
    }
}

/// Check a margin fraction lies in `[0, 0.5)`
///
/// # Errors
///
/// Returns `InvalidParameter` if the margin is negative, too large or not finite
pub fn validate_margin(margin: f32) -> Result<()> {
    if margin.is_finite() && (0.0..MAX_REFERENCE_MARGIN).contains(&margin) {
        Ok(())
    } else {
        Err(invalid_parameter(
            "margin",
            &margin,
            &"must lie in [0, 0.5)",
        ))
    }
}
