//! Tile loaders and the per-run cache of resized reference images

use crate::io::configuration::PLACEHOLDER_COLOR;
use crate::io::error::{MosaicError, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Produces a reference image resized to the tile size
pub trait TileLoader {
    /// Decode the image at `path` and resize it to `width` x `height`
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded
    fn load(&self, path: &Path, width: u32, height: u32) -> Result<RgbImage>;
}

/// Loader decoding files from disk with Lanczos resampling
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageTileLoader;

impl TileLoader for ImageTileLoader {
    fn load(&self, path: &Path, width: u32, height: u32) -> Result<RgbImage> {
        let decoded = image::open(path).map_err(|e| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(imageops::resize(
            &decoded.to_rgb8(),
            width,
            height,
            FilterType::Lanczos3,
        ))
    }
}

/// Solid fill substituted for reference images that cannot be decoded
pub fn placeholder_tile(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(PLACEHOLDER_COLOR))
}

/// Performance metrics for cache effectiveness
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses (each one a loader call)
    pub misses: usize,
    /// Misses whose image could not be decoded
    pub failures: usize,
}

/// Resized tile images keyed by reference image path
///
/// Lives for one mosaic run and never evicts; the catalog bounds its size.
/// Undecodable images are stored as placeholders so each bad file is
/// reported once.
pub struct TileCache<L> {
    loader: L,
    tile_size: (u32, u32),
    tiles: HashMap<PathBuf, RgbImage>,

    /// Cache performance statistics
    pub stats: CacheStats,
}

impl<L: TileLoader> TileCache<L> {
    /// Create an empty cache producing tiles of `tile_size`
    pub fn new(loader: L, tile_size: (u32, u32)) -> Self {
        Self {
            loader,
            tile_size,
            tiles: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Loader backing the cache
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Number of distinct images held
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no image has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Retrieve the resized tile for `path`, loading it on first use
    pub fn get_or_load(&mut self, path: &Path) -> &RgbImage {
        use std::collections::hash_map::Entry;

        let (width, height) = self.tile_size;
        match self.tiles.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.stats.misses += 1;
                let tile = match self.loader.load(path, width, height) {
                    Ok(tile) if tile.dimensions() == (width, height) => tile,
                    Ok(tile) => imageops::resize(&tile, width, height, FilterType::Lanczos3),
                    Err(error) => {
                        tracing::warn!(%error, "Tile image unreadable, using placeholder");
                        self.stats.failures += 1;
                        placeholder_tile(width, height)
                    }
                };
                entry.insert(tile)
            }
        }
    }
}
