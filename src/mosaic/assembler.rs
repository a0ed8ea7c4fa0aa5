//! Photomosaic assembly pipeline
//!
//! Stages run strictly in order:
//! `Loaded -> GridComputed -> Tiled -> ColorsComputed -> Matched -> Composed -> Saved`.
//! Tile colors are computed on the worker pool; composition and the tile
//! cache stay on the calling thread.

use crate::color::extraction::ColorExtractor;
use crate::color::point::ColorPoint;
use crate::io::configuration::MosaicConfig;
use crate::io::error::{MosaicError, Result};
use crate::io::image::{load_source_image, save_canvas};
use crate::io::progress::ProgressManager;
use crate::io::workers::worker_pool;
use crate::mosaic::cache::{ImageTileLoader, TileCache, TileLoader, placeholder_tile};
use crate::mosaic::grid::{MosaicGrid, Tile};
use crate::spatial::index::ColorIndex;
use image::RgbImage;
use image::imageops;
use rayon::prelude::*;
use std::fmt;
use std::path::Path;

/// Pipeline stage reached by an assembly run
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssemblyStage {
    /// Source photo decoded
    Loaded,
    /// Grid derived and photo resampled to the canvas size
    GridComputed,
    /// Canvas partitioned into tiles
    Tiled,
    /// One color measured per tile
    ColorsComputed,
    /// One reference item chosen per tile
    Matched,
    /// Output canvas filled
    Composed,
    /// Output canvas written to disk
    Saved,
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::GridComputed => "grid computed",
            Self::Tiled => "tiled",
            Self::ColorsComputed => "colors computed",
            Self::Matched => "matched",
            Self::Composed => "composed",
            Self::Saved => "saved",
        };
        f.write_str(name)
    }
}

/// Result of an assembly run
#[derive(Clone, Debug, PartialEq)]
pub struct Mosaic {
    /// Finished output raster
    pub canvas: RgbImage,
    /// Grid the canvas was divided into
    pub grid: MosaicGrid,
    /// Index position of the matched reference item, per tile in row-major order
    pub placements: Vec<usize>,
}

impl Mosaic {
    /// Index position placed at grid cell `(column, row)`
    pub fn placement(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.grid.cols() || row >= self.grid.rows() {
            return None;
        }
        let index = row as usize * self.grid.cols() as usize + column as usize;
        self.placements.get(index).copied()
    }
}

/// Builds photomosaics against a fixed color index
pub struct MosaicAssembler<'a, L = ImageTileLoader> {
    index: &'a ColorIndex,
    extractor: ColorExtractor,
    tile_size: (u32, u32),
    pool: rayon::ThreadPool,
    cache: TileCache<L>,
    progress: ProgressManager,
}

impl<'a> MosaicAssembler<'a, ImageTileLoader> {
    /// Assembler decoding reference images from disk
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid
    pub fn new(index: &'a ColorIndex, config: &MosaicConfig) -> Result<Self> {
        Self::with_loader(index, config, ImageTileLoader)
    }
}

impl<'a, L: TileLoader> MosaicAssembler<'a, L> {
    /// Assembler using a custom tile loader
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid
    pub fn with_loader(index: &'a ColorIndex, config: &MosaicConfig, loader: L) -> Result<Self> {
        config.validate()?;
        if index.is_empty() {
            return Err(MosaicError::EmptyIndex);
        }
        Ok(Self {
            index,
            extractor: ColorExtractor::from_config(config)?,
            tile_size: config.tile_size(),
            pool: worker_pool(config.workers)?,
            cache: TileCache::new(loader, config.tile_size()),
            progress: ProgressManager::hidden(),
        })
    }

    /// Report stage progress through `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressManager) -> Self {
        self.progress = progress;
        self
    }

    /// Tile cache accumulated over this assembler's runs
    pub const fn cache(&self) -> &TileCache<L> {
        &self.cache
    }

    /// Load a photo, assemble its mosaic and write it to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if the photo cannot be decoded, the grid is invalid
    /// or the output cannot be written
    pub fn create_mosaic<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input: P,
        scale: f64,
        output: Q,
    ) -> Result<RgbImage> {
        let input = input.as_ref();
        let output = output.as_ref();

        let image = load_source_image(input)?;
        tracing::info!(
            stage = %AssemblyStage::Loaded,
            path = %input.display(),
            width = image.width(),
            height = image.height()
        );

        let mosaic = self.assemble(&image, scale)?;

        save_canvas(&mosaic.canvas, output)?;
        tracing::info!(stage = %AssemblyStage::Saved, path = %output.display());
        Ok(mosaic.canvas)
    }

    /// Run every in-memory stage on an already decoded photo
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the grid cannot be derived
    pub fn assemble(&mut self, image: &RgbImage, scale: f64) -> Result<Mosaic> {
        let (grid, resized) = self.prepare(image, scale)?;
        let colors = self.tile_colors(&grid, &resized);
        let placements = self.match_tiles(&colors)?;
        let canvas = self.compose(&grid, &placements);
        Ok(Mosaic {
            canvas,
            grid,
            placements,
        })
    }

    /// Derive the grid and resample the photo to the canvas size
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero-size photo or invalid scale
    pub fn prepare(&self, image: &RgbImage, scale: f64) -> Result<(MosaicGrid, RgbImage)> {
        let grid = MosaicGrid::compute(image.dimensions(), self.tile_size, scale)?;
        let resized = grid.resize_to_canvas(image);
        let (width, height) = grid.canvas_size();
        tracing::info!(
            stage = %AssemblyStage::GridComputed,
            cols = grid.cols(),
            rows = grid.rows(),
            width,
            height
        );
        Ok((grid, resized))
    }

    /// Measure one color per tile of the resized photo, in tile order
    pub fn tile_colors(&self, grid: &MosaicGrid, resized: &RgbImage) -> Vec<ColorPoint> {
        let tiles: Vec<Tile> = grid.tiles().collect();
        tracing::info!(stage = %AssemblyStage::Tiled, tiles = tiles.len());

        let bar = self.progress.stage("Tile colors", tiles.len());
        let extractor = &self.extractor;
        let colors: Vec<ColorPoint> = self.pool.install(|| {
            tiles
                .par_iter()
                .map(|tile| {
                    let color = extractor.region_color(resized, tile.region);
                    bar.inc(1);
                    color
                })
                .collect()
        });
        bar.finish();

        tracing::info!(stage = %AssemblyStage::ColorsComputed, colors = colors.len());
        colors
    }

    /// Choose the nearest reference item for each tile color
    ///
    /// # Errors
    ///
    /// Returns `EmptyIndex` if the index yields no neighbour
    pub fn match_tiles(&self, colors: &[ColorPoint]) -> Result<Vec<usize>> {
        let placements: Vec<usize> = self
            .index
            .nearest_batch(colors)?
            .into_iter()
            .map(|neighbor| neighbor.index)
            .collect();

        let mut distinct = placements.clone();
        distinct.sort_unstable();
        distinct.dedup();
        tracing::info!(
            stage = %AssemblyStage::Matched,
            tiles = placements.len(),
            distinct_items = distinct.len()
        );
        Ok(placements)
    }

    /// Paste each matched reference image into its cell of a blank canvas
    pub fn compose(&mut self, grid: &MosaicGrid, placements: &[usize]) -> RgbImage {
        let (width, height) = grid.canvas_size();
        let (tile_width, tile_height) = grid.tile_size();
        let mut canvas = RgbImage::new(width, height);
        let index = self.index;

        let bar = self.progress.stage("Placing cards", placements.len());
        for (tile_index, &item_index) in placements.iter().enumerate() {
            let Some((x, y)) = grid.tile_origin(tile_index) else {
                continue;
            };
            match index.item(item_index) {
                Some(item) => {
                    let tile = self.cache.get_or_load(item.image_path());
                    imageops::replace(&mut canvas, tile, i64::from(x), i64::from(y));
                }
                None => {
                    let tile = placeholder_tile(tile_width, tile_height);
                    imageops::replace(&mut canvas, &tile, i64::from(x), i64::from(y));
                }
            }
            bar.inc(1);
        }
        bar.finish();

        tracing::info!(stage = %AssemblyStage::Composed, width, height);
        tracing::debug!(
            hits = self.cache.stats.hits,
            misses = self.cache.stats.misses,
            failures = self.cache.stats.failures,
            "Tile cache"
        );
        canvas
    }
}
