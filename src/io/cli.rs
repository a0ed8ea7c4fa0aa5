//! Command-line interface sequencing catalog, index and mosaic steps

use crate::catalog::assets::LocalAssetStore;
use crate::catalog::source::{CatalogDocument, compute_colors};
use crate::color::extraction::ColorExtractor;
use crate::io::configuration::{
    DEFAULT_ASSET_DIR, DEFAULT_CATALOG_PATH, DEFAULT_ENRICHED_CATALOG_PATH, DEFAULT_INDEX_PATH,
    DEFAULT_LEAF_SIZE, DEFAULT_OUTPUT_PATH, DEFAULT_SCALE, DEFAULT_TILE_HEIGHT,
    DEFAULT_TILE_WIDTH, DEFAULT_WORKERS, MosaicConfig, REFERENCE_MARGIN,
};
use crate::io::error::Result;
use crate::io::progress::ProgressManager;
use crate::mosaic::assembler::MosaicAssembler;
use crate::spatial::index::ColorIndex;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cardmosaic")]
#[command(
    author,
    version,
    about = "Build photomosaics out of trading-card images"
)]
/// Command-line arguments for the mosaic tool
pub struct Cli {
    /// Step to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log detail (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Pipeline steps, usually run in the order listed
#[derive(Subcommand)]
pub enum Command {
    /// Measure every card's dominant color and write an enriched catalog
    Colors(ColorsArgs),
    /// Build the color index from an enriched catalog and save it
    Index(IndexArgs),
    /// Assemble a photomosaic for one input image
    Mosaic(MosaicArgs),
}

/// Arguments of the `colors` step
#[derive(Args)]
pub struct ColorsArgs {
    /// Catalog document to read
    #[arg(short, long, default_value = DEFAULT_CATALOG_PATH)]
    pub catalog: PathBuf,

    /// Enriched catalog document to write
    #[arg(short, long, default_value = DEFAULT_ENRICHED_CATALOG_PATH)]
    pub output: PathBuf,

    /// Directory of downloaded card images
    #[arg(long, default_value = DEFAULT_ASSET_DIR)]
    pub images: PathBuf,

    /// Worker threads for color extraction
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Fraction cropped from each side of a card before measuring
    #[arg(short, long, default_value_t = REFERENCE_MARGIN)]
    pub margin: f32,
}

/// Arguments of the `index` step
#[derive(Args)]
pub struct IndexArgs {
    /// Enriched catalog document to read
    #[arg(short, long, default_value = DEFAULT_ENRICHED_CATALOG_PATH)]
    pub catalog: PathBuf,

    /// Index blob to write
    #[arg(short, long, default_value = DEFAULT_INDEX_PATH)]
    pub output: PathBuf,

    /// Directory of downloaded card images
    #[arg(long, default_value = DEFAULT_ASSET_DIR)]
    pub images: PathBuf,

    /// Points per k-d tree leaf
    #[arg(short, long, default_value_t = DEFAULT_LEAF_SIZE)]
    pub leaf_size: usize,

    /// Worker threads for any colors still missing
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Fraction cropped from each side of a card before measuring
    #[arg(short, long, default_value_t = REFERENCE_MARGIN)]
    pub margin: f32,
}

/// Arguments of the `mosaic` step
#[derive(Args)]
pub struct MosaicArgs {
    /// Photo to turn into a mosaic
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Index blob to read
    #[arg(short, long, default_value = DEFAULT_INDEX_PATH)]
    pub index: PathBuf,

    /// Mosaic image to write
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Tile density multiplier (larger gives a finer mosaic)
    #[arg(short, long, default_value_t = DEFAULT_SCALE)]
    pub scale: f64,

    /// Tile width in pixels
    #[arg(long, default_value_t = DEFAULT_TILE_WIDTH)]
    pub tile_width: u32,

    /// Tile height in pixels
    #[arg(long, default_value_t = DEFAULT_TILE_HEIGHT)]
    pub tile_height: u32,

    /// Worker threads for tile color extraction
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
}

impl MosaicArgs {
    /// Pipeline configuration described by these arguments
    pub fn config(&self) -> MosaicConfig {
        MosaicConfig {
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            workers: self.workers,
            ..MosaicConfig::default()
        }
    }
}

/// Runs the selected step with progress reporting
pub struct CommandRunner {
    cli: Cli,
    progress: ProgressManager,
}

impl CommandRunner {
    /// Create a runner for the parsed arguments
    pub fn new(cli: Cli) -> Self {
        let progress = if cli.should_show_progress() {
            ProgressManager::new()
        } else {
            ProgressManager::hidden()
        };
        Self { cli, progress }
    }

    /// Parsed arguments
    pub const fn cli(&self) -> &Cli {
        &self.cli
    }

    /// Bars shared by every step; log output is routed through them
    pub const fn progress(&self) -> &ProgressManager {
        &self.progress
    }

    /// Run the selected step
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of the step: unreadable catalog or
    /// index, empty catalog, unreadable input photo, or failed write
    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();
        match &self.cli.command {
            Command::Colors(args) => self.run_colors(args)?,
            Command::Index(args) => self.run_index(args)?,
            Command::Mosaic(args) => self.run_mosaic(args)?,
        }
        tracing::info!(elapsed = ?start_time.elapsed(), "Done");
        Ok(())
    }

    fn run_colors(&self, args: &ColorsArgs) -> Result<()> {
        let mut document = CatalogDocument::load(&args.catalog)?;
        let store = LocalAssetStore::new(&args.images);
        let mut items = document.reference_items(&store);
        tracing::info!(
            series = document.series.len(),
            cards = items.len(),
            "Catalog loaded"
        );

        let config = MosaicConfig {
            workers: args.workers,
            margin: args.margin,
            ..MosaicConfig::default()
        };
        let extractor = ColorExtractor::from_config(&config)?;

        let bar = self.progress.stage("Reference colors", items.len());
        compute_colors(&mut items, &extractor, config.workers, &bar)?;
        self.progress.finish();

        document.enrich(&items)?;
        document.save(&args.output)?;
        tracing::info!(path = %args.output.display(), "Enriched catalog saved");
        Ok(())
    }

    fn run_index(&self, args: &IndexArgs) -> Result<()> {
        let document = CatalogDocument::load(&args.catalog)?;
        let store = LocalAssetStore::new(&args.images);
        let mut items = document.reference_items(&store);

        let config = MosaicConfig {
            workers: args.workers,
            leaf_size: args.leaf_size,
            margin: args.margin,
            ..MosaicConfig::default()
        };
        let extractor = ColorExtractor::from_config(&config)?;

        let bar = self.progress.stage("Missing colors", items.len());
        compute_colors(&mut items, &extractor, config.workers, &bar)?;
        self.progress.finish();

        let index = ColorIndex::build(items, &extractor, config.leaf_size)?;
        index.save(&args.output)
    }

    fn run_mosaic(&self, args: &MosaicArgs) -> Result<()> {
        let index = ColorIndex::load(&args.index)?;
        let config = args.config();

        let mut assembler =
            MosaicAssembler::new(&index, &config)?.with_progress(self.progress.clone());
        let canvas = assembler.create_mosaic(&args.input, args.scale, &args.output)?;

        let stats = assembler.cache().stats;
        tracing::info!(
            width = canvas.width(),
            height = canvas.height(),
            distinct_cards = assembler.cache().len(),
            cache_hits = stats.hits,
            unreadable_cards = stats.failures,
            "Mosaic written to {}",
            args.output.display()
        );
        Ok(())
    }
}
