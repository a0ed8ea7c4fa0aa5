//! JSON catalog documents and bulk color enrichment
//!
//! A catalog is an array of series, each holding its cards. Fields this
//! crate does not interpret are carried through untouched so an enriched
//! document can be written back over the original.

use crate::catalog::assets::AssetStore;
use crate::catalog::item::ReferenceItem;
use crate::color::extraction::ColorExtractor;
use crate::color::point::ColorPoint;
use crate::io::error::{MosaicError, Result, file_system_error, invalid_parameter};
use crate::io::workers::worker_pool;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// One card entry of a catalog document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Stable card identifier
    pub id: String,
    /// Printed card name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    /// Dominant CIELAB color, present once enriched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_color: Option<ColorPoint>,
    /// Local image path, present once enriched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    /// Remaining fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One series entry of a catalog document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Short series code
    pub series_code: String,
    /// Human readable series name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_name: Option<String>,
    /// Cards of the series in catalog order
    #[serde(default)]
    pub cards: Vec<CardRecord>,
    /// Remaining fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A whole catalog document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogDocument {
    /// Series in document order
    pub series: Vec<SeriesRecord>,
}

impl CatalogDocument {
    /// Read a catalog document from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| file_system_error(path, "read catalog", e))?;
        serde_json::from_str(&text).map_err(|e| MosaicError::Catalog {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the document as pretty-printed JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|e| MosaicError::Catalog {
            path: path.to_path_buf(),
            source: e,
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| file_system_error(parent, "create directory", e))?;
        }
        std::fs::write(path, text).map_err(|e| file_system_error(path, "write catalog", e))
    }

    /// Total number of cards over all series
    pub fn card_count(&self) -> usize {
        self.series.iter().map(|series| series.cards.len()).sum()
    }

    /// Flatten all series into reference items, in document order
    ///
    /// A card's recorded `image_path` wins over the store. Cards whose asset
    /// is unavailable keep the conventional path, so their color falls back
    /// to the default when measured.
    pub fn reference_items<S: AssetStore>(&self, store: &S) -> Vec<ReferenceItem> {
        let mut items = Vec::with_capacity(self.card_count());
        for series in &self.series {
            for card in &series.cards {
                let image_path = card.image_path.clone().unwrap_or_else(|| {
                    store.resolve(&card.id).unwrap_or_else(|error| {
                        tracing::warn!(%error, "Asset unavailable");
                        store.path_for(&card.id)
                    })
                });

                let mut item = ReferenceItem::new(card.id.clone(), image_path)
                    .with_series(series.series_code.clone());
                if let Some(name) = &card.card_name {
                    item = item.with_name(name.clone());
                }
                if let Some(color) = card.lab_color {
                    item = item.with_color(color);
                }
                items.push(item);
            }
        }
        items
    }

    /// Write measured colors and resolved paths back into the card records
    ///
    /// `items` must be the sequence produced by [`Self::reference_items`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the item count differs from the card count
    pub fn enrich(&mut self, items: &[ReferenceItem]) -> Result<()> {
        let card_count = self.card_count();
        if items.len() != card_count {
            return Err(invalid_parameter(
                "items",
                &items.len(),
                &format!("catalog holds {card_count} cards"),
            ));
        }

        let cards = self.series.iter_mut().flat_map(|series| series.cards.iter_mut());
        for (card, item) in cards.zip(items) {
            if let Some(color) = item.cached_color() {
                card.lab_color = Some(color);
            }
            card.image_path = Some(item.image_path().to_path_buf());
        }
        Ok(())
    }
}

/// Measure every missing item color on a bounded worker pool
///
/// Items already carrying a color are skipped. Each result is written
/// into its own item, so ordering is preserved regardless of completion
/// order. Returns the number of colors computed.
///
/// # Errors
///
/// Returns `InvalidParameter` if the worker pool cannot be created
pub fn compute_colors(
    items: &mut [ReferenceItem],
    extractor: &ColorExtractor,
    workers: usize,
    progress: &ProgressBar,
) -> Result<usize> {
    let pool = worker_pool(workers)?;
    let pending = items
        .iter()
        .filter(|item| item.cached_color().is_none())
        .count();
    progress.set_length(pending as u64);

    pool.install(|| {
        items
            .par_iter_mut()
            .filter(|item| item.cached_color().is_none())
            .for_each(|item| {
                item.color_point(extractor);
                progress.inc(1);
            });
    });
    progress.finish();

    tracing::info!(computed = pending, total = items.len(), "Reference colors ready");
    Ok(pending)
}
