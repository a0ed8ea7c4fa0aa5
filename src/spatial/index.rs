//! Color index: spatial tree plus the reference items it was built from
//!
//! Position `i` in the tree, row `i` of the color matrix and item `i` of
//! the item array always describe the same card. The three are built from
//! one ordered sequence and persisted together as a single bincode blob.

use crate::catalog::item::ReferenceItem;
use crate::color::extraction::ColorExtractor;
use crate::color::point::ColorPoint;
use crate::io::error::{MosaicError, Result, file_system_error};
use crate::spatial::kdtree::{KdTree, Neighbor};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Queryable nearest-color structure over a reference catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorIndex {
    tree: KdTree,
    items: Vec<ReferenceItem>,
    colors: Array2<f32>,
}

impl ColorIndex {
    /// Build an index over `items`, measuring any color not yet known
    ///
    /// # Errors
    ///
    /// Returns `EmptyIndex` if `items` is empty, or `InvalidParameter`
    /// if `leaf_size` is zero
    pub fn build(
        mut items: Vec<ReferenceItem>,
        extractor: &ColorExtractor,
        leaf_size: usize,
    ) -> Result<Self> {
        if items.is_empty() {
            return Err(MosaicError::EmptyIndex);
        }

        let points: Vec<ColorPoint> = items
            .iter_mut()
            .map(|item| item.color_point(extractor))
            .collect();
        let tree = KdTree::build(&points, leaf_size)?;
        let colors = color_matrix(&points);

        tracing::debug!(
            items = items.len(),
            nodes = tree.node_count(),
            leaf_size,
            "Color index built"
        );
        Self::from_parts(tree, items, colors)
    }

    /// Assemble an index from prebuilt parts
    ///
    /// # Errors
    ///
    /// Returns `IndexMismatch` if the parts disagree on their length, the
    /// color matrix differs from the tree's points or the tree is
    /// structurally invalid
    pub fn from_parts(tree: KdTree, items: Vec<ReferenceItem>, colors: Array2<f32>) -> Result<Self> {
        let index = Self {
            tree,
            items,
            colors,
        };
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<()> {
        let consistent = self.tree.len() == self.items.len()
            && self.colors.nrows() == self.items.len()
            && self.colors.ncols() == 3
            && self.tree.is_consistent()
            && self.colors_match_tree();
        if consistent {
            Ok(())
        } else {
            Err(MosaicError::IndexMismatch {
                tree_points: self.tree.len(),
                items: self.items.len(),
                colors: self.colors.nrows(),
            })
        }
    }

    fn colors_match_tree(&self) -> bool {
        self.colors
            .rows()
            .into_iter()
            .enumerate()
            .all(|(position, row)| {
                self.tree
                    .point(position)
                    .is_some_and(|point| row.iter().eq(point.to_array().iter()))
            })
    }

    /// Number of indexed reference items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index holds no items (never true for a valid index)
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reference items in index order
    pub fn items(&self) -> &[ReferenceItem] {
        &self.items
    }

    /// Reference item at an index position
    pub fn item(&self, index: usize) -> Option<&ReferenceItem> {
        self.items.get(index)
    }

    /// Raw `N x 3` color matrix in index order
    pub const fn colors(&self) -> &Array2<f32> {
        &self.colors
    }

    /// Underlying spatial tree
    pub const fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// Closest indexed color to `point`
    pub fn nearest(&self, point: &ColorPoint) -> Option<Neighbor> {
        self.tree.nearest(point)
    }

    /// Up to `k` closest indexed colors for every query point, in query order
    pub fn query(&self, points: &[ColorPoint], k: usize) -> Vec<Vec<Neighbor>> {
        points
            .par_iter()
            .map(|point| self.tree.nearest_k(point, k))
            .collect()
    }

    /// Closest indexed color for every query point, in query order
    ///
    /// # Errors
    ///
    /// Returns `EmptyIndex` if the tree yields no neighbour
    pub fn nearest_batch(&self, points: &[ColorPoint]) -> Result<Vec<Neighbor>> {
        points
            .par_iter()
            .map(|point| self.tree.nearest(point).ok_or(MosaicError::EmptyIndex))
            .collect()
    }

    /// Best matching reference item for every query point, in query order
    ///
    /// # Errors
    ///
    /// Returns `EmptyIndex` if the tree yields no neighbour
    pub fn match_items(&self, points: &[ColorPoint]) -> Result<Vec<&ReferenceItem>> {
        self.nearest_batch(points)?
            .into_iter()
            .map(|neighbor| self.items.get(neighbor.index).ok_or(MosaicError::EmptyIndex))
            .collect()
    }

    /// Persist tree, items and color matrix as one blob
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or encoding fails
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| file_system_error(parent, "create directory", e))?;
        }
        let file = File::create(path).map_err(|e| file_system_error(path, "create index", e))?;
        bincode::serialize_into(BufWriter::new(file), self).map_err(|e| {
            MosaicError::Persistence {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        tracing::info!(path = %path.display(), items = self.len(), "Color index saved");
        Ok(())
    }

    /// Reload a blob written by [`Self::save`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded, or
    /// `IndexMismatch` if its parts disagree
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| file_system_error(path, "open index", e))?;
        let index: Self = bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
            MosaicError::Persistence {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        index.validate()?;
        tracing::info!(path = %path.display(), items = index.len(), "Color index loaded");
        Ok(index)
    }
}

fn color_matrix(points: &[ColorPoint]) -> Array2<f32> {
    Array2::from_shape_fn((points.len(), 3), |(row, col)| {
        points
            .get(row)
            .and_then(|point| point.to_array().get(col).copied())
            .unwrap_or(0.0)
    })
}
