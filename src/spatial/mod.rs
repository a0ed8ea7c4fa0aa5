//! Nearest-neighbour search over reference colors
//!
//! - Static k-d tree with configurable leaf size
//! - Color index tying tree positions to reference items, with persistence

/// Color index built over a reference catalog
pub mod index;
/// Static three-dimensional k-d tree
pub mod kdtree;

pub use index::ColorIndex;
pub use kdtree::{KdTree, Neighbor};
