//! Photomosaics assembled from a library of trading-card images
//!
//! Each reference card is reduced to the mean CIELAB color of its artwork.
//! An input photo is cut into a grid of card-shaped tiles, each tile is
//! reduced the same way, and the card with the nearest color is pasted
//! into its cell.

#![forbid(unsafe_code)]

/// Reference catalog, asset resolution and catalog documents
pub mod catalog;
/// CIELAB color points and color extraction
pub mod color;
/// Input/output operations and error handling
pub mod io;
/// Grid computation, tile cache and mosaic assembly
pub mod mosaic;
/// Spatial index over reference colors
pub mod spatial;

pub use io::error::{MosaicError, Result};
