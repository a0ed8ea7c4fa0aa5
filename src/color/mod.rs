//! Color measurement in a perceptually uniform space
//!
//! - CIELAB point representation and distances
//! - Mean color extraction from images and tile regions

/// Representative color extraction with margin crop and default fallback
pub mod extraction;
/// CIELAB point type and the shared neutral fallback color
pub mod point;

pub use extraction::{ColorExtractor, Region};
pub use point::{ColorPoint, NEUTRAL_COLOR};
