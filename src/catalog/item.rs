//! Reference items available for mosaic placement

use crate::color::extraction::ColorExtractor;
use crate::color::point::ColorPoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One card image usable as a mosaic tile
///
/// The dominant color is computed on first request and remembered for the
/// lifetime of the item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    id: String,
    name: Option<String>,
    series_code: Option<String>,
    image_path: PathBuf,
    color: Option<ColorPoint>,
}

impl ReferenceItem {
    /// Create an item whose color has not been measured yet
    pub fn new(id: impl Into<String>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: None,
            series_code: None,
            image_path: image_path.into(),
            color: None,
        }
    }

    /// Attach a precomputed color
    #[must_use]
    pub fn with_color(mut self, color: ColorPoint) -> Self {
        self.color = Some(color);
        self
    }

    /// Attach a display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach the code of the series the card belongs to
    #[must_use]
    pub fn with_series(mut self, series_code: impl Into<String>) -> Self {
        self.series_code = Some(series_code.into());
        self
    }

    /// Stable unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, if the catalog provided one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Series code, if the catalog provided one
    pub fn series_code(&self) -> Option<&str> {
        self.series_code.as_deref()
    }

    /// Local path of the display image
    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Color if it has already been computed
    pub const fn cached_color(&self) -> Option<ColorPoint> {
        self.color
    }

    /// Dominant color, measured from the image on first call
    pub fn color_point(&mut self, extractor: &ColorExtractor) -> ColorPoint {
        if let Some(color) = self.color {
            return color;
        }
        let color = extractor.reference_color_from_path(&self.image_path);
        self.color = Some(color);
        color
    }
}
