//! Representative color extraction for reference images and mosaic tiles
//!
//! Every pixel is converted from sRGB to CIELAB first and the mean is taken
//! afterwards. Averaging in RGB and converting once gives a different answer
//! because the conversion is nonlinear.

use crate::color::point::{ColorPoint, MAX_LIGHTNESS, NEUTRAL_COLOR};
use crate::io::configuration::{MosaicConfig, REFERENCE_MARGIN, validate_margin};
use crate::io::error::Result;
use image::{Rgb, RgbImage};
use palette::{FromColor, Lab, Srgb};
use std::path::Path;

/// Axis-aligned pixel rectangle inside an image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Left edge (inclusive)
    pub x: u32,
    /// Top edge (inclusive)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Region {
    /// Create a region from its origin and size
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole image
    pub fn full(image: &RgbImage) -> Self {
        Self::new(0, 0, image.width(), image.height())
    }

    /// Number of pixels covered
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    // Clip against image bounds, yielding (x0, y0, x1, y1) exclusive ends
    fn clip(&self, image: &RgbImage) -> (u32, u32, u32, u32) {
        let x0 = self.x.min(image.width());
        let y0 = self.y.min(image.height());
        let x1 = self.x.saturating_add(self.width).min(image.width());
        let y1 = self.y.saturating_add(self.height).min(image.height());
        (x0, y0, x1, y1)
    }
}

/// Region left after cropping `margin` of the width and height from every side
///
/// Margins are truncated to whole pixels.
pub fn margin_region(width: u32, height: u32, margin: f32) -> Region {
    let margin_x = (width as f32 * margin) as u32;
    let margin_y = (height as f32 * margin) as u32;
    Region::new(
        margin_x,
        margin_y,
        width.saturating_sub(margin_x.saturating_mul(2)),
        height.saturating_sub(margin_y.saturating_mul(2)),
    )
}

/// Convert one 8-bit sRGB pixel to CIELAB
pub fn pixel_to_lab(pixel: Rgb<u8>) -> ColorPoint {
    let [r, g, b] = pixel.0;
    let srgb = Srgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    );
    let lab: Lab = Lab::from_color(srgb);
    ColorPoint::new(lab.l, lab.a, lab.b)
}

/// Mean CIELAB color of the pixels inside `region`
///
/// Returns `None` when the clipped region contains no pixels.
pub fn mean_lab(image: &RgbImage, region: Region) -> Option<ColorPoint> {
    let (x0, y0, x1, y1) = region.clip(image);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let mut sums = [0.0_f64; 3];
    let mut count = 0_u64;
    for y in y0..y1 {
        for x in x0..x1 {
            if let Some(pixel) = image.get_pixel_checked(x, y) {
                let lab = pixel_to_lab(*pixel);
                for (sum, channel) in sums.iter_mut().zip(lab.to_array()) {
                    *sum += f64::from(channel);
                }
                count += 1;
            }
        }
    }

    (count > 0).then(|| {
        let n = count as f64;
        let [l, a, b] = sums.map(|sum| (sum / n) as f32);
        // Rounding in the conversion can push pure white a hair past 100
        ColorPoint::new(l.clamp(0.0, MAX_LIGHTNESS), a, b)
    })
}

/// Reduces images and image regions to a single [`ColorPoint`]
///
/// Failures never propagate: empty regions and undecodable files
/// both yield the configured default color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorExtractor {
    margin: f32,
    default_color: ColorPoint,
}

impl Default for ColorExtractor {
    fn default() -> Self {
        Self {
            margin: REFERENCE_MARGIN,
            default_color: NEUTRAL_COLOR,
        }
    }
}

impl ColorExtractor {
    /// Create an extractor with a custom reference margin and fallback color
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `margin` is outside `[0, 0.5)`
    pub fn new(margin: f32, default_color: ColorPoint) -> Result<Self> {
        validate_margin(margin)?;
        Ok(Self {
            margin,
            default_color,
        })
    }

    /// Create an extractor from the shared pipeline configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configured margin is out of range
    pub fn from_config(config: &MosaicConfig) -> Result<Self> {
        Self::new(config.margin, config.default_color)
    }

    /// Fraction cropped from each side of reference images
    pub const fn margin(&self) -> f32 {
        self.margin
    }

    /// Color returned when nothing can be measured
    pub const fn default_color(&self) -> ColorPoint {
        self.default_color
    }

    /// Mean color of a tile region, without any margin crop
    pub fn region_color(&self, image: &RgbImage, region: Region) -> ColorPoint {
        mean_lab(image, region).unwrap_or(self.default_color)
    }

    /// Dominant color of a reference image after cropping its border
    pub fn reference_color(&self, image: &RgbImage) -> ColorPoint {
        let region = margin_region(image.width(), image.height(), self.margin);
        self.region_color(image, region)
    }

    /// Decode a reference image from disk and extract its dominant color
    pub fn reference_color_from_path(&self, path: &Path) -> ColorPoint {
        match image::open(path) {
            Ok(decoded) => self.reference_color(&decoded.to_rgb8()),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "Reference image unreadable, using default color"
                );
                self.default_color
            }
        }
    }
}
