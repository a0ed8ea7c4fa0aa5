//! Points in CIELAB space

use serde::{Deserialize, Serialize};

/// Mid-lightness, zero-chroma gray substituted whenever a color cannot be measured
pub const NEUTRAL_COLOR: ColorPoint = ColorPoint::new(50.0, 0.0, 0.0);

/// Upper bound of the CIELAB lightness channel
pub const MAX_LIGHTNESS: f32 = 100.0;

/// A single color in CIELAB space (D65 white point)
///
/// Serialized as a bare `[L, a, b]` triple so catalog documents stay compact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct ColorPoint {
    /// Lightness in `[0, 100]`
    pub l: f32,
    /// Green-red opponent axis
    pub a: f32,
    /// Blue-yellow opponent axis
    pub b: f32,
}

impl ColorPoint {
    /// Create a point from its three channels
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    /// Channels as an array in `[L, a, b]` order
    pub const fn to_array(self) -> [f32; 3] {
        [self.l, self.a, self.b]
    }

    /// Squared Euclidean distance to another point
    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl.mul_add(dl, da.mul_add(da, db * db))
    }

    /// Euclidean distance to another point (CIE76 delta E)
    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

impl Default for ColorPoint {
    fn default() -> Self {
        NEUTRAL_COLOR
    }
}

impl From<[f32; 3]> for ColorPoint {
    fn from([l, a, b]: [f32; 3]) -> Self {
        Self::new(l, a, b)
    }
}

impl From<ColorPoint> for [f32; 3] {
    fn from(point: ColorPoint) -> Self {
        point.to_array()
    }
}
