//! Image analysis models
//!
//! Output shape of the upstream vision service (object, color, label and
//! text detection). Consumed as-is by the quality scorer.

use serde::{Deserialize, Serialize};

/// Complete result of analysing one lot photo
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisionAnalysis {
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub colors: Vec<DominantColor>,
    #[serde(default)]
    pub labels: Vec<DetectedLabel>,
    #[serde(default)]
    pub text: Vec<DetectedText>,
}

impl VisionAnalysis {
    /// True when nothing usable was detected (no objects, colors or labels)
    pub fn is_degenerate(&self) -> bool {
        self.objects.is_empty() && self.colors.is_empty() && self.labels.is_empty()
    }
}

/// A localized object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f64,
    pub normalized_bounding_box: BoundingBox,
}

/// Bounding box with coordinates normalized to [0, 1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        (self.width.max(0.0) * self.height.max(0.0)).min(1.0)
    }
}

/// A dominant color and the share of the image it covers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DominantColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default)]
    pub score: f64,
    pub pixel_fraction: f64,
}

impl DominantColor {
    /// Luma (ITU-R BT.601) on the 0-255 scale
    pub fn brightness(&self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Euclidean distance in RGB space
    pub fn distance_to(&self, other: &RgbColor) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Plain RGB triple
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A whole-image label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedLabel {
    pub description: String,
    pub confidence: f64,
}

/// Recognized text (bag stencils, lot tags)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedText {
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
}
