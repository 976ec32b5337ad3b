//! Quality assessment models

use serde::{Deserialize, Serialize};

/// Discrete quality grade, ordered worst to best
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityGrade {
    D,
    C,
    B,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl QualityGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::APlus => "A+",
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
            QualityGrade::D => "D",
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QualityGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A+" => Ok(QualityGrade::APlus),
            "A" => Ok(QualityGrade::A),
            "B" => Ok(QualityGrade::B),
            "C" => Ok(QualityGrade::C),
            "D" => Ok(QualityGrade::D),
            other => Err(format!("unknown grade: {}", other)),
        }
    }
}

/// The five visual quality metrics, each in [0, 100]
///
/// Uniformity, color and moisture need specific detections; when the
/// analysis lacks them the metric is `None` and drops out of the weighted sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QualityMetrics {
    pub bean_size_uniformity: Option<f64>,
    pub color_consistency: Option<f64>,
    pub moisture_estimate: Option<f64>,
    pub defect_score: f64,
    pub cleanliness: f64,
}

/// Relative weight of each metric in the overall score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricWeights {
    pub bean_size_uniformity: f64,
    pub color_consistency: f64,
    pub moisture_estimate: f64,
    pub defect_score: f64,
    pub cleanliness: f64,
}

impl MetricWeights {
    pub fn total(&self) -> f64 {
        self.bean_size_uniformity
            + self.color_consistency
            + self.moisture_estimate
            + self.defect_score
            + self.cleanliness
    }
}

/// Graded result of scoring one analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityResult {
    pub commodity: String,
    pub overall_score: f64,
    pub grade: QualityGrade,
    pub confidence: f64,
    pub metrics: QualityMetrics,
    pub recommendations: Vec<QualityRecommendation>,
    /// Set only on the opt-in fallback path when scoring failed
    #[serde(default)]
    pub degraded: bool,
}

/// Area a recommendation targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Processing,
    Storage,
    QualityControl,
    Handling,
    Marketing,
}

/// Recommendation urgency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// An improvement suggestion derived from one metric rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityRecommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub description: String,
    pub actionable: bool,
}
