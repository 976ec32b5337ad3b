//! Visual quality scoring
//!
//! Turns one image analysis into five bounded metrics, an overall score, a
//! grade from the commodity's threshold table and a list of improvement
//! recommendations. Pure and synchronous: every call builds fresh values.

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CommodityCatalog, CommodityProfile, DetectedLabel, DetectedObject, DominantColor,
    Priority, ProductMetadata, QualityGrade, QualityMetrics, QualityRecommendation,
    QualityResult, RecommendationCategory, VisionAnalysis,
};
use crate::types::round_to;
use crate::validation::{validate_product_metadata, validate_vision_analysis};

const CLEANLINESS_BASE: f64 = 70.0;
const CLEAN_LABEL_BONUS: f64 = 15.0;
const DIRTY_LABEL_PENALTY: f64 = 20.0;

const UNIFORMITY_RECOMMENDATION_BELOW: f64 = 70.0;
const MOISTURE_RECOMMENDATION_BELOW: f64 = 65.0;
const COLOR_RECOMMENDATION_BELOW: f64 = 60.0;
const DEFECT_RECOMMENDATION_BELOW: f64 = 70.0;
const CLEANLINESS_RECOMMENDATION_BELOW: f64 = 60.0;

/// Per-commodity scoring strategy
pub trait CommodityAnalyzer {
    fn profile(&self) -> &CommodityProfile;

    fn score_metrics(&self, vision: &VisionAnalysis) -> QualityMetrics;

    fn calculate_grade(&self, overall_score: f64) -> QualityGrade;

    fn generate_recommendations(
        &self,
        metrics: &QualityMetrics,
        grade: QualityGrade,
    ) -> Vec<QualityRecommendation>;
}

/// Analyzer driven entirely by a [`CommodityProfile`]'s tables
#[derive(Debug, Clone)]
pub struct TableDrivenAnalyzer {
    profile: CommodityProfile,
}

impl TableDrivenAnalyzer {
    pub fn new(profile: CommodityProfile) -> Self {
        Self { profile }
    }
}

impl CommodityAnalyzer for TableDrivenAnalyzer {
    fn profile(&self) -> &CommodityProfile {
        &self.profile
    }

    fn score_metrics(&self, vision: &VisionAnalysis) -> QualityMetrics {
        QualityMetrics {
            bean_size_uniformity: bean_size_uniformity(&vision.objects, &self.profile),
            color_consistency: color_consistency(&vision.colors, &self.profile),
            moisture_estimate: moisture_estimate(&vision.colors, &self.profile),
            defect_score: defect_score(&vision.labels, &self.profile),
            cleanliness: cleanliness(&vision.labels, &self.profile),
        }
    }

    fn calculate_grade(&self, overall_score: f64) -> QualityGrade {
        self.profile.grade_for(overall_score)
    }

    fn generate_recommendations(
        &self,
        metrics: &QualityMetrics,
        grade: QualityGrade,
    ) -> Vec<QualityRecommendation> {
        let mut recommendations = Vec::new();

        if let Some(uniformity) = metrics.bean_size_uniformity {
            if uniformity < UNIFORMITY_RECOMMENDATION_BELOW {
                recommendations.push(QualityRecommendation {
                    category: RecommendationCategory::Processing,
                    priority: Priority::High,
                    description: format!(
                        "Sort {} by size before sale; size uniformity is {:.0}/100",
                        self.profile.display_name.to_lowercase(),
                        uniformity
                    ),
                    actionable: true,
                });
            }
        }

        if let Some(moisture) = metrics.moisture_estimate {
            if moisture < MOISTURE_RECOMMENDATION_BELOW {
                recommendations.push(QualityRecommendation {
                    category: RecommendationCategory::Storage,
                    priority: Priority::Medium,
                    description: format!(
                        "Check drying and storage conditions; moisture estimate is {:.0}/100",
                        moisture
                    ),
                    actionable: true,
                });
            }
        }

        if let Some(color) = metrics.color_consistency {
            if color < COLOR_RECOMMENDATION_BELOW {
                recommendations.push(QualityRecommendation {
                    category: RecommendationCategory::Processing,
                    priority: Priority::Medium,
                    description: format!(
                        "Review fermentation and drying; color consistency is {:.0}/100",
                        color
                    ),
                    actionable: true,
                });
            }
        }

        if metrics.defect_score < DEFECT_RECOMMENDATION_BELOW {
            recommendations.push(QualityRecommendation {
                category: RecommendationCategory::QualityControl,
                priority: Priority::High,
                description: format!(
                    "Hand-pick defective units (mold, insect damage, cracks); defect score is {:.0}/100",
                    metrics.defect_score
                ),
                actionable: true,
            });
        }

        if metrics.cleanliness < CLEANLINESS_RECOMMENDATION_BELOW {
            recommendations.push(QualityRecommendation {
                category: RecommendationCategory::Handling,
                priority: Priority::Low,
                description: format!(
                    "Remove foreign matter and clean the lot; cleanliness is {:.0}/100",
                    metrics.cleanliness
                ),
                actionable: true,
            });
        }

        if grade >= QualityGrade::A {
            recommendations.push(QualityRecommendation {
                category: RecommendationCategory::Marketing,
                priority: Priority::Low,
                description: format!(
                    "Grade {} lot: offer through premium or specialty channels",
                    grade
                ),
                actionable: false,
            });
        }

        recommendations
    }
}

/// Scores image analyses against the commodity catalog
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    catalog: CommodityCatalog,
}

impl QualityScorer {
    pub fn new(catalog: CommodityCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &CommodityCatalog {
        &self.catalog
    }

    /// Strategy for a commodity key; unknown keys get the generic profile
    pub fn analyzer_for(&self, commodity: &str) -> TableDrivenAnalyzer {
        TableDrivenAnalyzer::new(self.catalog.profile_or_generic(commodity))
    }

    /// Score one analysis.
    ///
    /// Fails with [`EngineError::InsufficientAnalysis`] when the analysis has
    /// no objects, colors or labels; a grade is never invented.
    pub fn score(
        &self,
        vision: &VisionAnalysis,
        metadata: &ProductMetadata,
    ) -> EngineResult<QualityResult> {
        validate_product_metadata(metadata)?;
        validate_vision_analysis(vision)?;

        if vision.is_degenerate() {
            return Err(EngineError::InsufficientAnalysis);
        }

        let analyzer = self.analyzer_for(&metadata.commodity);
        let metrics = analyzer.score_metrics(vision);
        let overall_score = overall_score(&metrics, analyzer.profile());
        let grade = analyzer.calculate_grade(overall_score);
        let recommendations = analyzer.generate_recommendations(&metrics, grade);

        Ok(QualityResult {
            commodity: analyzer.profile().key.clone(),
            overall_score,
            grade,
            confidence: label_confidence(&vision.labels),
            metrics,
            recommendations,
            degraded: false,
        })
    }

    /// Opt-in variant that degrades instead of failing: a scoring failure
    /// yields grade B with zero confidence and `degraded` set. Validation
    /// errors are still returned.
    pub fn score_or_fallback(
        &self,
        vision: &VisionAnalysis,
        metadata: &ProductMetadata,
    ) -> EngineResult<QualityResult> {
        match self.score(vision, metadata) {
            Err(EngineError::InsufficientAnalysis) => {
                let profile = self.catalog.profile_or_generic(&metadata.commodity);
                let overall_score = profile.threshold_of(QualityGrade::B).unwrap_or(60.0);
                Ok(QualityResult {
                    commodity: profile.key.clone(),
                    overall_score,
                    grade: QualityGrade::B,
                    confidence: 0.0,
                    metrics: QualityMetrics {
                        bean_size_uniformity: None,
                        color_consistency: None,
                        moisture_estimate: None,
                        defect_score: overall_score,
                        cleanliness: overall_score,
                    },
                    recommendations: vec![QualityRecommendation {
                        category: RecommendationCategory::QualityControl,
                        priority: Priority::High,
                        description: "Photo could not be analysed; retake it in good light for a real grade"
                            .to_string(),
                        actionable: true,
                    }],
                    degraded: true,
                })
            }
            other => other,
        }
    }
}

/// Weighted sum of the defined metrics with weights renormalized over them
pub fn overall_score(metrics: &QualityMetrics, profile: &CommodityProfile) -> f64 {
    let w = &profile.weights;
    let parts = [
        (metrics.bean_size_uniformity, w.bean_size_uniformity),
        (metrics.color_consistency, w.color_consistency),
        (metrics.moisture_estimate, w.moisture_estimate),
        (Some(metrics.defect_score), w.defect_score),
        (Some(metrics.cleanliness), w.cleanliness),
    ];

    let (weighted, weight_total, count, plain) = parts.iter().fold(
        (0.0, 0.0, 0usize, 0.0),
        |(weighted, total, count, plain), (value, weight)| match value {
            Some(v) => (weighted + v * weight, total + weight, count + 1, plain + v),
            None => (weighted, total, count, plain),
        },
    );

    let score = if weight_total > 0.0 {
        weighted / weight_total
    } else if count > 0 {
        plain / count as f64
    } else {
        0.0
    };

    round_to(score.clamp(0.0, 100.0), 2)
}

/// Uniformity of unit sizes from the variance of their bounding-box areas
pub fn bean_size_uniformity(objects: &[DetectedObject], profile: &CommodityProfile) -> Option<f64> {
    let areas: Vec<f64> = objects
        .iter()
        .filter(|o| matches_any(&o.label, &profile.unit_vocabulary))
        .map(|o| o.normalized_bounding_box.area())
        .collect();

    if areas.is_empty() {
        return None;
    }

    let n = areas.len() as f64;
    let mean = areas.iter().sum::<f64>() / n;
    let variance = areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;

    Some((100.0 - variance * profile.uniformity_scale).clamp(0.0, 100.0))
}

/// Pixel-fraction-weighted closeness of the dominant colors to the ideal
pub fn color_consistency(colors: &[DominantColor], profile: &CommodityProfile) -> Option<f64> {
    pixel_weighted(colors, |c| {
        (100.0 - c.distance_to(&profile.ideal_color) / 2.0).max(0.0)
    })
}

/// Moisture heuristic: how close each color's luma is to the optimum
pub fn moisture_estimate(colors: &[DominantColor], profile: &CommodityProfile) -> Option<f64> {
    pixel_weighted(colors, |c| {
        (100.0 - (c.brightness() - profile.optimal_brightness).abs()).max(0.0)
    })
}

/// 100 minus a confidence-scaled penalty per defect label
pub fn defect_score(labels: &[DetectedLabel], profile: &CommodityProfile) -> f64 {
    let penalty: f64 = labels
        .iter()
        .filter(|l| matches_any(&l.description, &profile.defect_vocabulary))
        .map(|l| l.confidence * profile.defect_penalty)
        .sum();

    (100.0 - penalty).clamp(0.0, 100.0)
}

/// Base 70, raised by clean labels and lowered by dirty ones
pub fn cleanliness(labels: &[DetectedLabel], profile: &CommodityProfile) -> f64 {
    let score = labels.iter().fold(CLEANLINESS_BASE, |score, label| {
        if matches_any(&label.description, &profile.dirty_vocabulary) {
            score - label.confidence * DIRTY_LABEL_PENALTY
        } else if matches_any(&label.description, &profile.clean_vocabulary) {
            score + label.confidence * CLEAN_LABEL_BONUS
        } else {
            score
        }
    });

    score.clamp(0.0, 100.0)
}

/// Mean label confidence, 0 without labels
pub fn label_confidence(labels: &[DetectedLabel]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let mean = labels.iter().map(|l| l.confidence).sum::<f64>() / labels.len() as f64;
    mean.clamp(0.0, 1.0)
}

fn pixel_weighted<F>(colors: &[DominantColor], score: F) -> Option<f64>
where
    F: Fn(&DominantColor) -> f64,
{
    let total: f64 = colors.iter().map(|c| c.pixel_fraction).sum();
    if total <= 0.0 {
        return None;
    }

    let weighted: f64 = colors.iter().map(|c| score(c) * c.pixel_fraction).sum();
    Some((weighted / total).clamp(0.0, 100.0))
}

fn matches_any(text: &str, vocabulary: &[String]) -> bool {
    let text = text.to_lowercase();
    vocabulary.iter().any(|word| text.contains(word.as_str()))
}
