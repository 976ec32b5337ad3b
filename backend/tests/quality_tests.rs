//! Tests for visual quality scoring
//! Verifies score bounds, grade monotonicity and the no-invented-grade rule

use proptest::prelude::*;
use shared::{
    BoundingBox, CommodityAnalyzer, CommodityCatalog, CommodityProfile, DetectedLabel,
    DetectedObject, DetectedText, DominantColor, EngineError, ProductMetadata, QualityGrade,
    QualityScorer, RecommendationCategory, VisionAnalysis,
};

fn scorer() -> QualityScorer {
    QualityScorer::new(CommodityCatalog::builtin())
}

fn color(r: u8, g: u8, b: u8, pixel_fraction: f64) -> DominantColor {
    DominantColor {
        r,
        g,
        b,
        score: 1.0,
        pixel_fraction,
    }
}

fn label(description: &str, confidence: f64) -> DetectedLabel {
    DetectedLabel {
        description: description.to_string(),
        confidence,
    }
}

fn bean(size: f64) -> DetectedObject {
    DetectedObject {
        label: "Bean".to_string(),
        confidence: 0.9,
        normalized_bounding_box: BoundingBox {
            x: 0.1,
            y: 0.1,
            width: size,
            height: size,
        },
    }
}

/// Even well-fermented beans, identical sizes, one clean label
fn premium_cocoa_analysis() -> VisionAnalysis {
    VisionAnalysis {
        objects: vec![bean(0.1), bean(0.1), bean(0.1), bean(0.1)],
        colors: vec![color(101, 67, 33, 1.0)],
        labels: vec![label("clean cocoa bean", 0.9)],
        text: vec![],
    }
}

// =============================================================================
// Worked scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn ideal_cocoa_color_scores_full_consistency() {
        let vision = VisionAnalysis {
            colors: vec![color(101, 67, 33, 1.0)],
            ..Default::default()
        };

        let result = scorer()
            .score(&vision, &ProductMetadata::new("cocoa", 500.0))
            .unwrap();

        assert_eq!(result.metrics.color_consistency, Some(100.0));
        assert_eq!(result.metrics.bean_size_uniformity, None);
        assert!(!result.degraded);
    }

    #[test]
    fn cocoa_score_82_is_grade_a() {
        let cocoa = CommodityProfile::cocoa();
        assert_eq!(cocoa.grade_for(82.0), QualityGrade::A);
        assert_eq!(cocoa.grade_for(90.0), QualityGrade::APlus);
        assert_eq!(cocoa.grade_for(74.99), QualityGrade::B);
    }

    #[test]
    fn empty_analysis_is_rejected() {
        let result = scorer().score(&VisionAnalysis::default(), &ProductMetadata::new("cocoa", 500.0));
        assert_eq!(result, Err(EngineError::InsufficientAnalysis));
    }

    #[test]
    fn text_only_analysis_is_rejected() {
        let vision = VisionAnalysis {
            text: vec![DetectedText {
                text: "LOT 42".to_string(),
                confidence: 0.99,
            }],
            ..Default::default()
        };
        let result = scorer().score(&vision, &ProductMetadata::new("coffee", 100.0));
        assert_eq!(result, Err(EngineError::InsufficientAnalysis));
    }

    #[test]
    fn premium_lot_gets_top_grade_and_marketing_note() {
        let result = scorer()
            .score(&premium_cocoa_analysis(), &ProductMetadata::new("cocoa", 500.0))
            .unwrap();

        assert_eq!(result.grade, QualityGrade::APlus);
        assert!(result.overall_score >= 90.0);
        assert_eq!(result.metrics.bean_size_uniformity, Some(100.0));
        assert_eq!(result.metrics.defect_score, 100.0);
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(
            result.recommendations[0].category,
            RecommendationCategory::Marketing
        );
        assert!(!result.recommendations[0].actionable);
    }

    #[test]
    fn moldy_lot_gets_quality_control_recommendation() {
        let vision = VisionAnalysis {
            labels: vec![label("mold", 1.0), label("insect damage", 1.0), label("cracked shell", 1.0)],
            ..Default::default()
        };

        let result = scorer()
            .score(&vision, &ProductMetadata::new("cocoa", 500.0))
            .unwrap();

        assert_eq!(result.metrics.defect_score, 10.0);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.category == RecommendationCategory::QualityControl && r.actionable));
        assert!(result.grade <= QualityGrade::C);
    }

    #[test]
    fn unknown_commodity_uses_generic_profile() {
        let result = scorer()
            .score(&premium_cocoa_analysis(), &ProductMetadata::new("vanilla", 10.0))
            .unwrap();
        assert_eq!(result.commodity, "generic");
    }

    #[test]
    fn fallback_is_opt_in_and_marked_degraded() {
        let metadata = ProductMetadata::new("cocoa", 500.0);

        let fallback = scorer()
            .score_or_fallback(&VisionAnalysis::default(), &metadata)
            .unwrap();
        assert_eq!(fallback.grade, QualityGrade::B);
        assert_eq!(fallback.confidence, 0.0);
        assert!(fallback.degraded);

        let real = scorer()
            .score_or_fallback(&premium_cocoa_analysis(), &metadata)
            .unwrap();
        assert!(!real.degraded);
    }

    #[test]
    fn fallback_still_reports_validation_errors() {
        let vision = VisionAnalysis {
            labels: vec![label("bean", 1.5)],
            ..Default::default()
        };
        let result = scorer().score_or_fallback(&vision, &ProductMetadata::new("cocoa", 500.0));
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn scoring_is_idempotent() {
        let metadata = ProductMetadata::new("coffee", 250.0);
        let vision = premium_cocoa_analysis();

        let first = scorer().score(&vision, &metadata).unwrap();
        let second = scorer().score(&vision, &metadata).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn analyzer_grade_matches_profile_table() {
        let analyzer = scorer().analyzer_for("coffee");
        for score in [0.0, 39.9, 40.0, 59.9, 60.0, 75.0, 89.9, 90.0, 100.0] {
            assert_eq!(
                analyzer.calculate_grade(score),
                analyzer.profile().grade_for(score)
            );
        }
    }
}

// =============================================================================
// Properties
// =============================================================================

fn color_strategy() -> impl Strategy<Value = DominantColor> {
    (any::<u8>(), any::<u8>(), any::<u8>(), 0.0..=1.0f64)
        .prop_map(|(r, g, b, fraction)| color(r, g, b, fraction))
}

fn label_strategy() -> impl Strategy<Value = DetectedLabel> {
    (
        prop_oneof![
            Just("bean"),
            Just("mold"),
            Just("clean"),
            Just("dirt"),
            Just("broken"),
            Just("stone"),
            Just("fresh"),
            Just("table"),
        ],
        0.0..=1.0f64,
    )
        .prop_map(|(description, confidence)| label(description, confidence))
}

fn object_strategy() -> impl Strategy<Value = DetectedObject> {
    (0.0..=1.0f64, 0.0..=1.0f64).prop_map(|(width, height)| DetectedObject {
        label: "bean".to_string(),
        confidence: 0.8,
        normalized_bounding_box: BoundingBox {
            x: 0.0,
            y: 0.0,
            width,
            height,
        },
    })
}

fn analysis_strategy() -> impl Strategy<Value = VisionAnalysis> {
    (
        prop::collection::vec(object_strategy(), 0..8),
        prop::collection::vec(color_strategy(), 0..5),
        prop::collection::vec(label_strategy(), 1..8),
    )
        .prop_map(|(objects, colors, labels)| VisionAnalysis {
            objects,
            colors,
            labels,
            text: vec![],
        })
}

fn commodity_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("cocoa"), Just("coffee"), Just("durian")]
}

proptest! {
    /// Overall score and every metric stay within [0, 100]
    #[test]
    fn scores_are_bounded(vision in analysis_strategy(), commodity in commodity_strategy()) {
        let result = scorer().score(&vision, &ProductMetadata::new(commodity, 100.0)).unwrap();

        prop_assert!((0.0..=100.0).contains(&result.overall_score));
        prop_assert!((0.0..=100.0).contains(&result.metrics.defect_score));
        prop_assert!((0.0..=100.0).contains(&result.metrics.cleanliness));
        for metric in [
            result.metrics.bean_size_uniformity,
            result.metrics.color_consistency,
            result.metrics.moisture_estimate,
        ]
        .into_iter()
        .flatten()
        {
            prop_assert!((0.0..=100.0).contains(&metric));
        }
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }

    /// A higher score never earns a worse grade
    #[test]
    fn grade_is_monotone_in_score(a in 0.0..=100.0f64, b in 0.0..=100.0f64) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        for profile in CommodityCatalog::builtin().profiles() {
            prop_assert!(profile.grade_for(low) <= profile.grade_for(high));
        }
    }

    /// The same input always yields the same result
    #[test]
    fn scoring_is_deterministic(vision in analysis_strategy()) {
        let metadata = ProductMetadata::new("cocoa", 100.0);
        let first = scorer().score(&vision, &metadata).unwrap();
        let second = scorer().score(&vision, &metadata).unwrap();
        prop_assert_eq!(first, second);
    }
}
