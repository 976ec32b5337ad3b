//! Commodity profiles
//!
//! Everything that differs between commodities (ideal appearance, detection
//! vocabularies, metric weights, grade thresholds, seasonality, fallback
//! price) lives here as data. Adding a commodity means adding a profile.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::quality::{MetricWeights, QualityGrade};
use crate::models::vision::RgbColor;

/// Key of the profile used for commodities without their own entry
pub const GENERIC_COMMODITY: &str = "generic";

/// Minimum overall score required for a grade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GradeThreshold {
    pub grade: QualityGrade,
    pub min_score: f64,
}

/// Scoring and pricing tables for one commodity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommodityProfile {
    pub key: String,
    pub display_name: String,
    pub ideal_color: RgbColor,
    pub optimal_brightness: f64,
    /// Object labels that count as individual units (beans, seeds)
    pub unit_vocabulary: Vec<String>,
    pub defect_vocabulary: Vec<String>,
    pub clean_vocabulary: Vec<String>,
    pub dirty_vocabulary: Vec<String>,
    pub weights: MetricWeights,
    /// Ordered from the best grade to the worst
    pub grade_thresholds: Vec<GradeThreshold>,
    /// Multiplier applied to the variance of normalized bounding-box areas
    pub uniformity_scale: f64,
    /// Points removed per fully confident defect label
    pub defect_penalty: f64,
    /// Price multiplier per calendar month, January first
    pub seasonal_pattern: [f64; 12],
    /// Static price used when every live source fails
    pub default_price: Option<Decimal>,
    pub currency: String,
    pub unit: String,
}

impl CommodityProfile {
    /// Check the invariants the scorer relies on
    pub fn validate(&self) -> EngineResult<()> {
        let w = &self.weights;
        let all = [
            w.bean_size_uniformity,
            w.color_consistency,
            w.moisture_estimate,
            w.defect_score,
            w.cleanliness,
        ];
        if all.iter().any(|x| *x < 0.0 || !x.is_finite()) {
            return Err(EngineError::InvalidProfile(format!(
                "{}: metric weights must be non-negative",
                self.key
            )));
        }
        if (w.total() - 1.0).abs() > 1e-6 {
            return Err(EngineError::InvalidProfile(format!(
                "{}: metric weights must sum to 1.0, got {}",
                self.key,
                w.total()
            )));
        }

        let thresholds = &self.grade_thresholds;
        if thresholds.is_empty() {
            return Err(EngineError::InvalidProfile(format!(
                "{}: grade threshold table is empty",
                self.key
            )));
        }
        for pair in thresholds.windows(2) {
            if pair[0].min_score <= pair[1].min_score || pair[0].grade <= pair[1].grade {
                return Err(EngineError::InvalidProfile(format!(
                    "{}: grade thresholds must be strictly descending",
                    self.key
                )));
            }
        }
        if thresholds.last().map(|t| t.min_score) != Some(0.0) {
            return Err(EngineError::InvalidProfile(format!(
                "{}: lowest grade threshold must start at 0",
                self.key
            )));
        }

        if self.seasonal_pattern.iter().any(|m| *m <= 0.0) {
            return Err(EngineError::InvalidProfile(format!(
                "{}: seasonal pattern values must be positive",
                self.key
            )));
        }
        if self.default_price.map(|p| p <= Decimal::ZERO).unwrap_or(false) {
            return Err(EngineError::InvalidProfile(format!(
                "{}: default price must be positive",
                self.key
            )));
        }

        Ok(())
    }

    /// Grade for an overall score: first threshold, scanning high to low,
    /// whose minimum the score meets
    pub fn grade_for(&self, score: f64) -> QualityGrade {
        self.grade_thresholds
            .iter()
            .find(|t| score >= t.min_score)
            .or_else(|| self.grade_thresholds.last())
            .map(|t| t.grade)
            .unwrap_or(QualityGrade::D)
    }

    /// Minimum score of a grade, if the table has it
    pub fn threshold_of(&self, grade: QualityGrade) -> Option<f64> {
        self.grade_thresholds
            .iter()
            .find(|t| t.grade == grade)
            .map(|t| t.min_score)
    }

    pub fn cocoa() -> Self {
        Self {
            key: "cocoa".to_string(),
            display_name: "Cocoa beans".to_string(),
            ideal_color: RgbColor::new(101, 67, 33),
            optimal_brightness: 75.0,
            unit_vocabulary: words(&["bean", "seed", "cocoa", "nut"]),
            defect_vocabulary: words(&[
                "mold", "mould", "insect", "crack", "rot", "fung", "pest", "germinat", "slate",
                "broken", "damage",
            ]),
            clean_vocabulary: words(&["clean", "uniform", "smooth", "fresh"]),
            dirty_vocabulary: words(&["dirt", "dust", "debris", "stone", "soil", "foreign"]),
            weights: MetricWeights {
                bean_size_uniformity: 0.20,
                color_consistency: 0.25,
                moisture_estimate: 0.20,
                defect_score: 0.25,
                cleanliness: 0.10,
            },
            grade_thresholds: standard_thresholds(90.0, 75.0, 60.0, 40.0),
            uniformity_scale: 50_000.0,
            defect_penalty: 30.0,
            // West African main crop arrives October-March
            seasonal_pattern: [
                0.95, 0.95, 1.00, 1.05, 1.10, 1.10, 1.10, 1.05, 1.00, 0.95, 0.90, 0.90,
            ],
            default_price: Some(Decimal::from(2500)),
            currency: "USD".to_string(),
            unit: "tonne".to_string(),
        }
    }

    pub fn coffee() -> Self {
        Self {
            key: "coffee".to_string(),
            display_name: "Green coffee".to_string(),
            ideal_color: RgbColor::new(120, 134, 100),
            optimal_brightness: 125.0,
            unit_vocabulary: words(&["bean", "seed", "coffee", "cherry"]),
            defect_vocabulary: words(&[
                "black", "sour", "mold", "mould", "insect", "broken", "chip", "fung", "rot",
                "crack", "withered", "immature",
            ]),
            clean_vocabulary: words(&["clean", "uniform", "smooth", "fresh"]),
            dirty_vocabulary: words(&[
                "dirt", "dust", "debris", "stone", "soil", "foreign", "husk", "stick",
            ]),
            weights: MetricWeights {
                bean_size_uniformity: 0.25,
                color_consistency: 0.20,
                moisture_estimate: 0.15,
                defect_score: 0.30,
                cleanliness: 0.10,
            },
            grade_thresholds: standard_thresholds(85.0, 80.0, 70.0, 60.0),
            uniformity_scale: 60_000.0,
            defect_penalty: 25.0,
            // Northern Thai harvest runs November-February
            seasonal_pattern: [
                0.95, 0.95, 1.00, 1.00, 1.05, 1.10, 1.10, 1.10, 1.05, 1.00, 0.95, 0.95,
            ],
            default_price: Some(Decimal::from(4500)),
            currency: "USD".to_string(),
            unit: "tonne".to_string(),
        }
    }

    pub fn generic() -> Self {
        Self {
            key: GENERIC_COMMODITY.to_string(),
            display_name: "Generic produce".to_string(),
            ideal_color: RgbColor::new(139, 115, 85),
            optimal_brightness: 110.0,
            unit_vocabulary: words(&["seed", "grain", "bean", "kernel", "nut"]),
            defect_vocabulary: words(&["mold", "mould", "insect", "crack", "rot", "fung", "pest"]),
            clean_vocabulary: words(&["clean", "uniform", "fresh"]),
            dirty_vocabulary: words(&["dirt", "dust", "debris", "stone", "soil"]),
            weights: MetricWeights {
                bean_size_uniformity: 0.20,
                color_consistency: 0.20,
                moisture_estimate: 0.20,
                defect_score: 0.20,
                cleanliness: 0.20,
            },
            grade_thresholds: standard_thresholds(90.0, 75.0, 60.0, 40.0),
            uniformity_scale: 50_000.0,
            defect_penalty: 30.0,
            seasonal_pattern: [1.0; 12],
            default_price: None,
            currency: "USD".to_string(),
            unit: "tonne".to_string(),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn standard_thresholds(a_plus: f64, a: f64, b: f64, c: f64) -> Vec<GradeThreshold> {
    vec![
        GradeThreshold { grade: QualityGrade::APlus, min_score: a_plus },
        GradeThreshold { grade: QualityGrade::A, min_score: a },
        GradeThreshold { grade: QualityGrade::B, min_score: b },
        GradeThreshold { grade: QualityGrade::C, min_score: c },
        GradeThreshold { grade: QualityGrade::D, min_score: 0.0 },
    ]
}

/// Registry of commodity profiles keyed by lowercase commodity key
#[derive(Debug, Clone)]
pub struct CommodityCatalog {
    profiles: HashMap<String, CommodityProfile>,
}

impl Default for CommodityCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CommodityCatalog {
    /// Catalog with the cocoa, coffee and generic profiles
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();
        for profile in [
            CommodityProfile::cocoa(),
            CommodityProfile::coffee(),
            CommodityProfile::generic(),
        ] {
            profiles.insert(profile.key.clone(), profile);
        }
        Self { profiles }
    }

    /// Add or replace a profile after checking its invariants
    pub fn insert(&mut self, mut profile: CommodityProfile) -> EngineResult<()> {
        profile.validate()?;
        profile.key = normalize_key(&profile.key);
        self.profiles.insert(profile.key.clone(), profile);
        Ok(())
    }

    pub fn get(&self, commodity: &str) -> Option<&CommodityProfile> {
        self.profiles.get(&normalize_key(commodity))
    }

    /// Profile for the commodity, or the generic profile when it has none
    pub fn profile_or_generic(&self, commodity: &str) -> CommodityProfile {
        self.get(commodity)
            .or_else(|| self.profiles.get(GENERIC_COMMODITY))
            .cloned()
            .unwrap_or_else(CommodityProfile::generic)
    }

    /// Static fallback price; only commodities with their own profile have one
    pub fn default_price(&self, commodity: &str) -> Option<Decimal> {
        self.get(commodity).and_then(|p| p.default_price)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.profiles.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn profiles(&self) -> impl Iterator<Item = &CommodityProfile> {
        self.profiles.values()
    }
}

/// Lowercase, trimmed commodity key
pub fn normalize_key(commodity: &str) -> String {
    commodity.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid() {
        for profile in CommodityCatalog::builtin().profiles() {
            assert!(profile.validate().is_ok(), "{} invalid", profile.key);
        }
    }

    #[test]
    fn cocoa_grade_table() {
        let cocoa = CommodityProfile::cocoa();
        assert_eq!(cocoa.grade_for(95.0), QualityGrade::APlus);
        assert_eq!(cocoa.grade_for(90.0), QualityGrade::APlus);
        assert_eq!(cocoa.grade_for(82.0), QualityGrade::A);
        assert_eq!(cocoa.grade_for(60.0), QualityGrade::B);
        assert_eq!(cocoa.grade_for(59.99), QualityGrade::C);
        assert_eq!(cocoa.grade_for(10.0), QualityGrade::D);
    }

    #[test]
    fn overlapping_thresholds_rejected() {
        let mut profile = CommodityProfile::cocoa();
        profile.grade_thresholds[1].min_score = 95.0;
        assert!(matches!(
            profile.validate(),
            Err(EngineError::InvalidProfile(_))
        ));
    }

    #[test]
    fn non_exhaustive_thresholds_rejected() {
        let mut profile = CommodityProfile::cocoa();
        profile.grade_thresholds.last_mut().unwrap().min_score = 10.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut profile = CommodityProfile::coffee();
        profile.weights.cleanliness = 0.5;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn unknown_commodity_uses_generic_profile() {
        let catalog = CommodityCatalog::builtin();
        assert_eq!(catalog.profile_or_generic("vanilla").key, GENERIC_COMMODITY);
        assert_eq!(catalog.profile_or_generic(" Cocoa ").key, "cocoa");
    }

    #[test]
    fn fallback_price_only_for_known_commodities() {
        let catalog = CommodityCatalog::builtin();
        assert_eq!(catalog.default_price("cocoa"), Some(Decimal::from(2500)));
        assert_eq!(catalog.default_price("vanilla"), None);
        assert_eq!(catalog.default_price(GENERIC_COMMODITY), None);
    }

    #[test]
    fn new_commodity_is_a_data_change() {
        let mut catalog = CommodityCatalog::builtin();
        let mut cashew = CommodityProfile::generic();
        cashew.key = "Cashew".to_string();
        cashew.default_price = Some(Decimal::from(1400));
        catalog.insert(cashew).unwrap();
        assert_eq!(catalog.default_price("cashew"), Some(Decimal::from(1400)));
    }
}
