//! WebAssembly module for the Commodity Pricing Platform
//!
//! Runs the same quality scoring and price composition as the server so a
//! field app can grade a photo and preview a price offline:
//! - Quality scoring from an image analysis
//! - Grade lookup for a commodity
//! - Pricing factor computation
//! - Price composition
//!
//! Every entry point takes and returns JSON strings.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;

use shared::{
    BasePrice, BuyerProfile, CommodityCatalog, EngineError, MarketConditions, PriceComposer,
    PricingFactorCalculator, PricingFactors, ProductMetadata, QualityResult, QualityScorer,
    VisionAnalysis,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn parse<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn engine_error(e: EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn warn(_message: &str) {}

/// Score an image analysis for a lot.
///
/// With `allow_degraded` a photo too sparse to score yields a fallback grade
/// flagged `degraded` instead of an error.
#[wasm_bindgen]
pub fn score_quality(
    vision_json: &str,
    metadata_json: &str,
    allow_degraded: bool,
) -> Result<String, JsValue> {
    let vision: VisionAnalysis = parse("vision", vision_json)?;
    let metadata: ProductMetadata = parse("metadata", metadata_json)?;

    let scorer = QualityScorer::new(CommodityCatalog::builtin());
    let result = if allow_degraded {
        scorer.score_or_fallback(&vision, &metadata)
    } else {
        scorer.score(&vision, &metadata)
    }
    .map_err(engine_error)?;

    if result.degraded {
        warn("Photo could not be analysed; using fallback grade");
    }
    to_json(&result)
}

/// Grade a score against a commodity's thresholds (generic when unknown)
#[wasm_bindgen]
pub fn grade_for_score(commodity: &str, score: f64) -> String {
    CommodityCatalog::builtin()
        .profile_or_generic(commodity)
        .grade_for(score)
        .to_string()
}

/// Keys of the built-in commodity profiles as a JSON array
#[wasm_bindgen]
pub fn list_commodities() -> Result<String, JsValue> {
    to_json(&CommodityCatalog::builtin().keys())
}

/// Compute the nine pricing factors as of today
#[wasm_bindgen]
pub fn compute_factors(
    quality_json: &str,
    market_json: &str,
    metadata_json: &str,
    buyer_json: Option<String>,
) -> Result<String, JsValue> {
    compute_factors_at(quality_json, market_json, metadata_json, buyer_json.as_deref(), now())
}

fn compute_factors_at(
    quality_json: &str,
    market_json: &str,
    metadata_json: &str,
    buyer_json: Option<&str>,
    at: DateTime<Utc>,
) -> Result<String, JsValue> {
    let quality: QualityResult = parse("quality", quality_json)?;
    let market: MarketConditions = parse("market", market_json)?;
    let metadata: ProductMetadata = parse("metadata", metadata_json)?;
    let buyer: Option<BuyerProfile> = buyer_json.map(|json| parse("buyer", json)).transpose()?;

    let factors = PricingFactorCalculator::new(CommodityCatalog::builtin())
        .compute_factors(&quality, &market, &metadata, buyer.as_ref(), at.date_naive())
        .map_err(engine_error)?;
    to_json(&factors)
}

/// Compose a price estimate from a base price, factors and market snapshot
#[wasm_bindgen]
pub fn compose_price(
    base_json: &str,
    factors_json: &str,
    market_json: &str,
) -> Result<String, JsValue> {
    compose_price_at(base_json, factors_json, market_json, now())
}

fn compose_price_at(
    base_json: &str,
    factors_json: &str,
    market_json: &str,
    at: DateTime<Utc>,
) -> Result<String, JsValue> {
    let base: BasePrice = parse("base price", base_json)?;
    let factors: PricingFactors = parse("factors", factors_json)?;
    let market: MarketConditions = parse("market", market_json)?;

    let estimate = PriceComposer::default()
        .compose_at(&base, &factors, &market, at)
        .map_err(engine_error)?;
    to_json(&estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::{PriceEstimate, QualityGrade};

    const VISION: &str = r#"{
        "colors": [{"r": 101, "g": 67, "b": 33, "pixel_fraction": 1.0}],
        "labels": [{"description": "cocoa bean", "confidence": 0.9}]
    }"#;

    const METADATA: &str = r#"{
        "commodity": "cocoa",
        "variety": null,
        "available_quantity_kg": 1000.0,
        "harvest_date": null,
        "origin": null,
        "seller_reputation": null
    }"#;

    const BASE: &str = r#"{
        "commodity": "cocoa",
        "price": "2500",
        "currency": "USD",
        "unit": "tonne",
        "sources": [],
        "degraded": false,
        "from_cache": false,
        "fetched_at": "2024-06-01T00:00:00Z"
    }"#;

    fn market_json() -> String {
        serde_json::to_string(&MarketConditions::default()).unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_grade_for_score() {
        assert_eq!(grade_for_score("cocoa", 82.0), "A");
        assert_eq!(grade_for_score("cocoa", 95.0), "A+");
        assert_eq!(grade_for_score("unknown", 10.0), "D");
    }

    #[test]
    fn test_score_quality() {
        let json = score_quality(VISION, METADATA, false).unwrap();
        let result: QualityResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result.commodity, "cocoa");
        assert_eq!(result.metrics.color_consistency, Some(100.0));
        assert!(!result.degraded);
    }

    #[test]
    fn test_score_quality_degraded_fallback() {
        let json = score_quality("{}", METADATA, true).unwrap();
        let result: QualityResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result.grade, QualityGrade::B);
        assert!(result.degraded);
    }

    #[test]
    fn test_factors_then_compose() {
        let quality = score_quality(VISION, METADATA, false).unwrap();
        let factors = compute_factors_at(&quality, &market_json(), METADATA, None, at()).unwrap();
        let estimate = compose_price_at(BASE, &factors, &market_json(), at()).unwrap();

        let estimate: PriceEstimate = serde_json::from_str(&estimate).unwrap();
        assert!(estimate.price_range.minimum < estimate.adjusted_price);
        assert!(estimate.adjusted_price < estimate.price_range.maximum);
        assert_eq!(estimate.computed_at, at());
    }

    #[test]
    fn test_neutral_buyer_factors() {
        let quality = score_quality(VISION, METADATA, false).unwrap();
        let factors = compute_factors_at(&quality, &market_json(), METADATA, None, at()).unwrap();
        let factors: PricingFactors = serde_json::from_str(&factors).unwrap();
        assert_eq!(factors.urgency_factor, 1.0);
        assert_eq!(factors.volume_discount, 0.0);
        assert_eq!(factors.reputation_adjustment, 1.0);
    }
}
