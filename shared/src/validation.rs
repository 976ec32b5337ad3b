//! Input validation for the scoring and pricing engines
//!
//! Malformed input is rejected here, before any computation runs.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    normalize_key, BuyerProfile, MarketConditions, ProductMetadata, VisionAnalysis,
};
use crate::types::GpsCoordinates;

/// Highest rating on the reputation scale
pub const MAX_REPUTATION: f64 = 5.0;

// ============================================================================
// Location
// ============================================================================

/// Validate latitude/longitude ranges
pub fn validate_coordinates(field: &str, coords: &GpsCoordinates) -> EngineResult<()> {
    if coords.latitude < Decimal::from(-90) || coords.latitude > Decimal::from(90) {
        return Err(EngineError::validation(
            format!("{}.latitude", field),
            "Latitude must be between -90 and 90",
        ));
    }
    if coords.longitude < Decimal::from(-180) || coords.longitude > Decimal::from(180) {
        return Err(EngineError::validation(
            format!("{}.longitude", field),
            "Longitude must be between -180 and 180",
        ));
    }
    Ok(())
}

// ============================================================================
// Product and buyer
// ============================================================================

/// Longest accepted commodity key
pub const MAX_COMMODITY_KEY_LEN: usize = 64;

/// Commodity keys end up in provider URL paths: after normalization only
/// `[a-z0-9_-]` is allowed
pub fn validate_commodity_key(commodity: &str) -> EngineResult<()> {
    let key = normalize_key(commodity);
    if key.is_empty() {
        return Err(EngineError::validation("commodity", "Commodity is required"));
    }
    if key.len() > MAX_COMMODITY_KEY_LEN {
        return Err(EngineError::validation(
            "commodity",
            format!("Commodity must be at most {} characters", MAX_COMMODITY_KEY_LEN),
        ));
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-';
    if !key.chars().all(allowed) {
        return Err(EngineError::validation(
            "commodity",
            "Commodity may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

/// Validate product metadata
pub fn validate_product_metadata(metadata: &ProductMetadata) -> EngineResult<()> {
    validate_commodity_key(&metadata.commodity)?;
    if !metadata.available_quantity_kg.is_finite() || metadata.available_quantity_kg < 0.0 {
        return Err(EngineError::validation(
            "available_quantity_kg",
            "Available quantity cannot be negative",
        ));
    }
    if let Some(origin) = &metadata.origin {
        validate_coordinates("origin", origin)?;
    }
    if let Some(rep) = metadata.seller_reputation {
        validate_reputation("seller_reputation", rep)?;
    }
    Ok(())
}

/// Validate an optional buyer profile
pub fn validate_buyer_profile(buyer: &BuyerProfile) -> EngineResult<()> {
    if !buyer.order_volume_kg.is_finite() || buyer.order_volume_kg < 0.0 {
        return Err(EngineError::validation(
            "buyer.order_volume_kg",
            "Order volume cannot be negative",
        ));
    }
    if let Some(rep) = buyer.reputation {
        validate_reputation("buyer.reputation", rep)?;
    }
    if let Some(location) = &buyer.location {
        validate_coordinates("buyer.location", location)?;
    }
    Ok(())
}

/// Validate a 0-5 reputation rating
pub fn validate_reputation(field: &str, reputation: f64) -> EngineResult<()> {
    if !(0.0..=MAX_REPUTATION).contains(&reputation) {
        return Err(EngineError::validation(
            field,
            "Reputation must be between 0 and 5",
        ));
    }
    Ok(())
}

// ============================================================================
// Market snapshot
// ============================================================================

/// Validate the documented ranges of a market snapshot
pub fn validate_market_conditions(market: &MarketConditions) -> EngineResult<()> {
    if !(0.5..=2.0).contains(&market.seasonal_factor) {
        return Err(EngineError::validation(
            "market.seasonal_factor",
            "Seasonal factor must be between 0.5 and 2.0",
        ));
    }
    if !(-0.5..=0.5).contains(&market.weather_impact) {
        return Err(EngineError::validation(
            "market.weather_impact",
            "Weather impact must be between -0.5 and 0.5",
        ));
    }
    if !(0.0..=1.0).contains(&market.global_price_trend.volatility) {
        return Err(EngineError::validation(
            "market.global_price_trend.volatility",
            "Volatility must be between 0 and 1",
        ));
    }

    let stats = &market.local_market_stats;
    if stats.min_price < Decimal::ZERO || stats.max_price < stats.min_price {
        return Err(EngineError::validation(
            "market.local_market_stats",
            "Local price range must be non-negative with min <= max",
        ));
    }
    if !(0.0..=1.0).contains(&stats.market_share) {
        return Err(EngineError::validation(
            "market.local_market_stats.market_share",
            "Market share must be between 0 and 1",
        ));
    }
    if !stats.trading_volume.is_finite() || stats.trading_volume < 0.0 {
        return Err(EngineError::validation(
            "market.local_market_stats.trading_volume",
            "Trading volume cannot be negative",
        ));
    }
    Ok(())
}

// ============================================================================
// Image analysis
// ============================================================================

/// Validate confidences and pixel fractions of an image analysis
pub fn validate_vision_analysis(vision: &VisionAnalysis) -> EngineResult<()> {
    let unit = 0.0..=1.0;

    if vision.objects.iter().any(|o| !unit.contains(&o.confidence)) {
        return Err(EngineError::validation(
            "objects.confidence",
            "Object confidence must be between 0 and 1",
        ));
    }
    if vision.labels.iter().any(|l| !unit.contains(&l.confidence)) {
        return Err(EngineError::validation(
            "labels.confidence",
            "Label confidence must be between 0 and 1",
        ));
    }
    if vision.colors.iter().any(|c| !unit.contains(&c.pixel_fraction)) {
        return Err(EngineError::validation(
            "colors.pixel_fraction",
            "Pixel fraction must be between 0 and 1",
        ));
    }
    Ok(())
}

/// Validate a base price before composition
pub fn validate_base_price(price: Decimal) -> EngineResult<()> {
    if price <= Decimal::ZERO {
        return Err(EngineError::validation("base_price", "Base price must be positive"));
    }
    Ok(())
}
