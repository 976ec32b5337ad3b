//! Price source, factor and estimate models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One successful quote from an external price source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSource {
    pub source_id: String,
    pub price: Decimal,
    pub currency: String,
    pub as_of: DateTime<Utc>,
    /// Trust weight in [0, 1]
    pub reliability: f64,
    pub unit: String,
}

/// Aggregated base price for a commodity at a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasePrice {
    pub commodity: String,
    pub price: Decimal,
    pub currency: String,
    pub unit: String,
    pub sources: Vec<PriceSource>,
    /// True when no source answered and the static default was used
    pub degraded: bool,
    #[serde(default)]
    pub from_cache: bool,
    pub fetched_at: DateTime<Utc>,
}

/// The nine independent adjustments applied to the base price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricingFactors {
    /// Multiplier in [0.7, 1.4]
    pub quality_multiplier: f64,
    /// Multiplier in [0.5, 2.0]
    pub market_demand: f64,
    /// Multiplier in [0.5, 2.0]
    pub seasonal_adjustment: f64,
    /// Additive in [-0.5, 0.5], applied as (1 + x)
    pub weather_impact: f64,
    /// Additive in [-0.1, 0.2], applied as (1 + x)
    pub location_premium: f64,
    /// Additive in [0, 0.35], applied as (1 + x)
    pub certification_bonus: f64,
    /// Multiplier >= 1.0
    pub urgency_factor: f64,
    /// Discount in [0, 0.3], applied as (1 - x)
    pub volume_discount: f64,
    /// Multiplier in [0.9, 1.1]
    pub reputation_adjustment: f64,
}

impl Default for PricingFactors {
    fn default() -> Self {
        Self {
            quality_multiplier: 1.0,
            market_demand: 1.0,
            seasonal_adjustment: 1.0,
            weather_impact: 0.0,
            location_premium: 0.0,
            certification_bonus: 0.0,
            urgency_factor: 1.0,
            volume_discount: 0.0,
            reputation_adjustment: 1.0,
        }
    }
}

/// Negotiation band around the recommended price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub minimum: Decimal,
    pub recommended: Decimal,
    pub maximum: Decimal,
}

/// Selling strategy suggested alongside an estimate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PricingAction {
    ImmediateSale,
    WaitForBetterPrice,
    Negotiate,
    PremiumPositioning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingRecommendation {
    pub action: PricingAction,
    pub confidence: f64,
    pub rationale: String,
}

/// Final, auditable price estimate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceEstimate {
    pub commodity: String,
    pub base_price: Decimal,
    pub adjusted_price: Decimal,
    pub price_range: PriceRange,
    pub factors: PricingFactors,
    pub confidence: f64,
    pub volatility: f64,
    pub degraded: bool,
    pub currency: String,
    pub unit: String,
    pub computed_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub recommendations: Vec<PricingRecommendation>,
}
