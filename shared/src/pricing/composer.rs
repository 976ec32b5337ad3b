//! Price composition
//!
//! Applies the nine factors to the base price in a fixed order, sizes the
//! negotiation range from volatility, scores confidence and derives selling
//! recommendations.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BasePrice, MarketConditions, PriceEstimate, PriceRange, PricingAction, PricingFactors,
    PricingRecommendation, TrendDirection,
};
use crate::types::round_to;
use crate::validation::{validate_base_price, validate_market_conditions};

/// How long an estimate stays valid; prices and weather are perishable
pub const ESTIMATE_VALIDITY_HOURS: i64 = 6;
/// Confidence ceiling for estimates built on fallback inputs
pub const DEGRADED_CONFIDENCE_CAP: f64 = 0.4;
/// Local traded volume (kg) above which the market counts as liquid
pub const DEFAULT_LIQUIDITY_THRESHOLD_KG: f64 = 1000.0;

const BASE_CONFIDENCE: f64 = 0.8;
const MIN_RANGE_FRACTION: f64 = 0.1;
const MAX_RANGE_FRACTION: f64 = 0.5;

/// Builds [`PriceEstimate`]s from a base price, factors and market snapshot
#[derive(Debug, Clone)]
pub struct PriceComposer {
    liquidity_threshold_kg: f64,
}

impl Default for PriceComposer {
    fn default() -> Self {
        Self {
            liquidity_threshold_kg: DEFAULT_LIQUIDITY_THRESHOLD_KG,
        }
    }
}

impl PriceComposer {
    pub fn new(liquidity_threshold_kg: f64) -> Self {
        Self {
            liquidity_threshold_kg,
        }
    }

    pub fn compose(
        &self,
        base: &BasePrice,
        factors: &PricingFactors,
        market: &MarketConditions,
    ) -> EngineResult<PriceEstimate> {
        self.compose_at(base, factors, market, Utc::now())
    }

    /// Same as [`compose`](Self::compose) with an explicit computation time
    pub fn compose_at(
        &self,
        base: &BasePrice,
        factors: &PricingFactors,
        market: &MarketConditions,
        computed_at: DateTime<Utc>,
    ) -> EngineResult<PriceEstimate> {
        validate_base_price(base.price)?;
        validate_market_conditions(market)?;

        let adjusted_price = adjusted_price(base.price, factors)?;
        let volatility = market.global_price_trend.volatility.clamp(0.0, 1.0);
        let price_range = negotiation_range(adjusted_price, volatility)?;

        let mut confidence = self.confidence(market);
        if base.degraded {
            confidence = confidence.min(DEGRADED_CONFIDENCE_CAP);
        }

        let recommendations = recommendations(adjusted_price, confidence, market);

        Ok(PriceEstimate {
            commodity: base.commodity.clone(),
            base_price: base.price,
            adjusted_price,
            price_range,
            factors: *factors,
            confidence,
            volatility,
            degraded: base.degraded,
            currency: base.currency.clone(),
            unit: base.unit.clone(),
            computed_at,
            valid_until: computed_at + Duration::hours(ESTIMATE_VALIDITY_HOURS),
            recommendations,
        })
    }

    /// 0.8 less volatility, plus stability and liquidity bonuses, in [0.3, 1.0]
    pub fn confidence(&self, market: &MarketConditions) -> f64 {
        let trend = &market.global_price_trend;
        let mut confidence = BASE_CONFIDENCE - trend.volatility.clamp(0.0, 1.0) * 0.2;

        if trend.direction == TrendDirection::Stable {
            confidence += 0.1;
        }
        if market.local_market_stats.trading_volume > self.liquidity_threshold_kg {
            confidence += 0.05;
        }

        round_to(confidence.clamp(0.3, 1.0), 4)
    }
}

/// Lower an estimate's confidence and flag it when any input was a fallback
pub fn mark_degraded(estimate: &mut PriceEstimate) {
    estimate.degraded = true;
    estimate.confidence = estimate.confidence.min(DEGRADED_CONFIDENCE_CAP);
}

/// Base price times the nine factors, in fixed order, rounded to cents
pub fn adjusted_price(base: Decimal, f: &PricingFactors) -> EngineResult<Decimal> {
    let base = base
        .to_f64()
        .ok_or_else(|| EngineError::validation("base_price", "Base price out of range"))?;

    let adjusted = base
        * f.quality_multiplier
        * f.market_demand
        * f.seasonal_adjustment
        * (1.0 + f.weather_impact)
        * (1.0 + f.location_premium)
        * (1.0 + f.certification_bonus)
        * f.urgency_factor
        * (1.0 - f.volume_discount)
        * f.reputation_adjustment;

    let adjusted = Decimal::from_f64(adjusted)
        .ok_or_else(|| EngineError::validation("adjusted_price", "Adjusted price out of range"))?
        .round_dp(2);

    if adjusted <= Decimal::ZERO {
        return Err(EngineError::validation(
            "adjusted_price",
            "Adjusted price must be positive",
        ));
    }
    Ok(adjusted)
}

/// Share of the adjusted price spanned by the negotiation range
pub fn range_fraction(volatility: f64) -> f64 {
    round_to(
        (MIN_RANGE_FRACTION + volatility.clamp(0.0, 1.0) * 0.4)
            .clamp(MIN_RANGE_FRACTION, MAX_RANGE_FRACTION),
        4,
    )
}

/// Symmetric band around the adjusted price, sized by volatility
pub fn negotiation_range(adjusted: Decimal, volatility: f64) -> EngineResult<PriceRange> {
    let fraction = Decimal::from_f64(range_fraction(volatility))
        .ok_or_else(|| EngineError::validation("volatility", "Volatility out of range"))?;
    let half_width = adjusted * fraction / Decimal::from(2);

    Ok(PriceRange {
        minimum: adjusted - half_width,
        recommended: adjusted,
        maximum: adjusted + half_width,
    })
}

/// Position of a price within the local min-max range, when there is one
pub fn local_percentile(price: Decimal, market: &MarketConditions) -> Option<f64> {
    let stats = &market.local_market_stats;
    let spread = stats.max_price - stats.min_price;
    if spread <= Decimal::ZERO {
        return None;
    }
    ((price - stats.min_price) / spread).to_f64()
}

/// Selling strategy rules over trend, confidence and local percentile
pub fn recommendations(
    adjusted: Decimal,
    confidence: f64,
    market: &MarketConditions,
) -> Vec<PricingRecommendation> {
    let trend = market.global_price_trend.direction;
    let percentile = local_percentile(adjusted, market);
    let mut out = Vec::new();

    if trend == TrendDirection::Falling {
        out.push(PricingRecommendation {
            action: PricingAction::ImmediateSale,
            confidence: round_to(confidence * 0.9, 4),
            rationale: "Global prices are falling; selling now avoids further erosion".to_string(),
        });
    }

    if trend == TrendDirection::Rising && confidence >= 0.6 {
        out.push(PricingRecommendation {
            action: PricingAction::WaitForBetterPrice,
            confidence: round_to(confidence * 0.8, 4),
            rationale: "Global prices are rising and the estimate is reliable; holding may pay"
                .to_string(),
        });
    }

    if let Some(p) = percentile.filter(|p| *p >= 0.8) {
        out.push(PricingRecommendation {
            action: PricingAction::PremiumPositioning,
            confidence: round_to(confidence * 0.85, 4),
            rationale: format!(
                "Estimate sits at the {:.0}th percentile of the local range; position as a premium lot",
                (p * 100.0).min(100.0)
            ),
        });
    }

    let below_local = percentile.map(|p| p < 0.3).unwrap_or(false);
    if confidence < 0.5 || below_local {
        let rationale = if below_local {
            "Estimate is in the lower part of the local range; negotiate toward the average"
        } else {
            "Estimate confidence is low; use the range as a starting point for negotiation"
        };
        out.push(PricingRecommendation {
            action: PricingAction::Negotiate,
            confidence: round_to(confidence * 0.7, 4),
            rationale: rationale.to_string(),
        });
    }

    if out.is_empty() {
        out.push(PricingRecommendation {
            action: PricingAction::Negotiate,
            confidence: round_to(confidence * 0.7, 4),
            rationale: "Market is balanced; negotiate within the suggested range".to_string(),
        });
    }

    out
}
