//! The nine pricing adjustment factors
//!
//! Each factor is computed by its own function and clamped to its own
//! bounds, so every adjustment in an estimate can be inspected on its own.

use chrono::{Datelike, NaiveDate};

use crate::error::EngineResult;
use crate::models::{
    BuyerProfile, CertificationType, CommodityCatalog, CommodityProfile, MarketConditions,
    PricingFactors, ProductMetadata, QualityGrade, QualityResult, TrendDirection,
};
use crate::types::{GpsCoordinates, Level};
use crate::validation::{
    validate_buyer_profile, validate_market_conditions, validate_product_metadata,
};

pub const QUALITY_BOUNDS: (f64, f64) = (0.7, 1.4);
pub const DEMAND_BOUNDS: (f64, f64) = (0.5, 2.0);
pub const SEASONAL_BOUNDS: (f64, f64) = (0.5, 2.0);
pub const WEATHER_BOUNDS: (f64, f64) = (-0.5, 0.5);
pub const LOCATION_BOUNDS: (f64, f64) = (-0.1, 0.2);
pub const CERTIFICATION_CAP: f64 = 0.35;
pub const MAX_URGENCY: f64 = 1.15;
pub const MAX_VOLUME_DISCOUNT: f64 = 0.3;
pub const REPUTATION_BOUNDS: (f64, f64) = (0.9, 1.1);

/// Distance at which the location premium reaches its ceiling
const LOCATION_CEILING_KM: f64 = 1500.0;
/// Orders smaller than this share of the lot get no discount
const MIN_DISCOUNT_RATIO: f64 = 0.1;
const NEUTRAL_REPUTATION: f64 = 2.5;
const FULL_BONUS_CERTIFICATIONS: usize = 3;

/// Computes [`PricingFactors`] from a quality result, a market snapshot and
/// an optional buyer
#[derive(Debug, Clone, Default)]
pub struct PricingFactorCalculator {
    catalog: CommodityCatalog,
}

impl PricingFactorCalculator {
    pub fn new(catalog: CommodityCatalog) -> Self {
        Self { catalog }
    }

    /// Compute all nine factors.
    ///
    /// `as_of` anchors the calendar month, harvest age and delivery window so
    /// the result is reproducible. Without a buyer the buyer-driven factors
    /// take their neutral values (urgency 1.0, volume discount 0, reputation 1.0).
    pub fn compute_factors(
        &self,
        quality: &QualityResult,
        market: &MarketConditions,
        metadata: &ProductMetadata,
        buyer: Option<&BuyerProfile>,
        as_of: NaiveDate,
    ) -> EngineResult<PricingFactors> {
        validate_product_metadata(metadata)?;
        validate_market_conditions(market)?;
        if let Some(buyer) = buyer {
            validate_buyer_profile(buyer)?;
        }

        let profile = self.catalog.profile_or_generic(&metadata.commodity);

        Ok(PricingFactors {
            quality_multiplier: quality_multiplier(quality),
            market_demand: market_demand(market),
            seasonal_adjustment: seasonal_adjustment(
                &profile,
                metadata.harvest_date,
                market.seasonal_factor,
                as_of,
            ),
            weather_impact: weather_impact(market.weather_impact),
            location_premium: location_premium(
                metadata.origin.as_ref(),
                buyer.and_then(|b| b.location.as_ref()),
            ),
            certification_bonus: certification_bonus(&metadata.certifications),
            urgency_factor: urgency_factor(buyer, as_of),
            volume_discount: volume_discount(buyer, metadata.available_quantity_kg),
            reputation_adjustment: reputation_adjustment(metadata.seller_reputation, buyer),
        })
    }
}

fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    value.clamp(min, max)
}

/// Grade base multiplier, its deviation from 1 scaled by confidence, then
/// nudged by the raw score
pub fn quality_multiplier(quality: &QualityResult) -> f64 {
    let base = match quality.grade {
        QualityGrade::APlus => 1.25,
        QualityGrade::A => 1.15,
        QualityGrade::B => 1.0,
        QualityGrade::C => 0.88,
        QualityGrade::D => 0.78,
    };
    let confidence = quality.confidence.clamp(0.0, 1.0);
    let scaled = 1.0 + (base - 1.0) * (0.5 + 0.5 * confidence);
    let tuned = scaled + (quality.overall_score - 70.0) * 0.002;

    clamp(tuned, QUALITY_BOUNDS)
}

/// Demand pushes up, supply pushes down, the global trend tilts both
pub fn market_demand(market: &MarketConditions) -> f64 {
    let demand = match market.demand_level {
        Level::Low => 0.8,
        Level::Medium => 1.0,
        Level::High => 1.25,
    };
    let supply = match market.supply_level {
        Level::Low => 1.2,
        Level::Medium => 1.0,
        Level::High => 0.85,
    };
    let trend = match market.global_price_trend.direction {
        TrendDirection::Rising => 1.05,
        TrendDirection::Falling => 0.95,
        TrendDirection::Stable => 1.0,
    };

    clamp(demand * supply * trend, DEMAND_BOUNDS)
}

/// Freshness multiplier: 1.05 on harvest day decaying linearly to 0.9 after
/// a year; 1.0 when the harvest date is unknown
pub fn harvest_recency(harvest_date: Option<NaiveDate>, as_of: NaiveDate) -> f64 {
    match harvest_date {
        None => 1.0,
        Some(date) => {
            let days = (as_of - date).num_days().max(0) as f64;
            1.05 - 0.15 * (days / 365.0).min(1.0)
        }
    }
}

/// Monthly commodity pattern x harvest recency x market seasonal factor
pub fn seasonal_adjustment(
    profile: &CommodityProfile,
    harvest_date: Option<NaiveDate>,
    market_seasonal_factor: f64,
    as_of: NaiveDate,
) -> f64 {
    let monthly = profile.seasonal_pattern[as_of.month0() as usize];
    let value = monthly * harvest_recency(harvest_date, as_of) * market_seasonal_factor;

    clamp(value, SEASONAL_BOUNDS)
}

pub fn weather_impact(value: f64) -> f64 {
    clamp(value, WEATHER_BOUNDS)
}

/// Linear in transport distance: -0.1 at the farm gate up to 0.2 at
/// 1500 km. Neutral when either end is unknown.
pub fn location_premium(
    origin: Option<&GpsCoordinates>,
    destination: Option<&GpsCoordinates>,
) -> f64 {
    match (origin, destination) {
        (Some(origin), Some(destination)) => {
            let km = origin.distance_km(destination);
            let (min, max) = LOCATION_BOUNDS;
            clamp(min + (max - min) * km / LOCATION_CEILING_KM, LOCATION_BOUNDS)
        }
        _ => 0.0,
    }
}

/// Best three certifications count in full, the rest at half; capped
pub fn certification_bonus(certifications: &[CertificationType]) -> f64 {
    let mut unique: Vec<&CertificationType> = Vec::new();
    for cert in certifications {
        if !unique.contains(&cert) {
            unique.push(cert);
        }
    }

    let mut bonuses: Vec<f64> = unique.iter().map(|c| c.bonus()).collect();
    bonuses.sort_by(|a, b| b.total_cmp(a));

    let total: f64 = bonuses
        .iter()
        .enumerate()
        .map(|(i, bonus)| {
            if i < FULL_BONUS_CERTIFICATIONS {
                *bonus
            } else {
                bonus * 0.5
            }
        })
        .sum();

    total.min(CERTIFICATION_CAP)
}

/// Shorter delivery windows cost more; 1.0 without a buyer or date
pub fn urgency_factor(buyer: Option<&BuyerProfile>, as_of: NaiveDate) -> f64 {
    let Some(date) = buyer.and_then(|b| b.requested_delivery_date) else {
        return 1.0;
    };

    match (date - as_of).num_days() {
        d if d <= 3 => MAX_URGENCY,
        d if d <= 7 => 1.10,
        d if d <= 14 => 1.05,
        _ => 1.0,
    }
}

/// Discount grows with the order's share of the available lot
pub fn volume_discount(buyer: Option<&BuyerProfile>, available_quantity_kg: f64) -> f64 {
    let Some(buyer) = buyer else {
        return 0.0;
    };
    if available_quantity_kg <= 0.0 {
        return 0.0;
    }

    let ratio = buyer.order_volume_kg / available_quantity_kg;
    if ratio < MIN_DISCOUNT_RATIO {
        return 0.0;
    }

    (MAX_VOLUME_DISCOUNT * ratio.min(1.0)).clamp(0.0, MAX_VOLUME_DISCOUNT)
}

/// A reputable seller earns a little more, a reputable buyer pays a little
/// less. Exactly 1.0 without a buyer.
pub fn reputation_adjustment(seller: Option<f64>, buyer: Option<&BuyerProfile>) -> f64 {
    let Some(buyer) = buyer else {
        return 1.0;
    };

    let seller = seller.unwrap_or(NEUTRAL_REPUTATION);
    let buyer = buyer.reputation.unwrap_or(NEUTRAL_REPUTATION);
    let value = 1.0 + 0.05 * (seller - NEUTRAL_REPUTATION) / NEUTRAL_REPUTATION
        - 0.05 * (buyer - NEUTRAL_REPUTATION) / NEUTRAL_REPUTATION;

    clamp(value, REPUTATION_BOUNDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuyerType, QualityMetrics};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quality(grade: QualityGrade, score: f64, confidence: f64) -> QualityResult {
        QualityResult {
            commodity: "cocoa".to_string(),
            overall_score: score,
            grade,
            confidence,
            metrics: QualityMetrics {
                bean_size_uniformity: None,
                color_consistency: None,
                moisture_estimate: None,
                defect_score: score,
                cleanliness: score,
            },
            recommendations: vec![],
            degraded: false,
        }
    }

    fn buyer(order: f64, delivery: Option<NaiveDate>, reputation: Option<f64>) -> BuyerProfile {
        BuyerProfile {
            buyer_type: BuyerType::Processor,
            order_volume_kg: order,
            requested_delivery_date: delivery,
            reputation,
            location: None,
            preferences: vec![],
        }
    }

    #[test]
    fn quality_multiplier_follows_grade() {
        let top = quality_multiplier(&quality(QualityGrade::APlus, 95.0, 1.0));
        let mid = quality_multiplier(&quality(QualityGrade::B, 65.0, 1.0));
        let low = quality_multiplier(&quality(QualityGrade::D, 20.0, 1.0));
        assert!(top > mid && mid > low);
        assert!((top - 1.3).abs() < 1e-9);
        assert!((low - 0.7).abs() < 1e-9);
    }

    #[test]
    fn low_confidence_pulls_quality_toward_neutral() {
        let sure = quality_multiplier(&quality(QualityGrade::A, 80.0, 1.0));
        let unsure = quality_multiplier(&quality(QualityGrade::A, 80.0, 0.0));
        assert!(sure > unsure);
        assert!(unsure > 1.0);
    }

    #[test]
    fn demand_extremes_are_bounded() {
        let mut market = MarketConditions::default();
        market.demand_level = Level::High;
        market.supply_level = Level::Low;
        market.global_price_trend.direction = TrendDirection::Rising;
        assert!((market_demand(&market) - 1.575).abs() < 1e-9);

        market.demand_level = Level::Low;
        market.supply_level = Level::High;
        market.global_price_trend.direction = TrendDirection::Falling;
        let low = market_demand(&market);
        assert!(low >= DEMAND_BOUNDS.0 && low < 1.0);
    }

    #[test]
    fn fresh_harvest_beats_old_harvest() {
        let as_of = date(2024, 5, 1);
        assert!((harvest_recency(Some(as_of), as_of) - 1.05).abs() < 1e-9);
        assert!((harvest_recency(Some(date(2022, 1, 1)), as_of) - 0.9).abs() < 1e-9);
        assert_eq!(harvest_recency(None, as_of), 1.0);
    }

    #[test]
    fn seasonal_uses_calendar_month() {
        let cocoa = CommodityProfile::cocoa();
        // May pattern is 1.10, no harvest date, neutral market
        let value = seasonal_adjustment(&cocoa, None, 1.0, date(2024, 5, 15));
        assert!((value - 1.10).abs() < 1e-9);
    }

    #[test]
    fn location_premium_grows_with_distance() {
        let origin = GpsCoordinates::new("6.69".parse().unwrap(), "-1.62".parse().unwrap());
        let near = GpsCoordinates::new("6.70".parse().unwrap(), "-1.62".parse().unwrap());
        let far = GpsCoordinates::new("51.5".parse().unwrap(), "-0.12".parse().unwrap());

        let near_premium = location_premium(Some(&origin), Some(&near));
        let far_premium = location_premium(Some(&origin), Some(&far));
        assert!(near_premium < 0.0);
        assert_eq!(far_premium, LOCATION_BOUNDS.1);
        assert_eq!(location_premium(Some(&origin), None), 0.0);
    }

    #[test]
    fn certification_bonus_diminishes_and_caps() {
        assert_eq!(certification_bonus(&[]), 0.0);
        assert!((certification_bonus(&[CertificationType::Organic]) - 0.15).abs() < 1e-9);

        // duplicates count once
        let dup = [CertificationType::FairTrade, CertificationType::FairTrade];
        assert!((certification_bonus(&dup) - 0.10).abs() < 1e-9);

        // 0.10 + 0.08 + 0.06 full, then 0.05 * 0.5
        let four = [
            CertificationType::FairTrade,
            CertificationType::RainforestAlliance,
            CertificationType::UTZ,
            CertificationType::ThaiGAP,
        ];
        assert!((certification_bonus(&four) - 0.265).abs() < 1e-9);

        let all = [
            CertificationType::Organic,
            CertificationType::GeographicIndication,
            CertificationType::FairTrade,
            CertificationType::RainforestAlliance,
            CertificationType::UTZ,
        ];
        assert_eq!(certification_bonus(&all), CERTIFICATION_CAP);
    }

    #[test]
    fn urgency_steps_with_delivery_window() {
        let as_of = date(2024, 5, 1);
        assert_eq!(urgency_factor(None, as_of), 1.0);
        assert_eq!(urgency_factor(Some(&buyer(10.0, None, None)), as_of), 1.0);
        assert_eq!(urgency_factor(Some(&buyer(10.0, Some(date(2024, 5, 3)), None)), as_of), 1.15);
        assert_eq!(urgency_factor(Some(&buyer(10.0, Some(date(2024, 5, 8)), None)), as_of), 1.10);
        assert_eq!(urgency_factor(Some(&buyer(10.0, Some(date(2024, 5, 15)), None)), as_of), 1.05);
        assert_eq!(urgency_factor(Some(&buyer(10.0, Some(date(2024, 7, 1)), None)), as_of), 1.0);
    }

    #[test]
    fn volume_discount_scales_with_share() {
        assert_eq!(volume_discount(None, 1000.0), 0.0);
        assert_eq!(volume_discount(Some(&buyer(50.0, None, None)), 1000.0), 0.0);
        assert!((volume_discount(Some(&buyer(500.0, None, None)), 1000.0) - 0.15).abs() < 1e-9);
        assert_eq!(volume_discount(Some(&buyer(5000.0, None, None)), 1000.0), 0.3);
        assert_eq!(volume_discount(Some(&buyer(500.0, None, None)), 0.0), 0.0);
    }

    #[test]
    fn reputation_stays_in_band() {
        assert_eq!(reputation_adjustment(Some(5.0), None), 1.0);
        let neutral = reputation_adjustment(None, Some(&buyer(1.0, None, None)));
        assert!((neutral - 1.0).abs() < 1e-9);
        let good_seller = reputation_adjustment(Some(5.0), Some(&buyer(1.0, None, Some(0.0))));
        assert!((good_seller - 1.1).abs() < 1e-9);
        let good_buyer = reputation_adjustment(Some(0.0), Some(&buyer(1.0, None, Some(5.0))));
        assert!((good_buyer - 0.9).abs() < 1e-9);
    }
}
