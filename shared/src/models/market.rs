//! Market condition snapshot models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Level;

/// Snapshot of market conditions supplied fresh for each pricing call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketConditions {
    pub supply_level: Level,
    pub demand_level: Level,
    /// Expected range 0.5-2.0
    pub seasonal_factor: f64,
    /// Expected range -0.5-0.5
    pub weather_impact: f64,
    pub global_price_trend: PriceTrend,
    pub local_market_stats: LocalMarketStats,
    pub economic_indicators: EconomicIndicators,
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            supply_level: Level::Medium,
            demand_level: Level::Medium,
            seasonal_factor: 1.0,
            weather_impact: 0.0,
            global_price_trend: PriceTrend::default(),
            local_market_stats: LocalMarketStats::default(),
            economic_indicators: EconomicIndicators::default(),
        }
    }
}

/// Direction of the global price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    #[default]
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Rising => write!(f, "rising"),
            TrendDirection::Falling => write!(f, "falling"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Global trend with its volatility in [0, 1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceTrend {
    pub direction: TrendDirection,
    pub volatility: f64,
}

/// Statistics of the nearby physical market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LocalMarketStats {
    pub average_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub competitor_count: u32,
    /// Seller's share of local volume, [0, 1]
    pub market_share: f64,
    /// Recent traded volume, kg
    pub trading_volume: f64,
}

/// Macro context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EconomicIndicators {
    pub inflation_rate: f64,
    pub exchange_rate: f64,
    pub gdp_growth: f64,
}
