//! HTTP handlers for the commodity catalog

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{CommodityProfile, GradeThreshold};

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CommoditySummary {
    pub key: String,
    pub display_name: String,
    pub grade_thresholds: Vec<GradeThreshold>,
    pub default_price: Option<Decimal>,
    pub currency: String,
    pub unit: String,
}

impl From<&CommodityProfile> for CommoditySummary {
    fn from(profile: &CommodityProfile) -> Self {
        Self {
            key: profile.key.clone(),
            display_name: profile.display_name.clone(),
            grade_thresholds: profile.grade_thresholds.clone(),
            default_price: profile.default_price,
            currency: profile.currency.clone(),
            unit: profile.unit.clone(),
        }
    }
}

/// List catalog keys with their grade thresholds
pub async fn list_commodities(State(state): State<AppState>) -> Json<Vec<CommoditySummary>> {
    let catalog = state.pricing.catalog();
    let summaries = catalog
        .keys()
        .iter()
        .filter_map(|key| catalog.get(key))
        .map(CommoditySummary::from)
        .collect();
    Json(summaries)
}

/// Full profile of one commodity
pub async fn get_commodity(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<CommodityProfile>> {
    state
        .pricing
        .catalog()
        .get(&key)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Commodity {}", key)))
}
