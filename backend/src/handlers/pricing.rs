//! HTTP handlers for price estimation

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{BasePrice, BuyerProfile, GpsCoordinates, MarketConditions, ProductMetadata, VisionAnalysis};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::quality::vision_input;
use crate::services::pricing::{EstimateInput, PriceEstimateResponse, QualityInput};
use crate::AppState;

/// Estimate the price of a lot
#[derive(Debug, Deserialize, Validate)]
pub struct EstimatePriceRequest {
    pub product: ProductMetadata,
    pub analysis: Option<VisionAnalysis>,
    #[validate(url)]
    pub image_url: Option<String>,
    /// Omit to use the configured market data provider
    pub market: Option<MarketConditions>,
    #[validate(length(min = 1, max = 64))]
    pub region: Option<String>,
    pub buyer: Option<BuyerProfile>,
    #[serde(default)]
    pub allow_degraded_quality: bool,
}

impl EstimatePriceRequest {
    pub fn into_input(self) -> AppResult<EstimateInput> {
        self.validate()?;
        Ok(EstimateInput {
            quality: QualityInput {
                vision: vision_input(self.analysis, self.image_url)?,
                product: self.product,
                allow_degraded_quality: self.allow_degraded_quality,
            },
            market: self.market,
            region: self.region,
            buyer: self.buyer,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BasePriceQuery {
    #[validate(length(min = 1, max = 64))]
    pub commodity: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

impl BasePriceQuery {
    pub fn location(&self) -> AppResult<Option<GpsCoordinates>> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                let latitude = Decimal::from_f64(lat)
                    .ok_or_else(|| AppError::ValidationError("latitude is not a number".into()))?;
                let longitude = Decimal::from_f64(lon)
                    .ok_or_else(|| AppError::ValidationError("longitude is not a number".into()))?;
                Ok(Some(GpsCoordinates::new(latitude, longitude)))
            }
            (None, None) => Ok(None),
            _ => Err(AppError::ValidationError(
                "latitude and longitude must be sent together".to_string(),
            )),
        }
    }
}

/// Full price estimate endpoint
pub async fn estimate_price(
    State(state): State<AppState>,
    Json(request): Json<EstimatePriceRequest>,
) -> AppResult<Json<PriceEstimateResponse>> {
    let input = request.into_input()?;
    let response = state.pricing.estimate(input).await?;
    Ok(Json(response))
}

/// Aggregated base price endpoint
pub async fn get_base_price(
    State(state): State<AppState>,
    Query(query): Query<BasePriceQuery>,
) -> AppResult<Json<BasePrice>> {
    query.validate()?;
    let location = query.location()?;
    let base = state
        .pricing
        .base_price(&query.commodity, location.as_ref())
        .await?;
    Ok(Json(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(lat: Option<f64>, lon: Option<f64>) -> BasePriceQuery {
        BasePriceQuery {
            commodity: "cocoa".to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_location_pairs() {
        let location = query(Some(6.69), Some(-1.62)).location().unwrap().unwrap();
        assert_eq!(location.latitude.round_dp(2), "6.69".parse::<Decimal>().unwrap());

        assert_eq!(query(None, None).location().unwrap(), None);
        assert!(query(Some(6.69), None).location().is_err());
    }

    #[test]
    fn test_latitude_range_checked() {
        assert!(query(Some(91.0), Some(0.0)).validate().is_err());
        assert!(query(Some(45.0), Some(100.0)).validate().is_ok());
    }

    #[test]
    fn test_estimate_request_defaults() {
        let request: EstimatePriceRequest = serde_json::from_value(serde_json::json!({
            "product": { "commodity": "coffee", "available_quantity_kg": 1200.0 },
            "analysis": { "labels": [{ "description": "green coffee bean", "confidence": 0.8 }] }
        }))
        .unwrap();

        let input = request.into_input().unwrap();
        assert!(input.market.is_none());
        assert!(input.buyer.is_none());
        assert!(!input.quality.allow_degraded_quality);
    }

    #[test]
    fn test_blank_region_rejected() {
        let request: EstimatePriceRequest = serde_json::from_value(serde_json::json!({
            "product": { "commodity": "coffee", "available_quantity_kg": 1200.0 },
            "image_url": "https://cdn.example.com/lot.jpg",
            "region": ""
        }))
        .unwrap();
        assert!(request.into_input().is_err());
    }
}
