//! End-to-end price estimation
//!
//! Scores the lot photo, fetches the base price and the weather impact
//! concurrently, computes the nine factors and composes the estimate.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use shared::{
    mark_degraded, BasePrice, BuyerProfile, CommodityCatalog, GpsCoordinates, MarketConditions,
    PriceComposer, PriceEstimate, PriceSource, PricingFactorCalculator, ProductMetadata,
    QualityResult, QualityScorer, VisionAnalysis,
};
use shared::{validate_buyer_profile, validate_market_conditions, validate_product_metadata};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{ImageAnalyzer, MarketDataProvider, WeatherImpactProvider};
use crate::services::price_source::PriceSourceAggregator;

/// Where the image analysis comes from
#[derive(Debug, Clone)]
pub enum VisionInput {
    /// Analysis already produced by the client
    Analysis(VisionAnalysis),
    /// Photo to send to the image analysis service
    ImageUrl(String),
}

#[derive(Debug, Clone)]
pub struct QualityInput {
    pub product: ProductMetadata,
    pub vision: VisionInput,
    pub allow_degraded_quality: bool,
}

#[derive(Debug, Clone)]
pub struct EstimateInput {
    pub quality: QualityInput,
    /// Caller-supplied snapshot; fetched from the provider when absent
    pub market: Option<MarketConditions>,
    pub region: Option<String>,
    pub buyer: Option<BuyerProfile>,
}

/// Reject malformed lot, buyer and market input before any network call
fn validate_estimate_input(input: &EstimateInput) -> AppResult<()> {
    validate_product_metadata(&input.quality.product)?;
    if let Some(market) = &input.market {
        validate_market_conditions(market)?;
    }
    if let Some(buyer) = &input.buyer {
        validate_buyer_profile(buyer)?;
    }
    Ok(())
}

/// Estimate plus the inputs it was built from
#[derive(Debug, Clone, Serialize)]
pub struct PriceEstimateResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub estimate: PriceEstimate,
    pub quality: QualityResult,
    pub sources: Vec<PriceSource>,
    pub base_price_from_cache: bool,
}

pub struct PricingService {
    scorer: QualityScorer,
    calculator: PricingFactorCalculator,
    composer: PriceComposer,
    aggregator: PriceSourceAggregator,
    vision: Option<Arc<dyn ImageAnalyzer>>,
    weather: Option<Arc<dyn WeatherImpactProvider>>,
    market_data: Option<Arc<dyn MarketDataProvider>>,
}

impl PricingService {
    pub fn new(
        catalog: CommodityCatalog,
        composer: PriceComposer,
        aggregator: PriceSourceAggregator,
    ) -> Self {
        Self {
            scorer: QualityScorer::new(catalog.clone()),
            calculator: PricingFactorCalculator::new(catalog),
            composer,
            aggregator,
            vision: None,
            weather: None,
            market_data: None,
        }
    }

    pub fn with_vision(mut self, vision: Arc<dyn ImageAnalyzer>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherImpactProvider>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_market_data(mut self, market_data: Arc<dyn MarketDataProvider>) -> Self {
        self.market_data = Some(market_data);
        self
    }

    pub fn catalog(&self) -> &CommodityCatalog {
        self.scorer.catalog()
    }

    /// Score a lot; the typed error is returned unless degradation was requested
    pub async fn score_quality(&self, input: &QualityInput) -> AppResult<QualityResult> {
        let vision = self.resolve_vision(&input.vision).await?;

        let result = if input.allow_degraded_quality {
            self.scorer.score_or_fallback(&vision, &input.product)?
        } else {
            self.scorer.score(&vision, &input.product)?
        };

        tracing::info!(
            commodity = %result.commodity,
            score = result.overall_score,
            grade = %result.grade,
            degraded = result.degraded,
            "lot scored"
        );
        Ok(result)
    }

    pub async fn base_price(
        &self,
        commodity: &str,
        location: Option<&GpsCoordinates>,
    ) -> AppResult<BasePrice> {
        self.aggregator.get_base_price(commodity, location).await
    }

    /// Full estimate for one lot
    pub async fn estimate(&self, input: EstimateInput) -> AppResult<PriceEstimateResponse> {
        validate_estimate_input(&input)?;

        let quality = self.score_quality(&input.quality).await?;
        let product = &input.quality.product;
        let origin = product.origin.as_ref();

        let (mut market, market_degraded) = self
            .market_snapshot(input.market, &product.commodity, input.region.as_deref())
            .await;

        let (base, weather) = tokio::join!(
            self.aggregator.get_base_price(&product.commodity, origin),
            self.weather_impact(origin),
        );
        let base = base?;

        if let Some(impact) = weather {
            market.weather_impact = impact;
        }

        let factors = self.calculator.compute_factors(
            &quality,
            &market,
            product,
            input.buyer.as_ref(),
            Utc::now().date_naive(),
        )?;
        let mut estimate = self.composer.compose(&base, &factors, &market)?;

        if quality.degraded || market_degraded {
            mark_degraded(&mut estimate);
        }

        tracing::info!(
            commodity = %estimate.commodity,
            base_price = %estimate.base_price,
            adjusted_price = %estimate.adjusted_price,
            confidence = estimate.confidence,
            degraded = estimate.degraded,
            "price estimate composed"
        );

        Ok(PriceEstimateResponse {
            id: Uuid::new_v4(),
            estimate,
            quality,
            sources: base.sources,
            base_price_from_cache: base.from_cache,
        })
    }

    async fn resolve_vision(&self, input: &VisionInput) -> AppResult<VisionAnalysis> {
        match input {
            VisionInput::Analysis(analysis) => Ok(analysis.clone()),
            VisionInput::ImageUrl(url) => {
                let vision = self.vision.as_ref().ok_or_else(|| {
                    AppError::Configuration("image analysis service is not configured".to_string())
                })?;
                vision.analyze(url).await
            }
        }
    }

    /// Caller snapshot, else provider snapshot, else neutral defaults (degraded)
    async fn market_snapshot(
        &self,
        supplied: Option<MarketConditions>,
        commodity: &str,
        region: Option<&str>,
    ) -> (MarketConditions, bool) {
        if let Some(market) = supplied {
            return (market, false);
        }

        match &self.market_data {
            Some(provider) => match provider.market_conditions(commodity, region).await {
                Ok(market) => (market, false),
                Err(e) => {
                    tracing::warn!(commodity, error = %e, "market data unavailable, using neutral snapshot");
                    (MarketConditions::default(), true)
                }
            },
            None => {
                tracing::warn!(commodity, "no market snapshot supplied or configured");
                (MarketConditions::default(), true)
            }
        }
    }

    /// Live weather impact at the origin; `None` keeps the snapshot value
    async fn weather_impact(&self, origin: Option<&GpsCoordinates>) -> Option<f64> {
        let (provider, origin) = (self.weather.as_ref()?, origin?);
        match provider.weather_impact(origin).await {
            Ok(impact) => Some(impact),
            Err(e) => {
                tracing::warn!(error = %e, "weather impact unavailable, keeping snapshot value");
                None
            }
        }
    }
}
