//! Multi-source base price aggregation
//!
//! Asks every configured price feed for the commodity in parallel, keeps the
//! quotes that pass sanity checks and combines them into one
//! reliability-weighted price. When no feed answers, the static default from
//! the commodity catalog is used and the result is flagged as degraded.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use shared::{
    normalize_key, validate_commodity_key, BasePrice, CommodityCatalog, GpsCoordinates,
    PriceSource,
};

use crate::cache::{Cache, CacheExt};
use crate::config::PricingConfig;
use crate::error::{AppError, AppResult};
use crate::external::{HttpPriceFeed, PriceFeed};
use crate::services::gather::{gather_partial, FailureReason, GatherConfig};

/// Decimal places kept on aggregated prices
const AGGREGATE_DP: u32 = 4;

/// Knobs of the aggregator, usually taken from [`PricingConfig`]
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub currency: String,
    pub cache_ttl_seconds: u64,
    pub gather: GatherConfig,
}

impl AggregatorSettings {
    pub fn from_config(pricing: &PricingConfig, cache_ttl_seconds: u64) -> Self {
        Self {
            currency: pricing.currency.clone(),
            cache_ttl_seconds,
            gather: GatherConfig {
                per_task_timeout: pricing.source_timeout(),
                deadline: pricing.aggregation_deadline(),
                min_successes: 1,
            },
        }
    }
}

pub struct PriceSourceAggregator {
    feeds: Vec<Arc<dyn PriceFeed>>,
    cache: Arc<dyn Cache>,
    catalog: CommodityCatalog,
    settings: AggregatorSettings,
}

impl PriceSourceAggregator {
    pub fn new(
        feeds: Vec<Arc<dyn PriceFeed>>,
        cache: Arc<dyn Cache>,
        catalog: CommodityCatalog,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            feeds,
            cache,
            catalog,
            settings,
        }
    }

    /// Build HTTP feeds for every configured source
    pub fn from_config(
        pricing: &PricingConfig,
        cache_ttl_seconds: u64,
        cache: Arc<dyn Cache>,
        catalog: CommodityCatalog,
    ) -> AppResult<Self> {
        let mut feeds: Vec<Arc<dyn PriceFeed>> = Vec::with_capacity(pricing.sources.len());
        for source in &pricing.sources {
            let feed = HttpPriceFeed::from_config(source, pricing.source_timeout())?;
            tracing::info!(source = %source.id, kind = ?feed.kind(), "price feed registered");
            feeds.push(Arc::new(feed));
        }

        Ok(Self::new(
            feeds,
            cache,
            catalog,
            AggregatorSettings::from_config(pricing, cache_ttl_seconds),
        ))
    }

    /// Aggregated base price for a commodity, optionally localized.
    ///
    /// Source failures are absorbed. Fails only with
    /// [`AppError::NoPriceAvailable`] when nothing is cached, no source
    /// answers and the catalog has no default for the commodity.
    pub async fn get_base_price(
        &self,
        commodity: &str,
        location: Option<&GpsCoordinates>,
    ) -> AppResult<BasePrice> {
        validate_commodity_key(commodity)?;
        let commodity = normalize_key(commodity);
        let key = cache_key(&commodity, location);

        match self.cache.get_json::<BasePrice>(&key).await {
            Ok(Some(mut cached)) => {
                tracing::debug!(%key, "base price served from cache");
                cached.from_cache = true;
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(%key, error = %e, "cache read failed, fetching live"),
        }

        let unit = self.catalog.profile_or_generic(&commodity).unit;
        let sources = self.fetch_sources(&commodity, &unit, location).await;

        if sources.len() >= self.settings.gather.min_successes.max(1) {
            if let Some(price) = weighted_average(&sources) {
                let base = BasePrice {
                    commodity: commodity.clone(),
                    price,
                    currency: self.settings.currency.clone(),
                    unit,
                    sources,
                    degraded: false,
                    from_cache: false,
                    fetched_at: Utc::now(),
                };

                if let Err(e) = self
                    .cache
                    .set_json(&key, &base, self.settings.cache_ttl_seconds)
                    .await
                {
                    tracing::warn!(%key, error = %e, "cache write failed");
                }

                tracing::info!(
                    commodity = %commodity,
                    price = %base.price,
                    sources = base.sources.len(),
                    "base price aggregated"
                );
                return Ok(base);
            }
        }

        self.fallback(&commodity)
    }

    async fn fetch_sources(
        &self,
        commodity: &str,
        unit: &str,
        location: Option<&GpsCoordinates>,
    ) -> Vec<PriceSource> {
        if self.feeds.is_empty() {
            tracing::warn!(commodity, "no price feeds configured");
            return Vec::new();
        }

        let tasks = self
            .feeds
            .iter()
            .map(|feed| {
                let feed = Arc::clone(feed);
                let commodity = commodity.to_string();
                let location = location.cloned();
                let label = feed.id().to_string();
                let task = async move { feed.fetch_price(&commodity, location.as_ref()).await };
                (label, task)
            })
            .collect();

        let outcome = gather_partial(tasks, self.settings.gather).await;

        tracing::debug!(
            commodity,
            succeeded = outcome.successes.len(),
            failed = outcome.failures.len(),
            deadline_hit = outcome.deadline_hit,
            "price fan-out finished"
        );
        if !outcome.is_satisfied() {
            tracing::warn!(commodity, "fewer price sources answered than required");
        }

        for failure in &outcome.failures {
            match &failure.reason {
                FailureReason::Error(e) => {
                    tracing::warn!(source = %failure.label, error = %e, "price source failed")
                }
                other => {
                    tracing::warn!(source = %failure.label, reason = ?other, "price source failed")
                }
            }
        }

        let mut accepted: Vec<PriceSource> = outcome
            .successes
            .into_iter()
            .filter_map(|(label, quote)| match accept_quote(quote, &self.settings.currency, unit) {
                Ok(source) => Some(source),
                Err(e) => {
                    tracing::warn!(source = %label, error = %e, "price quote rejected");
                    None
                }
            })
            .collect();

        accepted.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        accepted
    }

    fn fallback(&self, commodity: &str) -> AppResult<BasePrice> {
        let price = self
            .catalog
            .default_price(commodity)
            .ok_or_else(|| AppError::NoPriceAvailable(commodity.to_string()))?;
        let profile = self.catalog.profile_or_generic(commodity);
        if !profile.currency.eq_ignore_ascii_case(&self.settings.currency) {
            tracing::warn!(
                commodity,
                default_currency = %profile.currency,
                currency = %self.settings.currency,
                "static default is in another currency"
            );
            return Err(AppError::NoPriceAvailable(commodity.to_string()));
        }

        tracing::warn!(commodity, %price, "all price sources failed, using static default");

        Ok(BasePrice {
            commodity: commodity.to_string(),
            price,
            currency: profile.currency,
            unit: profile.unit,
            sources: Vec::new(),
            degraded: true,
            from_cache: false,
            fetched_at: Utc::now(),
        })
    }
}

/// `base_price:{commodity}:{lat:.1}:{lon:.1}`, or `base_price:{commodity}:global`
pub fn cache_key(commodity: &str, location: Option<&GpsCoordinates>) -> String {
    match location {
        Some(coords) => {
            let (lat, lon) = coords.coarse();
            format!("base_price:{}:{:.1}:{:.1}", commodity, lat, lon)
        }
        None => format!("base_price:{}:global", commodity),
    }
}

/// Sanity checks on a single quote; currency and unit must match the aggregate's
fn accept_quote(quote: PriceSource, currency: &str, unit: &str) -> AppResult<PriceSource> {
    if quote.price <= Decimal::ZERO {
        return Err(AppError::external_source(
            &quote.source_id,
            format!("non-positive price {}", quote.price),
        ));
    }
    if !(0.0..=1.0).contains(&quote.reliability) {
        return Err(AppError::external_source(
            &quote.source_id,
            format!("reliability {} outside [0, 1]", quote.reliability),
        ));
    }
    if !quote.currency.eq_ignore_ascii_case(currency) {
        return Err(AppError::external_source(
            &quote.source_id,
            format!("currency {} does not match {}", quote.currency, currency),
        ));
    }
    if !quote.unit.eq_ignore_ascii_case(unit) {
        return Err(AppError::external_source(
            &quote.source_id,
            format!("unit {} does not match {}", quote.unit, unit),
        ));
    }
    Ok(quote)
}

/// Reliability-weighted mean, clamped to the quoted range and rounded to 4 dp.
///
/// Falls back to the plain mean when every weight is zero. `None` for an
/// empty slice.
pub fn weighted_average(sources: &[PriceSource]) -> Option<Decimal> {
    let min = sources.iter().map(|s| s.price).min()?;
    let max = sources.iter().map(|s| s.price).max()?;

    let mut weighted_sum = Decimal::ZERO;
    let mut weight_total = Decimal::ZERO;
    for source in sources {
        let weight = Decimal::from_f64(source.reliability).unwrap_or(Decimal::ZERO);
        weighted_sum += source.price * weight;
        weight_total += weight;
    }

    let average = if weight_total > Decimal::ZERO {
        weighted_sum / weight_total
    } else {
        let total: Decimal = sources.iter().map(|s| s.price).sum();
        total / Decimal::from(sources.len())
    };

    Some(average.clamp(min, max).round_dp(AGGREGATE_DP))
}
