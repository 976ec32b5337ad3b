//! Price feed clients
//!
//! Every external price source answers `GET {base_url}/prices/{commodity}`
//! with a single quote. The local-market feed is location aware and also
//! receives `lat`/`lon`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{normalize_key, validate_commodity_key, GpsCoordinates, PriceSource};

use crate::config::PriceSourceConfig;
use crate::error::{AppError, AppResult};

/// Kind of price source, which fixes its default trust weight
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// International reference price
    Reference,
    /// Secondary commodity index
    Index,
    /// Estimate from nearby local markets
    LocalMarket,
    /// Exchange / futures settlement
    Exchange,
}

impl FeedKind {
    pub fn default_reliability(&self) -> f64 {
        match self {
            FeedKind::Reference => 0.9,
            FeedKind::Index => 0.85,
            FeedKind::LocalMarket => 0.7,
            FeedKind::Exchange => 0.8,
        }
    }

    pub fn uses_location(&self) -> bool {
        matches!(self, FeedKind::LocalMarket)
    }
}

/// A single external price source
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Identifier reported in [`PriceSource::source_id`]
    fn id(&self) -> &str;

    /// Fetch the current quote for `commodity`
    async fn fetch_price(
        &self,
        commodity: &str,
        location: Option<&GpsCoordinates>,
    ) -> AppResult<PriceSource>;
}

/// Quote body returned by feed APIs
#[derive(Debug, Deserialize)]
struct FeedQuote {
    price: Decimal,
    currency: String,
    unit: String,
    as_of: Option<DateTime<Utc>>,
}

/// reqwest-backed [`PriceFeed`]
#[derive(Clone)]
pub struct HttpPriceFeed {
    id: String,
    kind: FeedKind,
    base_url: String,
    api_key: Option<String>,
    reliability: f64,
    http_client: Client,
}

impl HttpPriceFeed {
    /// Build a feed from its configuration; the client times out after `timeout`
    pub fn from_config(config: &PriceSourceConfig, timeout: std::time::Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client for {}: {}", config.id, e)))?;

        Ok(Self {
            id: config.id.clone(),
            kind: config.kind,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            reliability: config
                .reliability
                .unwrap_or_else(|| config.kind.default_reliability()),
            http_client,
        })
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    fn fail(&self, message: impl Into<String>) -> AppError {
        AppError::external_source(&self.id, message)
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_price(
        &self,
        commodity: &str,
        location: Option<&GpsCoordinates>,
    ) -> AppResult<PriceSource> {
        validate_commodity_key(commodity)?;
        let url = format!("{}/prices/{}", self.base_url, normalize_key(commodity));
        let mut request = self.http_client.get(&url);

        if self.kind.uses_location() {
            let coords =
                location.ok_or_else(|| self.fail("local market feed requires coordinates"))?;
            request = request.query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ]);
        }
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.fail(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(self.fail(format!("API returned {}: {}", status, body)));
        }

        let quote: FeedQuote = response
            .json()
            .await
            .map_err(|e| self.fail(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(source = %self.id, commodity, price = %quote.price, "price quote received");

        Ok(PriceSource {
            source_id: self.id.clone(),
            price: quote.price,
            currency: quote.currency,
            as_of: quote.as_of.unwrap_or_else(Utc::now),
            reliability: self.reliability,
            unit: quote.unit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(kind: FeedKind, reliability: Option<f64>) -> PriceSourceConfig {
        PriceSourceConfig {
            id: "icco".to_string(),
            kind,
            base_url: "http://localhost:9000/".to_string(),
            api_key: None,
            reliability,
        }
    }

    #[test]
    fn test_default_reliabilities() {
        assert_eq!(FeedKind::Reference.default_reliability(), 0.9);
        assert_eq!(FeedKind::Index.default_reliability(), 0.85);
        assert_eq!(FeedKind::LocalMarket.default_reliability(), 0.7);
        assert_eq!(FeedKind::Exchange.default_reliability(), 0.8);
    }

    #[test]
    fn test_feed_kind_parses_snake_case() {
        let kind: FeedKind = serde_json::from_str("\"local_market\"").unwrap();
        assert_eq!(kind, FeedKind::LocalMarket);
        assert!(kind.uses_location());
    }

    #[test]
    fn test_from_config() {
        let timeout = std::time::Duration::from_secs(12);

        let feed = HttpPriceFeed::from_config(&source(FeedKind::Index, None), timeout).unwrap();
        assert_eq!(feed.id(), "icco");
        assert_eq!(feed.reliability, 0.85);
        assert_eq!(feed.base_url, "http://localhost:9000");

        let feed =
            HttpPriceFeed::from_config(&source(FeedKind::Index, Some(0.5)), timeout).unwrap();
        assert_eq!(feed.reliability, 0.5);
    }

    #[tokio::test]
    async fn test_local_feed_without_coordinates_fails() {
        let feed = HttpPriceFeed::from_config(
            &source(FeedKind::LocalMarket, None),
            std::time::Duration::from_secs(10),
        )
        .unwrap();

        let err = feed.fetch_price("cocoa", None).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalSource { .. }));
    }

    #[tokio::test]
    async fn test_commodity_cannot_rewrite_the_path() {
        let feed = HttpPriceFeed::from_config(
            &source(FeedKind::Reference, None),
            std::time::Duration::from_secs(10),
        )
        .unwrap();

        let err = feed.fetch_price("cocoa/../admin", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
