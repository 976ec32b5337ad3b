//! Market snapshot provider
//!
//! Supplies supply/demand levels, trend, local statistics and economic
//! indicators when the caller does not send its own snapshot.

use async_trait::async_trait;
use reqwest::Client;
use shared::{normalize_key, validate_commodity_key, validate_market_conditions, MarketConditions};

use crate::config::MarketDataConfig;
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn market_conditions(
        &self,
        commodity: &str,
        region: Option<&str>,
    ) -> AppResult<MarketConditions>;
}

/// HTTP market snapshot client
#[derive(Clone)]
pub struct MarketDataClient {
    api_endpoint: String,
    api_key: Option<String>,
    http_client: Client,
}

impl MarketDataClient {
    pub fn new(config: &MarketDataConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Configuration(format!("Market data HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl MarketDataProvider for MarketDataClient {
    async fn market_conditions(
        &self,
        commodity: &str,
        region: Option<&str>,
    ) -> AppResult<MarketConditions> {
        validate_commodity_key(commodity)?;
        let url = format!("{}/conditions/{}", self.api_endpoint, normalize_key(commodity));
        let mut request = self.http_client.get(&url);

        if let Some(region) = region {
            request = request.query(&[("region", region)]);
        }
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::MarketDataUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MarketDataUnavailable(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let conditions: MarketConditions = response.json().await.map_err(|e| {
            AppError::MarketDataUnavailable(format!("Failed to parse response: {}", e))
        })?;

        // Provider data is held to the same ranges as caller-supplied snapshots
        validate_market_conditions(&conditions)
            .map_err(|e| AppError::MarketDataUnavailable(format!("Invalid snapshot: {}", e)))?;

        Ok(conditions)
    }
}
