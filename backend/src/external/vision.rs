//! Image analysis client
//!
//! Client for the hosted image analysis service that turns a lot photo into
//! detected objects, dominant colors, labels and text.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use shared::VisionAnalysis;

use crate::config::VisionConfig;
use crate::error::{AppError, AppResult};

/// Resolves an image reference into an analysis
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image_url: &str) -> AppResult<VisionAnalysis>;
}

/// Client for the image analysis microservice
#[derive(Clone)]
pub struct VisionClient {
    api_endpoint: String,
    api_key: String,
    http_client: Client,
}

/// Request to analyze an uploaded image
#[derive(Debug, Serialize)]
struct AnalyzeImageRequest<'a> {
    image_url: &'a str,
}

impl VisionClient {
    /// Create a new image analysis client
    pub fn new(config: &VisionConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::Configuration(format!("Vision HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl ImageAnalyzer for VisionClient {
    async fn analyze(&self, image_url: &str) -> AppResult<VisionAnalysis> {
        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&AnalyzeImageRequest { image_url })
            .send()
            .await
            .map_err(|e| AppError::VisionServiceError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::VisionServiceError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let analysis: VisionAnalysis = response
            .json()
            .await
            .map_err(|e| AppError::VisionServiceError(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(
            objects = analysis.objects.len(),
            colors = analysis.colors.len(),
            labels = analysis.labels.len(),
            "image analysis received"
        );

        Ok(analysis)
    }
}
