//! HTTP handlers for quality scoring

use axum::{extract::State, Json};
use serde::Deserialize;
use shared::{ProductMetadata, QualityResult, VisionAnalysis};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::pricing::{QualityInput, VisionInput};
use crate::AppState;

/// Score a lot from its image analysis or from a photo URL
#[derive(Debug, Deserialize, Validate)]
pub struct ScoreQualityRequest {
    pub product: ProductMetadata,
    pub analysis: Option<VisionAnalysis>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub allow_degraded_quality: bool,
}

impl ScoreQualityRequest {
    pub fn into_input(self) -> AppResult<QualityInput> {
        self.validate()?;
        Ok(QualityInput {
            vision: vision_input(self.analysis, self.image_url)?,
            product: self.product,
            allow_degraded_quality: self.allow_degraded_quality,
        })
    }
}

/// Exactly one of an analysis or an image URL must be sent
pub fn vision_input(
    analysis: Option<VisionAnalysis>,
    image_url: Option<String>,
) -> AppResult<VisionInput> {
    match (analysis, image_url) {
        (Some(analysis), None) => Ok(VisionInput::Analysis(analysis)),
        (None, Some(url)) => Ok(VisionInput::ImageUrl(url)),
        (Some(_), Some(_)) => Err(AppError::ValidationError(
            "send either analysis or image_url, not both".to_string(),
        )),
        (None, None) => Err(AppError::ValidationError(
            "analysis or image_url is required".to_string(),
        )),
    }
}

/// Score quality endpoint
pub async fn score_quality(
    State(state): State<AppState>,
    Json(request): Json<ScoreQualityRequest>,
) -> AppResult<Json<QualityResult>> {
    let input = request.into_input()?;
    let result = state.pricing.score_quality(&input).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: serde_json::Value) -> ScoreQualityRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_analysis_request() {
        let input = request(serde_json::json!({
            "product": { "commodity": "cocoa", "available_quantity_kg": 500.0 },
            "analysis": { "labels": [{ "description": "cocoa bean", "confidence": 0.9 }] }
        }))
        .into_input()
        .unwrap();

        assert!(matches!(input.vision, VisionInput::Analysis(_)));
        assert!(!input.allow_degraded_quality);
    }

    #[test]
    fn test_missing_vision_source_rejected() {
        let err = request(serde_json::json!({
            "product": { "commodity": "cocoa", "available_quantity_kg": 500.0 }
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_image_url_rejected() {
        let err = request(serde_json::json!({
            "product": { "commodity": "cocoa", "available_quantity_kg": 500.0 },
            "image_url": "not a url"
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
