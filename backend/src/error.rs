//! Error handling for the Commodity Pricing Platform
//!
//! Provides consistent error responses in Thai and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::EngineError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_th: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Scoring errors
    #[error("Image analysis is too sparse to score")]
    InsufficientAnalysis,

    #[error("Invalid commodity profile: {0}")]
    InvalidProfile(String),

    // Price source errors
    #[error("Price source {source_id} failed: {message}")]
    ExternalSource { source_id: String, message: String },

    #[error("No price available for {0}")]
    NoPriceAvailable(String),

    // External service errors
    #[error("Market data unavailable: {0}")]
    MarketDataUnavailable(String),

    #[error("Weather service unavailable")]
    WeatherServiceUnavailable,

    #[error("Vision service error: {0}")]
    VisionServiceError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Per-source failure recorded by the aggregator
    pub fn external_source(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ExternalSource {
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InsufficientAnalysis => AppError::InsufficientAnalysis,
            EngineError::Validation { field, message } => AppError::Validation {
                message_th: format!("ข้อมูลไม่ถูกต้อง ({}): {}", field, message),
                field,
                message,
            },
            EngineError::InvalidProfile(msg) => AppError::InvalidProfile(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|f| f.to_string())
            .unwrap_or_default();
        AppError::Validation {
            message: errors.to_string(),
            message_th: format!("ข้อมูลไม่ถูกต้อง: {}", field),
            field,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_th: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation { field, message, message_th } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_th: message_th.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_th: format!("ข้อมูลไม่ถูกต้อง: {}", msg),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_th: format!("ไม่พบ {}", resource),
                    field: None,
                },
            ),
            AppError::InsufficientAnalysis => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_ANALYSIS".to_string(),
                    message_en: "The photo could not be graded: no beans, colors or labels were detected"
                        .to_string(),
                    message_th: "ไม่สามารถประเมินคุณภาพจากภาพได้ ไม่พบเมล็ด สี หรือป้ายกำกับ".to_string(),
                    field: None,
                },
            ),
            AppError::InvalidProfile(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INVALID_COMMODITY_PROFILE".to_string(),
                    message_en: format!("Invalid commodity profile: {}", msg),
                    message_th: format!("ข้อมูลสินค้าเกษตรไม่ถูกต้อง: {}", msg),
                    field: None,
                },
            ),
            AppError::ExternalSource { source_id, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SOURCE_ERROR".to_string(),
                    message_en: format!("Price source {} failed: {}", source_id, message),
                    message_th: format!("แหล่งข้อมูลราคา {} ขัดข้อง: {}", source_id, message),
                    field: None,
                },
            ),
            AppError::NoPriceAvailable(commodity) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "NO_PRICE_AVAILABLE".to_string(),
                    message_en: format!("No market price is available for {}", commodity),
                    message_th: format!("ไม่มีข้อมูลราคาตลาดสำหรับ {}", commodity),
                    field: None,
                },
            ),
            AppError::MarketDataUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "MARKET_DATA_UNAVAILABLE".to_string(),
                    message_en: format!("Market data is unavailable: {}", msg),
                    message_th: "ข้อมูลสภาวะตลาดไม่พร้อมใช้งานชั่วคราว".to_string(),
                    field: None,
                },
            ),
            AppError::WeatherServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "WEATHER_SERVICE_UNAVAILABLE".to_string(),
                    message_en: "Weather service is temporarily unavailable".to_string(),
                    message_th: "บริการข้อมูลสภาพอากาศไม่พร้อมใช้งานชั่วคราว".to_string(),
                    field: None,
                },
            ),
            AppError::VisionServiceError(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "VISION_SERVICE_ERROR".to_string(),
                    message_en: format!("Image analysis service error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดกับบริการวิเคราะห์ภาพ: {}", msg),
                    field: None,
                },
            ),
            AppError::CacheError(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "CACHE_ERROR".to_string(),
                    message_en: format!("Cache error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดกับแคช: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_th: format!("เกิดข้อผิดพลาดในการตั้งค่า: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดกับฐานข้อมูล".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_th: "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์".to_string(),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
