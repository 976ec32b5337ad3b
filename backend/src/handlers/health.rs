//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::CacheBackend;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: String,
    pub price_sources: usize,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = match state.config.cache.backend {
        CacheBackend::Memory => "memory",
        CacheBackend::Postgres => "postgres",
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: cache.to_string(),
        price_sources: state.config.pricing.sources.len(),
    })
}
