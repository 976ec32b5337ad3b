//! Route definitions for the Commodity Pricing Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/quality", quality_routes())
        .nest("/pricing", pricing_routes())
        .nest("/commodities", commodity_routes())
}

/// Quality scoring routes
fn quality_routes() -> Router<AppState> {
    Router::new().route("/score", post(handlers::score_quality))
}

/// Price estimation routes
fn pricing_routes() -> Router<AppState> {
    Router::new()
        .route("/estimate", post(handlers::estimate_price))
        .route("/base-price", get(handlers::get_base_price))
}

/// Commodity catalog routes
fn commodity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_commodities))
        .route("/:key", get(handlers::get_commodity))
}
