//! Commodity Pricing Platform - Backend Server
//!
//! Grades agricultural lots from photo analysis and estimates a tradable
//! price from live market sources, market conditions and buyer context.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

mod cache;
mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;

use cache::{Cache, MemoryCache, PgCache};
use config::{CacheBackend, Config};
use external::{MarketDataClient, VisionClient, WeatherClient};
use services::{PriceSourceAggregator, PricingService};
use shared::{CommodityCatalog, PriceComposer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pricing: Arc<PricingService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Initialize tracing
    config.logging.init();

    tracing::info!("Starting Commodity Pricing Server");
    tracing::info!("Environment: {}", config.environment);

    let cache = build_cache(&config).await?;
    let catalog = CommodityCatalog::builtin();

    let aggregator = PriceSourceAggregator::from_config(
        &config.pricing,
        config.cache.ttl_seconds,
        cache,
        catalog.clone(),
    )?;

    let mut pricing = PricingService::new(
        catalog,
        PriceComposer::new(config.pricing.liquidity_threshold_kg),
        aggregator,
    );
    if let Some(vision) = &config.vision {
        pricing = pricing.with_vision(Arc::new(VisionClient::new(vision)?));
    }
    if let Some(weather) = &config.weather {
        pricing = pricing.with_weather(Arc::new(WeatherClient::new(weather)?));
    }
    if let Some(market_data) = &config.market_data {
        pricing = pricing.with_market_data(Arc::new(MarketDataClient::new(market_data)?));
    }

    // Create application state
    let state = AppState {
        config: Arc::new(config.clone()),
        pricing: Arc::new(pricing),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Select the cache backend; postgres runs its migration first
async fn build_cache(config: &Config) -> anyhow::Result<Arc<dyn Cache>> {
    match (config.cache.backend, &config.database) {
        (CacheBackend::Postgres, Some(database)) => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .min_connections(database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&database.url)
                .await?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&db_pool).await?;
            tracing::info!("Migrations completed");

            let cache = PgCache::new(db_pool);
            let purged = cache.purge_expired().await?;
            tracing::info!(purged, "PostgreSQL price cache ready");
            Ok(Arc::new(cache))
        }
        (CacheBackend::Postgres, None) => Err(anyhow::anyhow!(
            "cache.backend = postgres requires a [database] section"
        )),
        (CacheBackend::Memory, _) => {
            tracing::info!("Using in-memory price cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Commodity Pricing Platform API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
