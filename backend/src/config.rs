//! Configuration management for the Commodity Pricing Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CQP_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::external::FeedKind;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Database configuration, only needed for the postgres cache backend
    pub database: Option<DatabaseConfig>,

    /// Price aggregation configuration
    pub pricing: PricingConfig,

    /// Image analysis service configuration
    pub vision: Option<VisionConfig>,

    /// Weather API configuration
    pub weather: Option<WeatherConfig>,

    /// Market snapshot provider configuration
    pub market_data: Option<MarketDataConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,

    /// "pretty" or "json"
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Where cached base prices live
    pub backend: CacheBackend,

    /// Time-to-live of cached base prices in seconds
    pub ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Currency every source must quote in
    pub currency: String,

    /// Timeout of a single source request in seconds (10-15)
    pub source_timeout_secs: u64,

    /// Deadline for the whole fan-out in seconds
    pub aggregation_deadline_secs: u64,

    /// Local traded volume (kg) above which a market counts as liquid
    pub liquidity_threshold_kg: f64,

    /// External price sources
    #[serde(default)]
    pub sources: Vec<PriceSourceConfig>,
}

impl PricingConfig {
    /// Per-source timeout clamped to the 10-15 second window
    pub fn source_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.source_timeout_secs.clamp(10, 15))
    }

    pub fn aggregation_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.aggregation_deadline_secs.max(1))
    }

    /// Source ids label fan-out tasks and must be unique
    fn check_sources(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::Message(format!(
                    "pricing source id {} is configured more than once",
                    source.id
                )));
            }
            if source.reliability.is_some_and(|r| !(0.0..=1.0).contains(&r)) {
                return Err(ConfigError::Message(format!(
                    "pricing source {} has a reliability outside [0, 1]",
                    source.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PriceSourceConfig {
    /// Identifier reported in estimates
    pub id: String,

    /// Which kind of feed this is
    pub kind: FeedKind,

    /// Base URL of the feed API
    pub base_url: String,

    /// API key, if the feed requires one
    pub api_key: Option<String>,

    /// Overrides the kind's default reliability weight
    pub reliability: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VisionConfig {
    /// Image analysis API endpoint
    pub api_endpoint: String,

    /// Image analysis API key
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketDataConfig {
    /// Market snapshot API endpoint
    pub api_endpoint: String,

    /// Market snapshot API key
    pub api_key: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CQP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("logging.level", "cqp_server=debug,tower_http=debug,sqlx=warn")?
            .set_default("logging.format", "pretty")?
            .set_default("cache.backend", "memory")?
            .set_default("cache.ttl_seconds", 6 * 60 * 60)?
            .set_default("pricing.currency", "USD")?
            .set_default("pricing.source_timeout_secs", 12)?
            .set_default("pricing.aggregation_deadline_secs", 20)?
            .set_default("pricing.liquidity_threshold_kg", 1000.0)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CQP_ prefix)
            .add_source(
                Environment::with_prefix("CQP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Cross-field checks the deserializer cannot express
    fn check(&self) -> Result<(), ConfigError> {
        if self.cache.backend == CacheBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::Message(
                "cache.backend = postgres requires a [database] section".to_string(),
            ));
        }
        self.pricing.check_sources()
    }
}


impl LoggingConfig {
    /// Initialize the global tracing subscriber
    pub fn init(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let registry = tracing_subscriber::registry().with(filter);

        match self.format.as_str() {
            "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
            _ => registry.with(tracing_subscriber::fmt::layer()).init(),
        }
    }
}
