//! External API integrations

pub mod market_data;
pub mod price_feed;
pub mod vision;
pub mod weather;

pub use market_data::{MarketDataClient, MarketDataProvider};
pub use price_feed::{FeedKind, HttpPriceFeed, PriceFeed};
pub use vision::{ImageAnalyzer, VisionClient};
pub use weather::{WeatherClient, WeatherImpactProvider};
