//! HTTP request handlers

pub mod commodity;
pub mod health;
pub mod pricing;
pub mod quality;

pub use commodity::{get_commodity, list_commodities};
pub use health::health_check;
pub use pricing::{estimate_price, get_base_price};
pub use quality::score_quality;
