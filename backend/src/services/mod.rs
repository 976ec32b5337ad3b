//! Business logic services

pub mod gather;
pub mod price_source;
pub mod pricing;

pub use price_source::PriceSourceAggregator;
pub use pricing::PricingService;
