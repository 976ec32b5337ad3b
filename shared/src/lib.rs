//! Shared types, models and pure engines for the commodity quality and
//! pricing platform
//!
//! Everything here is synchronous and free of I/O so that the backend and
//! the WASM client compute identical grades and prices.

pub mod error;
pub mod models;
pub mod pricing;
pub mod quality;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use pricing::{
    mark_degraded, PriceComposer, PricingFactorCalculator, DEGRADED_CONFIDENCE_CAP,
    ESTIMATE_VALIDITY_HOURS,
};
pub use quality::{CommodityAnalyzer, QualityScorer, TableDrivenAnalyzer};
pub use types::*;
pub use validation::*;
