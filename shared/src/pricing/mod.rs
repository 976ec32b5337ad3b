//! Pricing factor calculation and price composition

pub mod composer;
pub mod factors;

pub use composer::{
    mark_degraded, PriceComposer, DEGRADED_CONFIDENCE_CAP, ESTIMATE_VALIDITY_HOURS,
};
pub use factors::PricingFactorCalculator;
