//! Domain models for the commodity quality and pricing platform

mod commodity;
mod market;
mod pricing;
mod product;
mod quality;
mod vision;

pub use commodity::*;
pub use market::*;
pub use pricing::*;
pub use product::*;
pub use quality::*;
pub use vision::*;
