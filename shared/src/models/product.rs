//! Product lot and buyer models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::GpsCoordinates;

/// Metadata of the lot being priced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductMetadata {
    /// Commodity key in the catalog (e.g. "cocoa", "coffee")
    pub commodity: String,
    pub variety: Option<String>,
    /// Quantity available for sale, kg
    pub available_quantity_kg: f64,
    pub harvest_date: Option<NaiveDate>,
    #[serde(default)]
    pub certifications: Vec<CertificationType>,
    pub origin: Option<GpsCoordinates>,
    /// Seller rating on a 0-5 scale
    pub seller_reputation: Option<f64>,
}

impl ProductMetadata {
    pub fn new(commodity: impl Into<String>, available_quantity_kg: f64) -> Self {
        Self {
            commodity: commodity.into(),
            variety: None,
            available_quantity_kg,
            harvest_date: None,
            certifications: Vec::new(),
            origin: None,
            seller_reputation: None,
        }
    }
}

/// Certifications that earn a price bonus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CertificationType {
    Organic,
    FairTrade,
    RainforestAlliance,
    #[serde(rename = "utz")]
    UTZ,
    GeographicIndication,
    #[serde(rename = "thai_gap")]
    ThaiGAP,
    Custom(String),
}

impl CertificationType {
    /// Additive bonus before diminishing returns and the overall cap
    pub fn bonus(&self) -> f64 {
        match self {
            CertificationType::Organic => 0.15,
            CertificationType::GeographicIndication => 0.12,
            CertificationType::FairTrade => 0.10,
            CertificationType::RainforestAlliance => 0.08,
            CertificationType::UTZ => 0.06,
            CertificationType::ThaiGAP | CertificationType::Custom(_) => 0.05,
        }
    }
}

impl std::fmt::Display for CertificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificationType::Organic => write!(f, "Organic"),
            CertificationType::FairTrade => write!(f, "Fair Trade"),
            CertificationType::RainforestAlliance => write!(f, "Rainforest Alliance"),
            CertificationType::UTZ => write!(f, "UTZ"),
            CertificationType::GeographicIndication => write!(f, "Geographic Indication"),
            CertificationType::ThaiGAP => write!(f, "Thai GAP"),
            CertificationType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Kind of buyer placing the order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuyerType {
    Processor,
    Exporter,
    Wholesaler,
    Retailer,
    Cooperative,
    Individual,
}

/// Optional profile of the prospective buyer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuyerProfile {
    pub buyer_type: BuyerType,
    /// Requested order size, kg
    pub order_volume_kg: f64,
    pub requested_delivery_date: Option<NaiveDate>,
    /// Buyer rating on a 0-5 scale
    pub reputation: Option<f64>,
    pub location: Option<GpsCoordinates>,
    #[serde(default)]
    pub preferences: Vec<String>,
}
