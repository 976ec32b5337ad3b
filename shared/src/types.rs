//! Common types used across the platform

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_KM: f64 = 6371.0;

/// GPS coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GpsCoordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance to another point in kilometres
    pub fn distance_km(&self, other: &GpsCoordinates) -> f64 {
        let lat1 = self.latitude.to_f64().unwrap_or_default().to_radians();
        let lat2 = other.latitude.to_f64().unwrap_or_default().to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude.to_f64().unwrap_or_default()
            - self.longitude.to_f64().unwrap_or_default())
        .to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Coordinates rounded to one decimal place (~11 km), used for cache keys
    pub fn coarse(&self) -> (Decimal, Decimal) {
        (self.latitude.round_dp(1), self.longitude.round_dp(1))
    }
}

/// Coarse three-step level used for supply and demand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::Medium => write!(f, "medium"),
            Level::High => write!(f, "high"),
        }
    }
}

/// Round to a fixed number of decimal places without leaving f64
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn distance_to_self_is_zero() {
        let chiang_mai = GpsCoordinates::new(dec("18.7883"), dec("98.9853"));
        assert!(chiang_mai.distance_km(&chiang_mai) < 1e-9);
    }

    #[test]
    fn distance_chiang_mai_to_bangkok() {
        let chiang_mai = GpsCoordinates::new(dec("18.7883"), dec("98.9853"));
        let bangkok = GpsCoordinates::new(dec("13.7563"), dec("100.5018"));
        let d = chiang_mai.distance_km(&bangkok);
        // Roughly 580 km as the crow flies
        assert!(d > 560.0 && d < 600.0, "distance was {}", d);
    }

    #[test]
    fn coarse_rounds_to_one_place() {
        let c = GpsCoordinates::new(dec("6.6884"), dec("-1.6244"));
        assert_eq!(c.coarse(), (dec("6.7"), dec("-1.6")));
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(2308.163265, 2), 2308.16);
        assert_eq!(round_to(0.125, 1), 0.1);
    }
}
