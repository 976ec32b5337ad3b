//! Weather API client for supply-side weather impact
//!
//! Integrates with the OpenWeatherMap current conditions API and maps the
//! conditions at a growing location to a price impact in [-0.5, 0.5].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{round_to, GpsCoordinates};

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

/// Heaviest impact either way
pub const MAX_WEATHER_IMPACT: f64 = 0.5;

/// Provides the weather adjustment for a location
#[async_trait]
pub trait WeatherImpactProvider: Send + Sync {
    async fn weather_impact(&self, location: &GpsCoordinates) -> AppResult<f64>;
}

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Current weather conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub timestamp: DateTime<Utc>,
    pub temperature_celsius: f64,
    pub humidity_percent: i32,
    pub wind_speed_mps: f64,
    pub weather_condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain_1h_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain_3h_mm: Option<f64>,
}

impl CurrentWeather {
    /// Hourly rainfall, estimated from the 3h total when needed
    pub fn rain_per_hour_mm(&self) -> f64 {
        self.rain_1h_mm
            .or_else(|| self.rain_3h_mm.map(|r| r / 3.0))
            .unwrap_or(0.0)
    }
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    weather: Vec<OWMWeather>,
    main: OWMMain,
    wind: OWMWind,
    rain: Option<OWMRain>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(config: &WeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Weather HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current weather conditions by GPS coordinates
    pub async fn get_current_weather(&self, location: &GpsCoordinates) -> AppResult<CurrentWeather> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url, location.latitude, location.longitude, self.api_key
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!("Weather API request failed: {}", e);
            AppError::WeatherServiceUnavailable
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API error: {} - {}", status, body);
            return Err(AppError::WeatherServiceUnavailable);
        }

        let data: OWMCurrentResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse weather response: {}", e);
            AppError::WeatherServiceUnavailable
        })?;

        Ok(convert_current_response(data))
    }
}

#[async_trait]
impl WeatherImpactProvider for WeatherClient {
    async fn weather_impact(&self, location: &GpsCoordinates) -> AppResult<f64> {
        let current = self.get_current_weather(location).await?;
        let impact = impact_from_conditions(&current);
        tracing::debug!(
            condition = %current.weather_condition,
            observed_at = %current.timestamp,
            temperature = current.temperature_celsius,
            humidity = current.humidity_percent,
            impact,
            "weather impact computed"
        );
        Ok(impact)
    }
}

/// Convert OpenWeatherMap current response to our format
fn convert_current_response(data: OWMCurrentResponse) -> CurrentWeather {
    CurrentWeather {
        timestamp: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
        temperature_celsius: data.main.temp,
        humidity_percent: data.main.humidity,
        wind_speed_mps: data.wind.speed,
        weather_condition: data
            .weather
            .first()
            .map(|w| w.main.clone())
            .unwrap_or_default(),
        rain_1h_mm: data.rain.as_ref().and_then(|r| r.one_hour),
        rain_3h_mm: data.rain.as_ref().and_then(|r| r.three_hour),
    }
}

/// Map current conditions to a price impact.
///
/// Heavy rain, heat, frost and storms threaten supply and push prices up;
/// mild dry weather nudges them slightly down.
pub fn impact_from_conditions(weather: &CurrentWeather) -> f64 {
    let rain = weather.rain_per_hour_mm();
    let temp = weather.temperature_celsius;
    let mut impact: f64 = 0.0;

    if rain >= 10.0 {
        impact += 0.3;
    } else if rain >= 4.0 {
        impact += 0.15;
    }

    if temp >= 35.0 {
        impact += 0.2;
    } else if temp >= 32.0 {
        impact += 0.1;
    } else if temp <= 5.0 {
        impact += 0.15;
    }

    if weather.wind_speed_mps >= 17.0 {
        impact += 0.15;
    }

    let mild = rain < 1.0 && (18.0..=30.0).contains(&temp) && weather.wind_speed_mps < 8.0;
    if mild {
        impact = -0.05;
    }

    round_to(impact.clamp(-MAX_WEATHER_IMPACT, MAX_WEATHER_IMPACT), 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(temp: f64, rain_1h: Option<f64>, wind: f64) -> CurrentWeather {
        CurrentWeather {
            timestamp: Utc::now(),
            temperature_celsius: temp,
            humidity_percent: 70,
            wind_speed_mps: wind,
            weather_condition: "Clouds".to_string(),
            rain_1h_mm: rain_1h,
            rain_3h_mm: None,
        }
    }

    #[test]
    fn test_mild_weather_is_slightly_negative() {
        assert_eq!(impact_from_conditions(&weather(25.0, None, 3.0)), -0.05);
    }

    #[test]
    fn test_heavy_rain_and_heat_push_prices_up() {
        assert_eq!(impact_from_conditions(&weather(36.0, Some(12.0), 4.0)), 0.5);
        assert_eq!(impact_from_conditions(&weather(26.0, Some(5.0), 4.0)), 0.15);
    }

    #[test]
    fn test_impact_is_bounded() {
        let storm = weather(40.0, Some(50.0), 30.0);
        let impact = impact_from_conditions(&storm);
        assert!((-MAX_WEATHER_IMPACT..=MAX_WEATHER_IMPACT).contains(&impact));
    }

    #[test]
    fn test_three_hour_rain_fallback() {
        let mut w = weather(20.0, None, 2.0);
        w.rain_3h_mm = Some(15.0);
        assert_eq!(w.rain_per_hour_mm(), 5.0);
    }

    #[test]
    fn test_parse_owm_response() {
        let data: OWMCurrentResponse = serde_json::from_str(
            r#"{
                "weather": [{"main": "Rain", "description": "heavy rain", "icon": "10d"}],
                "main": {"temp": 27.5, "feels_like": 30.1, "pressure": 1008, "humidity": 88},
                "wind": {"speed": 5.2, "deg": 200},
                "rain": {"1h": 11.0},
                "dt": 1700000000
            }"#,
        )
        .unwrap();

        let current = convert_current_response(data);
        assert_eq!(current.weather_condition, "Rain");
        assert_eq!(current.rain_1h_mm, Some(11.0));
        assert_eq!(impact_from_conditions(&current), 0.3);
    }
}
