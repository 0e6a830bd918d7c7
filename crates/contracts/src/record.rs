//! WeatherRecord - Extractor output

use serde::{Deserialize, Serialize};

/// Decimal-degree position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Normalized measurement record
///
/// Values are already unit-converted: temperature in °F, pressure in tenths
/// of millibars, rain in hundredths of an inch, speeds in mph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub temperature: Option<f64>,
    pub rain_last_hour: Option<f64>,
    pub rain_last_24h: Option<f64>,
    pub rain_since_midnight: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,

    /// Per-message latitude, overrides the configured default
    pub latitude: Option<f64>,
    /// Per-message longitude, overrides the configured default
    pub longitude: Option<f64>,
}

impl WeatherRecord {
    /// Resolve the position for this record
    ///
    /// Each coordinate falls back to the default independently.
    pub fn position_or(&self, default: Option<Location>) -> Option<Location> {
        let latitude = self.latitude.or(default.map(|l| l.latitude))?;
        let longitude = self.longitude.or(default.map(|l| l.longitude))?;
        Some(Location::new(latitude, longitude))
    }

    /// Whether no weather value resolved
    pub fn is_empty(&self) -> bool {
        [
            self.wind_direction,
            self.wind_speed,
            self.wind_gust,
            self.temperature,
            self.rain_last_hour,
            self.rain_last_24h,
            self.rain_since_midnight,
            self.humidity,
            self.pressure,
        ]
        .iter()
        .all(Option::is_none)
    }
}
