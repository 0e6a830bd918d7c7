//! TopicRoute - static binding of one topic to an extraction scheme and an output target

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload format of inbound messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// UTF-8 JSON document
    #[default]
    Json,
}

/// Packet kind produced for a route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    /// Positioned weather report
    #[default]
    Weather,
}

/// Output transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputTarget {
    /// APRS-IS internet gateway
    #[serde(rename = "is")]
    Internet,
    /// KISS framed serial / TCP TNC
    #[serde(rename = "kiss")]
    Kiss,
}

impl OutputTarget {
    /// All targets, in dispatcher start order
    pub const ALL: [OutputTarget; 2] = [OutputTarget::Internet, OutputTarget::Kiss];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTarget::Internet => "aprs-is",
            OutputTarget::Kiss => "kiss",
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical measurement names that can be bound to a path expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    TemperatureF,
    TemperatureC,
    WindDirection,
    WindSpeed,
    WindGust,
    RainLastHour,
    RainLast24Hours,
    RainSinceMidnight,
    Humidity,
    PressureMbar,
    PressureInHg,
    Latitude,
    Longitude,
}

impl FieldName {
    /// Configuration key for this field
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::TemperatureF => "temperature_f",
            FieldName::TemperatureC => "temperature_c",
            FieldName::WindDirection => "wind_dir",
            FieldName::WindSpeed => "wind_speed",
            FieldName::WindGust => "wind_gust",
            FieldName::RainLastHour => "rain_last_hr",
            FieldName::RainLast24Hours => "rain_last_24_hrs",
            FieldName::RainSinceMidnight => "rain_since_midnight",
            FieldName::Humidity => "humidity",
            FieldName::PressureMbar => "pressure_mbar",
            FieldName::PressureInHg => "pressure_inhg",
            FieldName::Latitude => "latitude",
            FieldName::Longitude => "longitude",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field paths: one optional JMESPath expression per canonical name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPaths {
    /// Temperature in Fahrenheit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_f: Option<String>,
    /// Temperature in Celsius, converted to Fahrenheit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<String>,
    /// Wind direction in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<String>,
    /// Sustained one-minute wind speed (mph)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<String>,
    /// Peak wind speed in the last 5 minutes (mph)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_gust: Option<String>,
    /// Rainfall in the last hour (hundredths of an inch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_last_hr: Option<String>,
    /// Rainfall in the last 24 hours (hundredths of an inch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_last_24_hrs: Option<String>,
    /// Rainfall since midnight (hundredths of an inch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_since_midnight: Option<String>,
    /// Relative humidity (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<String>,
    /// Barometric pressure (tenths of millibars)
    #[serde(default, alias = "pressure", skip_serializing_if = "Option::is_none")]
    pub pressure_mbar: Option<String>,
    /// Barometric pressure in inches of mercury, converted to tenths of millibars
    #[serde(default, alias = "pressure_hg", skip_serializing_if = "Option::is_none")]
    pub pressure_inhg: Option<String>,
    /// Latitude in decimal degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    /// Longitude in decimal degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
}

impl FieldPaths {
    /// Iterate over the set entries
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        [
            (FieldName::TemperatureF, &self.temperature_f),
            (FieldName::TemperatureC, &self.temperature_c),
            (FieldName::WindDirection, &self.wind_dir),
            (FieldName::WindSpeed, &self.wind_speed),
            (FieldName::WindGust, &self.wind_gust),
            (FieldName::RainLastHour, &self.rain_last_hr),
            (FieldName::RainLast24Hours, &self.rain_last_24_hrs),
            (FieldName::RainSinceMidnight, &self.rain_since_midnight),
            (FieldName::Humidity, &self.humidity),
            (FieldName::PressureMbar, &self.pressure_mbar),
            (FieldName::PressureInHg, &self.pressure_inhg),
            (FieldName::Latitude, &self.latitude),
            (FieldName::Longitude, &self.longitude),
        ]
        .into_iter()
        .filter_map(|(name, path)| path.as_deref().map(|p| (name, p)))
    }

    /// Number of set entries
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no entry is set
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether the route supplies its own position
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Topic route configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRoute {
    /// Topic name (unique key)
    pub topic: String,

    /// Payload format
    #[serde(default)]
    pub input_type: PayloadFormat,

    /// Packet kind
    #[serde(default)]
    pub output_type: PacketKind,

    /// Output target
    pub target: OutputTarget,

    /// Field paths
    pub fields: FieldPaths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_paths_iter_skips_unset() {
        let paths = FieldPaths {
            wind_speed: Some("speed".into()),
            temperature_c: Some("temp".into()),
            ..Default::default()
        };
        let entries: Vec<_> = paths.iter().collect();
        assert_eq!(
            entries,
            vec![
                (FieldName::TemperatureC, "temp"),
                (FieldName::WindSpeed, "speed")
            ]
        );
        assert_eq!(paths.len(), 2);
        assert!(!paths.has_position());
    }

    #[test]
    fn route_deserializes_with_defaults() {
        let json = r#"{
            "topic": "wx/station1",
            "target": "is",
            "fields": { "wind_speed": "speed", "pressure": "baro" }
        }"#;
        let route: TopicRoute = serde_json::from_str(json).unwrap();
        assert_eq!(route.input_type, PayloadFormat::Json);
        assert_eq!(route.output_type, PacketKind::Weather);
        assert_eq!(route.target, OutputTarget::Internet);
        assert_eq!(route.fields.pressure_mbar.as_deref(), Some("baro"));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let json = r#"{ "topic": "t", "target": "carrier_pigeon", "fields": {} }"#;
        assert!(serde_json::from_str::<TopicRoute>(json).is_err());
    }

    #[test]
    fn unknown_field_name_is_rejected() {
        let json = r#"{ "topic": "t", "target": "kiss", "fields": { "dew_point": "dp" } }"#;
        assert!(serde_json::from_str::<TopicRoute>(json).is_err());
    }
}
