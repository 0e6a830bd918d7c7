//! BridgeConfig - Config Loader output
//!
//! Describes the complete process configuration: logging, APRS identity,
//! KISS transport, default location, pipeline tuning and MQTT routes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::{Location, OutputTarget, TopicRoute};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// APRS identity and APRS-IS server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aprs: Option<AprsConfig>,

    /// KISS TNC transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kiss: Option<KissConfig>,

    /// Default station location
    #[serde(default)]
    pub location: LocationConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// MQTT broker and topic routes
    pub mqtt: MqttConfig,
}

impl BridgeConfig {
    /// Output targets referenced by at least one route
    pub fn active_targets(&self) -> BTreeSet<OutputTarget> {
        self.mqtt.topics.iter().map(|route| route.target).collect()
    }

    /// Find a route by topic
    pub fn route(&self, topic: &str) -> Option<&TopicRoute> {
        self.mqtt.topics.iter().find(|route| route.topic == topic)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level / filter directive (`RUST_LOG` takes precedence)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Directory to write `mqtt2aprs.log` into; stdout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            log_path: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line
    #[default]
    Pretty,
    /// Single line
    Compact,
    /// JSON structured
    Json,
}

/// APRS station identity and APRS-IS server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprsConfig {
    /// Station callsign
    pub callsign: String,

    /// Optional SSID (0-15)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<u8>,

    /// APRS-IS passcode
    pub password: i32,

    /// APRS-IS host
    #[serde(default = "default_aprs_host")]
    pub host: String,

    /// APRS-IS port
    #[serde(default = "default_aprs_port")]
    pub port: u16,
}

impl AprsConfig {
    /// Callsign with the SSID suffix when one is set
    pub fn callsign_with_ssid(&self) -> String {
        match self.ssid {
            Some(ssid) => format!("{}-{}", self.callsign, ssid),
            None => self.callsign.clone(),
        }
    }
}

fn default_aprs_host() -> String {
    "rotate.aprs.net".to_string()
}

fn default_aprs_port() -> u16 {
    10152
}

/// KISS TNC configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KissConfig {
    /// Serial device path, or `tcp://host:port` for a network TNC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// AX.25 digipeater path (e.g. `WIDE1-1`)
    #[serde(default)]
    pub digipeaters: Vec<String>,
}

impl KissConfig {
    /// Configured path, if non-empty
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Default location configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Default location, when both coordinates are configured
    pub fn default_location(&self) -> Option<Location> {
        Some(Location::new(self.latitude?, self.longitude?))
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Text appended after the `w` marker of every weather packet
    #[serde(default = "default_software_suffix")]
    pub software_suffix: String,

    /// Maximum time to wait for output queues to drain on shutdown
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// Maximum time a single transmission may take
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl PipelineSettings {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            software_suffix: default_software_suffix(),
            drain_timeout_secs: default_drain_timeout_secs(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_software_suffix() -> String {
    "M2A".to_string()
}

fn default_drain_timeout_secs() -> u64 {
    30
}

fn default_send_timeout_secs() -> u64 {
    10
}

/// MQTT broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host
    pub host: String,

    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// Username, if the broker requires auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password, if the broker requires auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Client identifier (random when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Topic routes
    #[serde(default)]
    pub topics: Vec<TopicRoute>,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_keep_alive_secs() -> u64 {
    30
}
