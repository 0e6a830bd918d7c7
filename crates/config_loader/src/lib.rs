//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Overlay `<SECTION>_<KEY>` environment variables onto unset keys
//! - Validate configuration legality
//! - Generate `BridgeConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Broker: {}:{}", config.mqtt.host, config.mqtt.port);
//! ```

mod env;
mod parser;
mod validator;

pub use contracts::BridgeConfig;
pub use env::EnvOverlay;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Default configuration path when neither the CLI nor `MQTT2APRS_CONFIG` names one
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mqtt2aprs/config.toml";

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<BridgeConfig, ContractError> {
        Self::load_from_path_with_env(path, None)
    }

    /// Load configuration from file path, overlaying environment variables
    pub fn load_from_path_with_env(
        path: &Path,
        env: Option<&EnvOverlay>,
    ) -> Result<BridgeConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str_with_env(&content, format, env)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<BridgeConfig, ContractError> {
        Self::load_from_str_with_env(content, format, None)
    }

    /// Load configuration from string, overlaying environment variables
    pub fn load_from_str_with_env(
        content: &str,
        format: ConfigFormat,
        env: Option<&EnvOverlay>,
    ) -> Result<BridgeConfig, ContractError> {
        let mut document = parser::parse_document(content, format)?;
        if let Some(env) = env {
            env.apply(&mut document);
        }
        let config = parser::into_config(document)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Serialize BridgeConfig to TOML string
    pub fn to_toml(config: &BridgeConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize BridgeConfig to JSON string
    pub fn to_json(config: &BridgeConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[aprs]
callsign = "N0CALL"
password = 12345

[location]
latitude = 40.0
longitude = -105.0

[mqtt]
host = "localhost"

[[mqtt.topics]]
topic = "wx/station1"
target = "is"
[mqtt.topics.fields]
wind_speed = "speed"
temperature_c = "temp"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.mqtt.topics[0].topic, "wx/station1");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.mqtt.host, config2.mqtt.host);
        assert_eq!(config.mqtt.topics.len(), config2.mqtt.topics.len());
        assert_eq!(config.mqtt.topics[0].fields, config2.mqtt.topics[0].fields);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.mqtt.host, config2.mqtt.host);
    }

    #[test]
    fn test_env_overlay_supplies_missing_section() {
        let content = r#"
[mqtt]
host = "localhost"

[[mqtt.topics]]
topic = "wx/station1"
target = "is"
[mqtt.topics.fields]
humidity = "rh"
"#;
        // Without the env overlay the `is` target has no [aprs] section
        assert!(ConfigLoader::load_from_str(content, ConfigFormat::Toml).is_err());

        let env = EnvOverlay::from_fn(|name| match name {
            "APRS_CALLSIGN" => Some("N0CALL".to_string()),
            "APRS_PASSWORD" => Some("-1".to_string()),
            _ => None,
        });
        let config =
            ConfigLoader::load_from_str_with_env(content, ConfigFormat::Toml, Some(&env)).unwrap();
        assert_eq!(config.aprs.unwrap().password, -1);
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();
        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.mqtt.host, "localhost");

        let other = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(other.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[aprs]
callsign = "N0CALL"
password = 1

[mqtt]
host = "localhost"

[[mqtt.topics]]
topic = "wx/a"
target = "is"
[mqtt.topics.fields]
humidity = "rh"

[[mqtt.topics]]
topic = "wx/a"
target = "is"
[mqtt.topics.fields]
humidity = "rh"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}
