//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, OutputTarget};
use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, ValidateArgs};
use crate::commands::load_config;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    broker: String,
    route_count: usize,
    targets: Vec<String>,
}

/// Execute the `validate` command
pub fn run_validate(cli: &Cli, args: &ValidateArgs) -> Result<()> {
    info!(config = %cli.config.display(), "Validating configuration");

    let result = validate_config(cli);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(cli: &Cli) -> ValidationResult {
    let config_path = cli.config.display().to_string();

    let checked = load_config(cli).and_then(|config| {
        // Compile every path expression, as `run` would
        supervisor::build_plans(&config)?;
        Ok(config)
    });

    match checked {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(ConfigSummary {
                version: format!("{:?}", config.version),
                broker: format!("{}:{}", config.mqtt.host, config.mqtt.port),
                route_count: config.mqtt.topics.len(),
                targets: config
                    .active_targets()
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("{e:#}")),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.mqtt.topics.is_empty() {
        warnings.push("No topics configured - nothing will be translated".to_string());
    }

    let has_default_location = config.location.default_location().is_some();
    for route in &config.mqtt.topics {
        let fields = &route.fields;
        if !has_default_location && !fields.has_position() {
            warnings.push(format!(
                "Route '{}' has no latitude/longitude paths and no default location - \
                 its messages will be dropped",
                route.topic
            ));
        }
        if fields.temperature_f.is_some() && fields.temperature_c.is_some() {
            warnings.push(format!(
                "Route '{}' sets temperature_f and temperature_c - temperature_f wins when both match",
                route.topic
            ));
        }
        if fields.pressure_mbar.is_some() && fields.pressure_inhg.is_some() {
            warnings.push(format!(
                "Route '{}' sets pressure_mbar and pressure_inhg - pressure_mbar wins when both match",
                route.topic
            ));
        }
    }

    let targets = config.active_targets();
    if let Some(aprs) = &config.aprs {
        if aprs.password < 0 && targets.contains(&OutputTarget::Internet) {
            warnings.push(
                "aprs.password is a receive-only passcode - APRS-IS will not gate packets"
                    .to_string(),
            );
        }
    }
    if config.kiss.is_some() && !targets.contains(&OutputTarget::Kiss) {
        warnings.push("[kiss] is configured but no route targets 'kiss'".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Broker: {}", summary.broker);
            println!("  Routes: {}", summary.route_count);
            println!("  Targets: {}", summary.targets.join(", "));
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn warns_about_unpositioned_routes_and_precedence() {
        let config = ConfigLoader::load_from_str(
            r#"
[aprs]
callsign = "N0CALL"
password = -1

[kiss]
path = "/dev/null"

[mqtt]
host = "localhost"

[[mqtt.topics]]
topic = "wx/a"
target = "is"
[mqtt.topics.fields]
temperature_f = "tf"
temperature_c = "tc"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 4, "{warnings:#?}");
        assert!(warnings[0].contains("no default location"));
        assert!(warnings[1].contains("temperature_f wins"));
        assert!(warnings[2].contains("receive-only"));
        assert!(warnings[3].contains("[kiss]"));
    }
}
