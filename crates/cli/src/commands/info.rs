//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeConfig, TopicRoute};
use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, InfoArgs};
use crate::commands::load_config;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    broker: BrokerInfo,
    routes: Vec<RouteInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    station: Option<StationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kiss: Option<KissInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_location: Option<(f64, f64)>,
    pipeline: PipelineInfo,
}

#[derive(Serialize)]
struct BrokerInfo {
    host: String,
    port: u16,
    authenticated: bool,
    keep_alive_secs: u64,
}

#[derive(Serialize)]
struct RouteInfo {
    topic: String,
    target: String,
    input_type: String,
    fields: Vec<(String, String)>,
}

#[derive(Serialize)]
struct StationInfo {
    callsign: String,
    server: String,
    receive_only: bool,
}

#[derive(Serialize)]
struct KissInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    digipeaters: Vec<String>,
}

#[derive(Serialize)]
struct PipelineInfo {
    software_suffix: String,
    drain_timeout_secs: u64,
    send_timeout_secs: u64,
}

/// Execute the `info` command
pub fn run_info(cli: &Cli, args: &InfoArgs) -> Result<()> {
    info!(config = %cli.config.display(), "Loading configuration info");

    let config = load_config(cli)?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn route_info(route: &TopicRoute) -> RouteInfo {
    RouteInfo {
        topic: route.topic.clone(),
        target: route.target.as_str().to_string(),
        input_type: format!("{:?}", route.input_type).to_lowercase(),
        fields: route
            .fields
            .iter()
            .map(|(name, path)| (name.as_str().to_string(), path.to_string()))
            .collect(),
    }
}

fn build_config_info(config: &BridgeConfig) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        broker: BrokerInfo {
            host: config.mqtt.host.clone(),
            port: config.mqtt.port,
            authenticated: config.mqtt.username.is_some(),
            keep_alive_secs: config.mqtt.keep_alive_secs,
        },
        routes: config.mqtt.topics.iter().map(route_info).collect(),
        station: config.aprs.as_ref().map(|aprs| StationInfo {
            callsign: aprs.callsign_with_ssid(),
            server: format!("{}:{}", aprs.host, aprs.port),
            receive_only: aprs.password < 0,
        }),
        kiss: config.kiss.as_ref().map(|kiss| KissInfo {
            path: kiss.path().map(str::to_string),
            digipeaters: kiss.digipeaters.clone(),
        }),
        default_location: config
            .location
            .default_location()
            .map(|loc| (loc.latitude, loc.longitude)),
        pipeline: PipelineInfo {
            software_suffix: config.pipeline.software_suffix.clone(),
            drain_timeout_secs: config.pipeline.drain_timeout_secs,
            send_timeout_secs: config.pipeline.send_timeout_secs,
        },
    }
}

fn print_config_info(config: &BridgeConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  mqtt2aprs Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let mqtt = &config.mqtt;
    println!("📡 Broker");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Address: {}:{}", mqtt.host, mqtt.port);
    match &mqtt.username {
        Some(user) => println!("   ├─ User: {}", user),
        None => println!("   ├─ User: (anonymous)"),
    }
    println!("   └─ Keep-alive: {}s", mqtt.keep_alive_secs);

    println!("\n🌦  Routes ({})", mqtt.topics.len());
    for (i, route) in mqtt.topics.iter().enumerate() {
        let is_last = i == mqtt.topics.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} → {} ({:?})",
            prefix, route.topic, route.target, route.input_type
        );
        let fields: Vec<_> = route.fields.iter().collect();
        for (j, (name, path)) in fields.iter().enumerate() {
            let field_prefix = if j == fields.len() - 1 { "└─" } else { "├─" };
            println!("   {}  {} {} = {}", child_prefix, field_prefix, name, path);
        }
    }

    println!("\n📻 Station");
    match &config.aprs {
        Some(aprs) => {
            println!("   ├─ Callsign: {}", aprs.callsign_with_ssid());
            println!("   ├─ APRS-IS: {}:{}", aprs.host, aprs.port);
            if aprs.password < 0 {
                println!("   ├─ Passcode: receive-only");
            }
        }
        None => println!("   ├─ Callsign: (not configured)"),
    }
    match config.kiss.as_ref().and_then(|k| k.path()) {
        Some(path) => println!("   ├─ KISS: {}", path),
        None => println!("   ├─ KISS: (not configured)"),
    }
    match config.location.default_location() {
        Some(loc) => println!("   └─ Default location: {}, {}", loc.latitude, loc.longitude),
        None => println!("   └─ Default location: (none)"),
    }

    let pipeline = &config.pipeline;
    println!("\n⚙️  Pipeline");
    println!("   ├─ Software suffix: {}", pipeline.software_suffix);
    println!("   ├─ Drain timeout: {}s", pipeline.drain_timeout_secs);
    println!("   └─ Send timeout: {}s", pipeline.send_timeout_secs);

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn describes_routes_and_station() {
        let config = ConfigLoader::load_from_str(
            r#"
[aprs]
callsign = "N0CALL"
ssid = 13
password = -1

[mqtt]
host = "broker.local"

[[mqtt.topics]]
topic = "wx/station1"
target = "is"
[mqtt.topics.fields]
latitude = "lat"
longitude = "lon"
humidity = "sensors.rh"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&config);
        assert_eq!(info.routes.len(), 1);
        assert_eq!(info.routes[0].target, "aprs-is");
        assert_eq!(info.routes[0].input_type, "json");
        assert_eq!(info.routes[0].fields.len(), 3);
        let station = info.station.as_ref().unwrap();
        assert_eq!(station.callsign, "N0CALL-13");
        assert!(station.receive_only);
        assert!(info.default_location.is_none());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["broker"]["host"], "broker.local");
        assert!(json.get("kiss").is_none());
        print_config_info(&config);
    }
}
