//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// mqtt2aprs - MQTT weather telemetry to APRS bridge
#[derive(Parser, Debug)]
#[command(
    name = "mqtt2aprs",
    author,
    version,
    about = "Translate MQTT weather telemetry into APRS weather reports",
    long_about = "Subscribes to configured MQTT topics, extracts weather fields with JMESPath \n\
                  expressions, encodes APRS positioned weather reports and delivers them \n\
                  to APRS-IS and/or a KISS TNC."
)]
pub struct Cli {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        global = true,
        default_value = config_loader::DEFAULT_CONFIG_PATH,
        env = "MQTT2APRS_CONFIG"
    )]
    pub config: PathBuf,

    /// Fill unset configuration keys from <SECTION>_<KEY> environment variables (default)
    #[arg(long, global = true, overrides_with = "no_load_env")]
    pub load_env: bool,

    /// Ignore environment variables when loading configuration
    #[arg(long, global = true, overrides_with = "load_env")]
    pub no_load_env: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MQTT2APRS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (overrides logging.log_format)
    #[arg(long, value_enum, global = true, env = "MQTT2APRS_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether the environment overlay is applied
    pub fn env_overlay_enabled(&self) -> bool {
        !self.no_load_env
    }

    /// Level forced by -v/-q, if any
    pub fn level_override(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("warn");
        }
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge until every topic stops or a shutdown signal arrives
    Run(RunArgs),

    /// Validate configuration file without running
    #[command(alias = "check-config")]
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Translate a single payload and print the packet
    Translate(TranslateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Feed messages from a JSON-lines file instead of the MQTT broker
    #[arg(long, value_name = "JSONL")]
    pub replay: Option<PathBuf>,

    /// Log packets instead of transmitting them
    #[arg(long)]
    pub print_only: bool,

    /// Prometheus metrics port (disabled when unset)
    #[arg(long, env = "MQTT2APRS_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `translate` command
#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// Topic of a configured route
    #[arg(long)]
    pub topic: String,

    /// Payload text, as it would arrive on the topic
    #[arg(long)]
    pub payload: String,

    /// Timestamp to encode (RFC 3339, default: now)
    #[arg(long)]
    pub time: Option<String>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => contracts::LogFormat::Json,
            LogFormat::Pretty => contracts::LogFormat::Pretty,
            LogFormat::Compact => contracts::LogFormat::Compact,
        }
    }
}
