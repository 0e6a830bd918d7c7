//! Command implementations.

mod info;
mod run;
mod translate;
mod validate;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, EnvOverlay};
use contracts::BridgeConfig;
use tracing::info;

use crate::cli::Cli;
use crate::error::CliError;

pub use info::run_info;
pub use run::run_pipeline;
pub use translate::run_translate;
pub use validate::run_validate;

/// Load and validate the configuration named on the command line
pub fn load_config(cli: &Cli) -> Result<BridgeConfig> {
    if !cli.config.exists() {
        return Err(CliError::config_not_found(cli.config.display().to_string()).into());
    }

    let overlay = cli.env_overlay_enabled().then(EnvOverlay::from_process);
    let config = ConfigLoader::load_from_path_with_env(&cli.config, overlay.as_ref())
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    info!(
        config = %cli.config.display(),
        broker = %format!("{}:{}", config.mqtt.host, config.mqtt.port),
        routes = config.mqtt.topics.len(),
        env_overlay = overlay.is_some(),
        "Configuration loaded"
    );
    Ok(config)
}
