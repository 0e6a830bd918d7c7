//! # mqtt2aprs CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 管道编排与生命周期管理
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use contracts::LoggingConfig;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{load_config, run_info, run_pipeline, run_translate, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => {
            // Logging settings come from the configuration file for long runs
            let config = load_config(&cli)?;
            init_logging(&cli, Some(&config.logging), args.metrics_port)?;
            log_start();
            run_pipeline(config, args).await
        }
        Commands::Validate(args) => {
            init_logging(&cli, None, None)?;
            log_start();
            run_validate(&cli, args)
        }
        Commands::Info(args) => {
            init_logging(&cli, None, None)?;
            log_start();
            run_info(&cli, args)
        }
        Commands::Translate(args) => {
            init_logging(&cli, None, None)?;
            log_start();
            run_translate(&cli, args)
        }
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

fn log_start() {
    info!(version = env!("CARGO_PKG_VERSION"), "mqtt2aprs starting");
}

/// Initialize logging from the `[logging]` section and CLI options
///
/// `-v`/`-q` and `--log-format` win over the file; `RUST_LOG` wins over both.
fn init_logging(
    cli: &Cli,
    logging: Option<&LoggingConfig>,
    metrics_port: Option<u16>,
) -> Result<()> {
    let mut config = logging
        .map(ObservabilityConfig::from_logging)
        .unwrap_or_default();

    if let Some(level) = cli.level_override() {
        config.default_log_level = level.to_string();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format.into();
    }
    config.metrics_port = metrics_port;

    observability::init_with_config(config)
}
