//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use dispatcher::ConfiguredSender;
use ingestion::MqttConnection;
use supervisor::{build_plans, Supervisor, SupervisorSettings};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_pipeline(config: BridgeConfig, args: &RunArgs) -> Result<()> {
    let plans = build_plans(&config).context("Failed to compile route field paths")?;

    let mut supervisor = Supervisor::new(SupervisorSettings::from(&config.pipeline));
    for target in config.active_targets() {
        let sender = ConfiguredSender::from_config(target, &config, args.print_only)
            .with_context(|| format!("Failed to create sender for '{target}'"))?;
        supervisor.add_output(target, sender)?;
    }
    if args.print_only {
        info!("Print-only mode - packets are logged, not transmitted");
    }

    let mqtt_cancel = CancellationToken::new();
    let mut mqtt = None;
    match &args.replay {
        Some(path) => {
            info!(path = %path.display(), "Running in REPLAY mode");
            let messages = ingestion::load_replay(path)
                .with_context(|| format!("Failed to load replay from {}", path.display()))?;
            let mut sources =
                ingestion::replay_sources(messages, plans.iter().map(|p| p.topic.as_str()));
            for plan in plans {
                let source = sources
                    .remove(&plan.topic)
                    .ok_or_else(|| CliError::ReplaySourceMissing {
                        topic: plan.topic.clone(),
                    })?;
                supervisor.add_route(plan, source)?;
            }
        }
        None => {
            info!(
                host = %config.mqtt.host,
                port = config.mqtt.port,
                "Connecting to MQTT broker"
            );
            let mut connection = MqttConnection::new(&config.mqtt);
            for plan in plans {
                let source = connection.source(&plan.topic);
                supervisor.add_route(plan, source)?;
            }
            let event_loop = connection.start(mqtt_cancel.clone());
            mqtt = Some((connection, event_loop));
        }
    }

    // Setup graceful shutdown handler
    let cancel = supervisor.cancel_token();
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping routers...");
        cancel.cancel();
    });

    info!(
        outputs = supervisor.output_count(),
        routes = supervisor.route_count(),
        "Starting pipeline..."
    );
    let report = supervisor.run().await;
    signal_task.abort();

    if let Some((connection, event_loop)) = mqtt {
        connection.disconnect().await;
        mqtt_cancel.cancel();
        if let Some(handle) = event_loop {
            let _ = handle.await;
        }
    }

    report.print_summary();

    if !report.is_clean() {
        return Err(CliError::PipelineFaults {
            count: report.fault_count(),
        }
        .into());
    }

    info!("mqtt2aprs finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
