//! `translate` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use contracts::{BridgeConfig, OutputTarget};
use ingestion::{topic_matches, RoutePlan};
use supervisor::build_plans;
use tracing::info;

use crate::cli::{Cli, TranslateArgs};
use super::load_config;
use crate::error::CliError;

/// Execute the `translate` command
pub fn run_translate(cli: &Cli, args: &TranslateArgs) -> Result<()> {
    let config = load_config(cli)?;
    let line = translate(&config, args)?;
    println!("{line}");
    Ok(())
}

/// Translate one payload into the line the route's target would carry
fn translate(config: &BridgeConfig, args: &TranslateArgs) -> Result<String> {
    let plan = find_plan(build_plans(config)?, &args.topic)?;
    let plan = match &args.time {
        Some(text) => {
            let at: DateTime<Utc> = DateTime::parse_from_rfc3339(text)
                .with_context(|| format!("Invalid --time '{text}'"))?
                .with_timezone(&Utc);
            plan.with_clock(Arc::new(move || at))
        }
        None => plan,
    };

    info!(topic = %plan.topic, output = %plan.target, "Translating payload");
    let packet = plan
        .translate(args.payload.as_bytes())
        .map_err(|e| e.into_contract(&args.topic))
        .context("Payload could not be translated")?;

    let line = match (plan.target, config.aprs.as_ref()) {
        (OutputTarget::Internet, Some(aprs)) => {
            format!("{}{}", encoder::aprs_is_header(&aprs.callsign_with_ssid()), packet)
        }
        _ => packet.into_string(),
    };
    Ok(line)
}

/// Exact topic first, then the first route whose filter matches
fn find_plan(mut plans: Vec<RoutePlan>, topic: &str) -> Result<RoutePlan> {
    let index = plans
        .iter()
        .position(|p| p.topic == topic)
        .or_else(|| plans.iter().position(|p| topic_matches(&p.topic, topic)))
        .ok_or_else(|| CliError::route_not_found(topic))?;
    Ok(plans.swap_remove(index))
}
