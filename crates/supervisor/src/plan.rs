//! Translation plans for every configured route

use contracts::{BridgeConfig, ContractError};
use encoder::WeatherEncoder;
use extractor::ExpressionCache;
use ingestion::RoutePlan;
use tracing::{debug, instrument};

/// Compile every route of the configuration
///
/// Expressions are compiled once and shared between routes that use the same
/// path text. The first invalid expression aborts setup.
#[instrument(name = "build_plans", skip(config), fields(routes = config.mqtt.topics.len()))]
pub fn build_plans(config: &BridgeConfig) -> Result<Vec<RoutePlan>, ContractError> {
    let mut cache = ExpressionCache::new();
    let encoder = WeatherEncoder::new(config.pipeline.software_suffix.clone());
    let default_location = config.location.default_location();

    let plans = config
        .mqtt
        .topics
        .iter()
        .map(|route| {
            RoutePlan::build(route, &mut cache, encoder.clone(), default_location)
                .map_err(ContractError::from)
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(expressions = cache.len(), "route plans compiled");
    Ok(plans)
}
