//! Per-route field extraction

use std::collections::HashMap;

use contracts::{FieldName, FieldPaths, TopicRoute, WeatherRecord};
use jmespath::Variable;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::cache::{CompiledExpression, ExpressionCache};
use crate::error::ExtractError;

/// Inches of mercury per millibar
const INHG_PER_MBAR: f64 = 0.029530;

#[derive(Debug)]
struct CompiledField {
    name: FieldName,
    path: String,
    expression: CompiledExpression,
}

/// Field extractor bound to one route
///
/// Built once at route setup; every path expression is compiled up front so
/// that a malformed expression fails before any message is processed.
#[derive(Debug)]
pub struct FieldExtractor {
    topic: String,
    fields: Vec<CompiledField>,
}

impl FieldExtractor {
    /// Compile the route's field paths through the shared cache
    #[instrument(name = "extractor_compile", skip(paths, cache), fields(topic = %topic))]
    pub fn compile(
        topic: &str,
        paths: &FieldPaths,
        cache: &mut ExpressionCache,
    ) -> Result<Self, ExtractError> {
        let mut fields = Vec::with_capacity(paths.len());
        for (name, path) in paths.iter() {
            let expression = cache
                .compile(path)
                .map_err(|e| ExtractError::InvalidExpression {
                    topic: topic.to_string(),
                    field: name,
                    path: path.to_string(),
                    message: e.to_string(),
                })?;
            fields.push(CompiledField {
                name,
                path: path.to_string(),
                expression,
            });
        }

        Ok(Self {
            topic: topic.to_string(),
            fields,
        })
    }

    /// Compile from a route definition
    pub fn for_route(
        route: &TopicRoute,
        cache: &mut ExpressionCache,
    ) -> Result<Self, ExtractError> {
        Self::compile(&route.topic, &route.fields, cache)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of compiled field paths
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Apply every path to the payload and build a normalized record
    ///
    /// All paths are resolved before precedence is applied, so F-over-C and
    /// mbar-over-inHg hold regardless of declaration order. A path with no
    /// match leaves its field absent.
    pub fn extract(&self, payload: &Value) -> Result<WeatherRecord, ExtractError> {
        let mut resolved: HashMap<FieldName, f64> = HashMap::with_capacity(self.fields.len());

        for field in &self.fields {
            if let Some(value) = self.resolve(field, payload)? {
                resolved.insert(field.name, value);
            }
        }

        let temperature = resolved
            .get(&FieldName::TemperatureF)
            .copied()
            .or_else(|| {
                resolved
                    .get(&FieldName::TemperatureC)
                    .map(|c| celsius_to_fahrenheit(*c))
            });
        let pressure = resolved
            .get(&FieldName::PressureMbar)
            .copied()
            .or_else(|| {
                resolved
                    .get(&FieldName::PressureInHg)
                    .map(|inhg| inhg_to_tenths_mbar(*inhg))
            });

        Ok(WeatherRecord {
            wind_direction: resolved.get(&FieldName::WindDirection).copied(),
            wind_speed: resolved.get(&FieldName::WindSpeed).copied(),
            wind_gust: resolved.get(&FieldName::WindGust).copied(),
            temperature,
            rain_last_hour: resolved.get(&FieldName::RainLastHour).copied(),
            rain_last_24h: resolved.get(&FieldName::RainLast24Hours).copied(),
            rain_since_midnight: resolved.get(&FieldName::RainSinceMidnight).copied(),
            humidity: resolved.get(&FieldName::Humidity).copied(),
            pressure,
            latitude: resolved.get(&FieldName::Latitude).copied(),
            longitude: resolved.get(&FieldName::Longitude).copied(),
        })
    }

    fn resolve(
        &self,
        field: &CompiledField,
        payload: &Value,
    ) -> Result<Option<f64>, ExtractError> {
        let matched = field
            .expression
            .search(payload)
            .map_err(|e| ExtractError::Evaluation {
                topic: self.topic.clone(),
                field: field.name,
                path: field.path.clone(),
                message: e.to_string(),
            })?;

        if matched.is_null() {
            warn!(
                topic = %self.topic,
                field = %field.name,
                path = %field.path,
                "path matched nothing, field left empty"
            );
            return Ok(None);
        }

        numeric_value(&matched)
            .map(Some)
            .ok_or_else(|| ExtractError::NonNumeric {
                topic: self.topic.clone(),
                field: field.name,
                path: field.path.clone(),
                value: serde_json::to_string(&*matched).unwrap_or_else(|_| "?".to_string()),
            })
    }
}

fn numeric_value(value: &Variable) -> Option<f64> {
    if let Some(number) = value.as_number() {
        return Some(number);
    }
    value
        .as_string()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// °C to °F
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    1.8 * celsius + 32.0
}

/// inHg to tenths of millibars
pub fn inhg_to_tenths_mbar(inhg: f64) -> f64 {
    (inhg / INHG_PER_MBAR) * 10.0
}
