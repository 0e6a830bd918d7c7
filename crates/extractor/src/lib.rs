//! # Extractor
//!
//! Field extraction for topic routes.
//!
//! Responsibilities:
//! - Compile each route's JMESPath expressions once, memoized by text
//! - Apply them to decoded payloads
//! - Normalize units (°C → °F, inHg → tenths of mbar)
//! - Output `WeatherRecord`
//!
//! ## Example
//!
//! ```ignore
//! use extractor::{ExpressionCache, FieldExtractor};
//!
//! let mut cache = ExpressionCache::new();
//! let extractor = FieldExtractor::for_route(&route, &mut cache)?;
//! let record = extractor.extract(&payload)?;
//! ```

mod cache;
mod error;
mod extract;

pub use cache::{CompiledExpression, ExpressionCache};
pub use error::ExtractError;
pub use extract::{celsius_to_fahrenheit, inhg_to_tenths_mbar, FieldExtractor};

pub use contracts::{FieldName, FieldPaths, WeatherRecord};
