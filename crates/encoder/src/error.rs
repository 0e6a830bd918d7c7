//! Encoder error types

use contracts::ContractError;
use thiserror::Error;

/// Encoder-specific errors
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    /// Latitude outside [-90, 90] or not finite
    #[error("latitude {0} is out of range")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("longitude {0} is out of range")]
    InvalidLongitude(f64),
}

impl EncodeError {
    /// Attach the topic and convert into the shared taxonomy
    pub fn into_contract(self, topic: impl Into<String>) -> ContractError {
        ContractError::Encoding {
            topic: topic.into(),
            message: self.to_string(),
        }
    }
}
