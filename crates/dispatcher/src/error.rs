//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sender could not be built from configuration
    #[error("failed to create sender '{name}': {message}")]
    SenderCreation { name: String, message: String },

    /// Callsign or digipeater not representable as an AX.25 address
    #[error("invalid AX.25 address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    /// Sender error (from contract)
    #[error("sender error: {0}")]
    Contract(#[from] ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sender creation error
    pub fn sender_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SenderCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            message: message.into(),
        }
    }
}

impl From<DispatcherError> for ContractError {
    fn from(err: DispatcherError) -> Self {
        match err {
            DispatcherError::Contract(inner) => inner,
            DispatcherError::Io(io) => ContractError::Io(io),
            DispatcherError::SenderCreation { name, message } => {
                ContractError::sender_connection(name, message)
            }
            other @ DispatcherError::InvalidAddress { .. } => {
                ContractError::config_validation("kiss", other.to_string())
            }
        }
    }
}
