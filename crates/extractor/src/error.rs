//! Extractor error types

use contracts::{ContractError, FieldName};
use thiserror::Error;

/// Extractor-specific errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Path expression failed to compile
    #[error("invalid path expression '{path}' for field '{field}': {message}")]
    InvalidExpression {
        topic: String,
        field: FieldName,
        path: String,
        message: String,
    },

    /// Path expression failed at evaluation time
    #[error("failed to evaluate '{path}' for field '{field}': {message}")]
    Evaluation {
        topic: String,
        field: FieldName,
        path: String,
        message: String,
    },

    /// Matched value is neither a number nor a numeric string
    #[error("value {value} at '{path}' for field '{field}' is not numeric")]
    NonNumeric {
        topic: String,
        field: FieldName,
        path: String,
        value: String,
    },
}

impl ExtractError {
    /// Topic the error occurred on
    pub fn topic(&self) -> &str {
        match self {
            Self::InvalidExpression { topic, .. }
            | Self::Evaluation { topic, .. }
            | Self::NonNumeric { topic, .. } => topic,
        }
    }

    /// Canonical field name
    pub fn field(&self) -> FieldName {
        match self {
            Self::InvalidExpression { field, .. }
            | Self::Evaluation { field, .. }
            | Self::NonNumeric { field, .. } => *field,
        }
    }

    /// Offending path expression
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidExpression { path, .. }
            | Self::Evaluation { path, .. }
            | Self::NonNumeric { path, .. } => path,
        }
    }
}

impl From<ExtractError> for ContractError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::InvalidExpression {
                ref topic,
                field,
                ref path,
                ref message,
            } => ContractError::route_setup(
                topic.clone(),
                format!("invalid path expression '{path}' for field '{field}': {message}"),
            ),
            other => ContractError::Extraction {
                topic: other.topic().to_string(),
                field: other.field().to_string(),
                path: other.path().to_string(),
                message: other.to_string(),
            },
        }
    }
}
