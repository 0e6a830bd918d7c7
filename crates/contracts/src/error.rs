//! Layered error definitions
//!
//! Categorized by source: config / route / message / source / sender

use thiserror::Error;

use crate::OutputTarget;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Route setup error (raised once, before any listening begins)
    #[error("route setup error for topic '{topic}': {message}")]
    RouteSetup { topic: String, message: String },

    // ===== Per-message Errors =====
    /// Payload could not be decoded into a structured document
    #[error("payload decode error on topic '{topic}': {message}")]
    PayloadDecode { topic: String, message: String },

    /// A matched field value could not be used
    #[error("extraction error on topic '{topic}' for field '{field}' (path '{path}'): {message}")]
    Extraction {
        topic: String,
        field: String,
        path: String,
        message: String,
    },

    /// Packet could not be encoded
    #[error("encode error on topic '{topic}': {message}")]
    Encoding { topic: String, message: String },

    // ===== Source Errors =====
    /// Message source connection lost
    #[error("message source for topic '{topic}' lost connection: {message}")]
    SourceConnection { topic: String, message: String },

    // ===== Sender Errors =====
    /// Sender connection error
    #[error("sender '{sender_name}' connection error: {message}")]
    SenderConnection {
        sender_name: String,
        message: String,
    },

    /// Sender write error
    #[error("sender '{sender_name}' write error: {message}")]
    SenderWrite {
        sender_name: String,
        message: String,
    },

    /// Output queue has no consumer anymore
    #[error("output queue for target '{target}' is closed")]
    QueueClosed { target: OutputTarget },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create route setup error
    pub fn route_setup(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RouteSetup {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create source connection error
    pub fn source_connection(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceConnection {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create sender connection error
    pub fn sender_connection(sender_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SenderConnection {
            sender_name: sender_name.into(),
            message: message.into(),
        }
    }

    /// Create sender write error
    pub fn sender_write(sender_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SenderWrite {
            sender_name: sender_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error only affects the message being processed
    pub fn is_per_message(&self) -> bool {
        matches!(
            self,
            Self::PayloadDecode { .. } | Self::Extraction { .. } | Self::Encoding { .. }
        )
    }
}
