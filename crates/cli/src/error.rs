//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// No configured route matches a topic
    #[error("No route configured for topic '{topic}'")]
    RouteNotFound { topic: String },

    /// Replay source missing for a route
    #[error("Replay source missing for topic '{topic}'")]
    ReplaySourceMissing { topic: String },

    /// The pipeline stopped with faulted routers or outputs
    #[error("Pipeline finished with {count} fault(s)")]
    PipelineFaults { count: usize },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn route_not_found(topic: impl Into<String>) -> Self {
        Self::RouteNotFound {
            topic: topic.into(),
        }
    }
}
