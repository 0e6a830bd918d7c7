//! Supervisor error types

use contracts::{ContractError, OutputTarget};
use thiserror::Error;

/// Pipeline assembly errors
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A route targets an output that was never added
    #[error("route '{topic}' targets '{target}', which has no output")]
    NoOutput { topic: String, target: OutputTarget },

    /// The same target was added twice
    #[error("output '{target}' is already configured")]
    DuplicateOutput { target: OutputTarget },

    /// Two routes share a topic
    #[error("topic '{topic}' already has a router")]
    DuplicateRoute { topic: String },
}

impl From<SupervisorError> for ContractError {
    fn from(err: SupervisorError) -> Self {
        match &err {
            SupervisorError::NoOutput { topic, .. } | SupervisorError::DuplicateRoute { topic } => {
                ContractError::route_setup(topic.clone(), err.to_string())
            }
            SupervisorError::DuplicateOutput { .. } => ContractError::Other(err.to_string()),
        }
    }
}
