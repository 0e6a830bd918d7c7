//! RawMessage - message source output

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A message as delivered by a topic-addressed channel
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Topic the message was published on
    pub topic: String,

    /// Undecoded payload
    pub payload: Bytes,

    /// Receipt time (UTC)
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    /// Create a message received now
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }

    /// Create a message with an explicit receipt time
    pub fn at(
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at,
        }
    }
}
