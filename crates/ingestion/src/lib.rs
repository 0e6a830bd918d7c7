//! # Ingestion
//!
//! Topic routing module.
//!
//! Responsibilities:
//! - Subscribe one router per configured topic
//! - Decode payloads, extract fields, encode packets
//! - Push packets onto the target's output queue
//! - Provide message sources (MQTT, in-memory, JSON-lines replay)
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{ChannelSource, RoutePlan, TopicRouter};
//!
//! let plan = RoutePlan::build(&route, &mut cache, encoder, default_location)?;
//! let (source, handle) = ChannelSource::new(&route.topic);
//! let router = TopicRouter::new(plan, source, queue);
//! let report = router.run(cancel).await;
//! ```

mod decode;
mod error;
mod metrics;
mod router;
mod source;

// Re-exports
pub use decode::decode_payload;
pub use error::{MessageError, Result, RouterError};
pub use metrics::{RouterCounters, RouterMetrics};
pub use router::{
    system_clock, Clock, RoutePlan, RouterOutcome, RouterReport, RouterState, TopicRouter,
};
pub use source::{
    load_replay, parse_replay, replay_sources, topic_matches, ChannelSource, ChannelSourceHandle,
    MqttConnection, MqttSource,
};
