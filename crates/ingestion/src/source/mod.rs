//! Message source implementations

mod channel;
mod mqtt;
mod replay;

pub use channel::{ChannelSource, ChannelSourceHandle};
pub use mqtt::{topic_matches, MqttConnection, MqttSource};
pub use replay::{load_replay, parse_replay, replay_sources};
