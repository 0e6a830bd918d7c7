//! JSON-lines replay
//!
//! Each line: `{"topic": "...", "payload": <JSON value or string>}`. Blank
//! lines and `#` comments are skipped.

use std::collections::HashMap;
use std::path::Path;

use contracts::{ContractError, RawMessage};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::channel::ChannelSource;
use super::mqtt::topic_matches;

#[derive(Debug, Deserialize)]
struct ReplayLine {
    topic: String,
    payload: Value,
}

/// Parse replay content
pub fn parse_replay(content: &str) -> Result<Vec<RawMessage>, ContractError> {
    let mut messages = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry: ReplayLine = serde_json::from_str(line)
            .map_err(|e| ContractError::Other(format!("replay line {}: {e}", idx + 1)))?;
        let payload = match entry.payload {
            Value::String(text) => text.into_bytes(),
            other => serde_json::to_vec(&other)
                .map_err(|e| ContractError::Other(format!("replay line {}: {e}", idx + 1)))?,
        };
        messages.push(RawMessage::new(entry.topic, payload));
    }
    Ok(messages)
}

/// Read and parse a replay file
pub fn load_replay(path: &Path) -> Result<Vec<RawMessage>, ContractError> {
    let content = std::fs::read_to_string(path)?;
    let messages = parse_replay(&content)?;
    info!(path = %path.display(), messages = messages.len(), "replay loaded");
    Ok(messages)
}

/// Build one pre-filled, already-ended source per route topic
///
/// A message goes to every route whose topic filter matches it.
pub fn replay_sources<'a>(
    messages: Vec<RawMessage>,
    topics: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, ChannelSource> {
    let mut sources = HashMap::new();
    let mut handles = Vec::new();
    for topic in topics {
        let (source, handle) = ChannelSource::new(topic);
        sources.insert(topic.to_string(), source);
        handles.push(handle);
    }

    for message in messages {
        let mut routed = false;
        for handle in handles
            .iter()
            .filter(|h| topic_matches(h.topic(), &message.topic))
        {
            routed |= handle.send(message.clone());
        }
        if !routed {
            warn!(topic = %message.topic, "replay message matches no route");
        }
    }

    sources
}
