//! In-memory message source
//!
//! Used by tests and by replay. Dropping every handle ends the source.

use bytes::Bytes;
use contracts::{ContractError, MessageSource, RawMessage};
use tokio::sync::mpsc;

/// Item delivered to a topic source
pub(crate) type SourceEvent = Result<RawMessage, ContractError>;

/// Receive side
#[derive(Debug)]
pub struct ChannelSource {
    topic: String,
    rx: mpsc::UnboundedReceiver<SourceEvent>,
    subscribed: bool,
}

/// Send side
#[derive(Debug, Clone)]
pub struct ChannelSourceHandle {
    topic: String,
    tx: mpsc::UnboundedSender<SourceEvent>,
}

impl ChannelSource {
    /// Create a source and its feeding handle
    pub fn new(topic: impl Into<String>) -> (Self, ChannelSourceHandle) {
        let topic = topic.into();
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                topic: topic.clone(),
                rx,
                subscribed: false,
            },
            ChannelSourceHandle { topic, tx },
        )
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

impl ChannelSourceHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Deliver a message; false once the source is gone
    pub fn send(&self, message: RawMessage) -> bool {
        self.tx.send(Ok(message)).is_ok()
    }

    /// Deliver a payload on this handle's topic, received now
    pub fn publish(&self, payload: impl Into<Bytes>) -> bool {
        self.send(RawMessage::new(self.topic.clone(), payload))
    }

    /// Simulate a connection loss
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(Err(ContractError::source_connection(
                self.topic.clone(),
                message,
            )))
            .is_ok()
    }
}

impl MessageSource for ChannelSource {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn subscribe(&mut self) -> Result<(), ContractError> {
        self.subscribed = true;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<RawMessage>, ContractError> {
        match self.rx.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_order_then_ends() {
        let (mut source, handle) = ChannelSource::new("wx/a");
        assert!(handle.publish("1"));
        assert!(handle.publish("2"));
        drop(handle);

        source.subscribe().await.unwrap();
        assert!(source.is_subscribed());
        assert_eq!(source.recv().await.unwrap().unwrap().payload, "1");
        assert_eq!(source.recv().await.unwrap().unwrap().payload, "2");
        assert!(source.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failure_is_reported() {
        let (mut source, handle) = ChannelSource::new("wx/a");
        handle.fail("gone");
        let err = source.recv().await.unwrap_err();
        assert!(matches!(err, ContractError::SourceConnection { .. }));
    }
}
