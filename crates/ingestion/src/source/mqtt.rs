//! MQTT message source
//!
//! One broker connection is shared by every topic. The event loop task routes
//! incoming publishes to per-topic channels by topic-filter matching.

use std::time::Duration;

use contracts::{ContractError, MessageSource, MqttConfig, RawMessage};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::channel::SourceEvent;

/// Request channel capacity of the MQTT client
const REQUEST_CAPACITY: usize = 64;

struct TopicChannel {
    filter: String,
    tx: mpsc::UnboundedSender<SourceEvent>,
}

/// Shared broker connection
pub struct MqttConnection {
    client: AsyncClient,
    event_loop: Option<EventLoop>,
    channels: Vec<TopicChannel>,
}

impl MqttConnection {
    /// Prepare a connection; nothing is sent until [`start`](Self::start)
    pub fn new(config: &MqttConfig) -> Self {
        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("mqtt2aprs-{}", std::process::id()));
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        Self {
            client,
            event_loop: Some(event_loop),
            channels: Vec::new(),
        }
    }

    /// Create the source for one topic (or topic filter)
    ///
    /// Must be called before `start`.
    pub fn source(&mut self, topic: &str) -> MqttSource {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.push(TopicChannel {
            filter: topic.to_string(),
            tx,
        });
        MqttSource {
            topic: topic.to_string(),
            client: self.client.clone(),
            rx,
        }
    }

    /// Spawn the event loop task
    ///
    /// Returns `None` if already started.
    pub fn start(&mut self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let event_loop = self.event_loop.take()?;
        let channels = std::mem::take(&mut self.channels);
        info!(topics = channels.len(), "starting MQTT event loop");
        Some(tokio::spawn(drive(event_loop, channels, cancel)))
    }

    /// Send DISCONNECT to the broker
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "MQTT disconnect request failed");
        }
    }
}

async fn drive(
    mut event_loop: EventLoop,
    channels: Vec<TopicChannel>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = event_loop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = RawMessage::new(publish.topic.clone(), publish.payload.clone());
                let mut delivered = false;
                for channel in channels
                    .iter()
                    .filter(|c| topic_matches(&c.filter, &publish.topic))
                {
                    delivered |= channel.tx.send(Ok(message.clone())).is_ok();
                }
                if !delivered {
                    trace!(topic = %publish.topic, "publish not routed");
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(code = ?ack.code, "connected to MQTT broker");
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                debug!(pkid = ack.pkid, "subscription acknowledged");
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "MQTT connection lost");
                for channel in &channels {
                    let _ = channel.tx.send(Err(ContractError::source_connection(
                        channel.filter.clone(),
                        e.to_string(),
                    )));
                }
                break;
            }
        }
    }
    debug!("MQTT event loop stopped");
}

/// MQTT topic-filter matching (`+` one level, `#` remaining levels)
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Receive side of one subscribed topic
pub struct MqttSource {
    topic: String,
    client: AsyncClient,
    rx: mpsc::UnboundedReceiver<SourceEvent>,
}

impl MessageSource for MqttSource {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn subscribe(&mut self) -> Result<(), ContractError> {
        self.client
            .subscribe(self.topic.clone(), QoS::AtLeastOnce)
            .await
            .map_err(|e| ContractError::source_connection(self.topic.clone(), e.to_string()))?;
        debug!(topic = %self.topic, "subscribe requested");
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<RawMessage>, ContractError> {
        match self.rx.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(e),
            None => {
                warn!(topic = %self.topic, "MQTT event loop ended");
                Ok(None)
            }
        }
    }
}
