//! Topic router
//!
//! One router per configured topic: decode, extract, encode, enqueue.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{
    EncodedPacket, Location, MessageSource, OutputTarget, PacketOutlet, PayloadFormat, RawMessage,
    TopicRoute,
};
use encoder::WeatherEncoder;
use extractor::{ExpressionCache, ExtractError, FieldExtractor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::decode::decode_payload;
use crate::error::{MessageError, RouterError};
use crate::metrics::{RouterCounters, RouterMetrics};

/// Timestamp source for packet encoding
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall clock
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Router lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Idle,
    Subscribed,
    Listening,
    Cancelled,
    Faulted,
    Stopped,
}

/// How a router ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterOutcome {
    /// Source ended normally
    Completed,
    /// Stopped by cancellation
    Cancelled,
    /// Subscribe failure, connection loss or closed queue
    Faulted(String),
}

impl RouterOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

/// Final report of one router
#[derive(Debug, Clone)]
pub struct RouterReport {
    pub topic: String,
    pub target: OutputTarget,
    pub outcome: RouterOutcome,
    pub counters: RouterCounters,
}

/// Translation plan of one route
///
/// Immutable once built; the compiled expressions are shared with the
/// pipeline's expression cache.
#[derive(Clone)]
pub struct RoutePlan {
    pub topic: String,
    pub format: PayloadFormat,
    pub target: OutputTarget,
    pub extractor: Arc<FieldExtractor>,
    pub encoder: WeatherEncoder,
    pub default_location: Option<Location>,
    pub clock: Clock,
}

impl RoutePlan {
    /// Build a plan, compiling every path expression of the route
    pub fn build(
        route: &TopicRoute,
        cache: &mut ExpressionCache,
        encoder: WeatherEncoder,
        default_location: Option<Location>,
    ) -> Result<Self, ExtractError> {
        let extractor = FieldExtractor::for_route(route, cache)?;
        Ok(Self {
            topic: route.topic.clone(),
            format: route.input_type,
            target: route.target,
            extractor: Arc::new(extractor),
            encoder,
            default_location,
            clock: system_clock(),
        })
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Translate one payload into a packet
    pub fn translate(&self, payload: &[u8]) -> Result<EncodedPacket, MessageError> {
        let document = decode_payload(self.format, payload)?;
        let record = self.extractor.extract(&document)?;
        let position = record
            .position_or(self.default_location)
            .ok_or(MessageError::NoPosition)?;
        Ok(self.encoder.encode(&record, position, (self.clock)())?)
    }
}

impl fmt::Debug for RoutePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePlan")
            .field("topic", &self.topic)
            .field("format", &self.format)
            .field("target", &self.target)
            .field("fields", &self.extractor.field_count())
            .field("default_location", &self.default_location)
            .finish()
    }
}

/// Topic router
pub struct TopicRouter<M> {
    plan: RoutePlan,
    source: M,
    outlet: Arc<dyn PacketOutlet>,
    metrics: Arc<RouterMetrics>,
    state: RouterState,
}

impl<M: MessageSource> TopicRouter<M> {
    pub fn new(plan: RoutePlan, source: M, outlet: Arc<dyn PacketOutlet>) -> Self {
        Self {
            plan,
            source,
            outlet,
            metrics: Arc::new(RouterMetrics::new()),
            state: RouterState::Idle,
        }
    }

    pub fn topic(&self) -> &str {
        &self.plan.topic
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    /// Shared counters, readable while the router runs
    pub fn metrics(&self) -> Arc<RouterMetrics> {
        self.metrics.clone()
    }

    /// Subscribe and route messages until the source ends, faults, or
    /// `cancel` fires
    #[instrument(
        name = "router_run",
        skip_all,
        fields(topic = %self.plan.topic, output = %self.plan.target)
    )]
    pub async fn run(mut self, cancel: CancellationToken) -> RouterReport {
        let outcome = match self.listen(&cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(topic = %self.plan.topic, error = %e, "router faulted");
                self.transition(RouterState::Faulted);
                RouterOutcome::Faulted(e.to_string())
            }
        };
        self.transition(RouterState::Stopped);

        let counters = self.metrics.snapshot();
        info!(
            topic = %self.plan.topic,
            received = counters.received,
            published = counters.published,
            dropped = counters.dropped(),
            outcome = ?outcome,
            "router stopped"
        );

        RouterReport {
            topic: self.plan.topic,
            target: self.plan.target,
            outcome,
            counters,
        }
    }

    async fn listen(&mut self, cancel: &CancellationToken) -> Result<RouterOutcome, RouterError> {
        let subscribed = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.source.subscribe() => Some(result),
        };
        match subscribed {
            None => {
                self.transition(RouterState::Cancelled);
                return Ok(RouterOutcome::Cancelled);
            }
            Some(Err(source)) => {
                return Err(RouterError::Subscribe {
                    topic: self.plan.topic.clone(),
                    source,
                })
            }
            Some(Ok(())) => self.transition(RouterState::Subscribed),
        }

        self.transition(RouterState::Listening);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = self.source.recv() => Some(next),
            };

            match next {
                None => {
                    self.transition(RouterState::Cancelled);
                    return Ok(RouterOutcome::Cancelled);
                }
                Some(Ok(Some(message))) => self.handle(message)?,
                Some(Ok(None)) => {
                    debug!(topic = %self.plan.topic, "source ended");
                    return Ok(RouterOutcome::Completed);
                }
                Some(Err(source)) => {
                    return Err(RouterError::SourceLost {
                        topic: self.plan.topic.clone(),
                        source,
                    })
                }
            }
        }
    }

    fn handle(&self, message: RawMessage) -> Result<(), RouterError> {
        let topic = self.plan.topic.as_str();
        self.metrics.record_received();
        observability::record_message_received(topic);

        match self.plan.translate(&message.payload) {
            Ok(packet) => {
                debug!(topic, message_topic = %message.topic, packet = %packet, "packet encoded");
                self.outlet
                    .publish(packet)
                    .map_err(|_| RouterError::QueueClosed {
                        topic: topic.to_string(),
                    })?;
                self.metrics.record_published();
                observability::record_packet_enqueued(self.plan.target.as_str());
            }
            Err(err) => {
                let reason = err.reason();
                match &err {
                    MessageError::Extract(e) => warn!(
                        topic,
                        message_topic = %message.topic,
                        field = %e.field(),
                        path = %e.path(),
                        error = %e,
                        "dropping message"
                    ),
                    other => warn!(
                        topic,
                        message_topic = %message.topic,
                        reason,
                        error = %other,
                        "dropping message"
                    ),
                }
                self.metrics.record_dropped(reason);
                observability::record_message_dropped(topic, reason);
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: RouterState) {
        debug!(topic = %self.plan.topic, from = ?self.state, to = ?next, "router state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChannelSource;
    use chrono::TimeZone;
    use contracts::{ContractError, FieldPaths, PacketKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct VecOutlet {
        packets: Mutex<Vec<EncodedPacket>>,
        closed: bool,
    }

    impl VecOutlet {
        fn packets(&self) -> Vec<String> {
            self.packets
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect()
        }
    }

    impl PacketOutlet for VecOutlet {
        fn target(&self) -> OutputTarget {
            OutputTarget::Internet
        }

        fn publish(&self, packet: EncodedPacket) -> Result<(), ContractError> {
            if self.closed {
                return Err(ContractError::QueueClosed {
                    target: OutputTarget::Internet,
                });
            }
            self.packets.lock().unwrap().push(packet);
            Ok(())
        }
    }

    fn station_route() -> TopicRoute {
        TopicRoute {
            topic: "wx/station1".into(),
            input_type: PayloadFormat::Json,
            output_type: PacketKind::Weather,
            target: OutputTarget::Internet,
            fields: FieldPaths {
                wind_speed: Some("speed".into()),
                temperature_c: Some("temp".into()),
                ..Default::default()
            },
        }
    }

    fn plan(default_location: Option<Location>) -> RoutePlan {
        let fixed = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        RoutePlan::build(
            &station_route(),
            &mut ExpressionCache::new(),
            WeatherEncoder::new("M2A"),
            default_location,
        )
        .unwrap()
        .with_clock(Arc::new(move || fixed))
    }

    #[test]
    fn translate_station_payload() {
        let packet = plan(Some(Location::new(40.0, -105.0)))
            .translate(br#"{"speed": 12, "temp": 0}"#)
            .unwrap();
        assert_eq!(
            packet.as_str(),
            "@070905z4000.00N/10500.00W_.../012g...t032r...p...P...h..b.....wM2A"
        );
    }

    #[tokio::test]
    async fn malformed_payload_drops_one_message() {
        let (source, handle) = ChannelSource::new("wx/station1");
        let outlet = Arc::new(VecOutlet::default());
        let router = TopicRouter::new(
            plan(Some(Location::new(40.0, -105.0))),
            source,
            outlet.clone(),
        );

        handle.publish(r#"{"speed": 10, "temp": 20}"#);
        handle.publish("not json");
        handle.publish(r#"{"speed": 11, "temp": 21}"#);
        drop(handle);

        let report = router.run(CancellationToken::new()).await;
        assert_eq!(report.outcome, RouterOutcome::Completed);
        assert_eq!(report.counters.received, 3);
        assert_eq!(report.counters.published, 2);
        assert_eq!(report.counters.dropped_decode, 1);

        let packets = outlet.packets();
        assert_eq!(packets.len(), 2);
        assert!(packets[0].contains("/010g"));
        assert!(packets[1].contains("/011g"));
    }

    #[tokio::test]
    async fn missing_position_is_dropped() {
        let (source, handle) = ChannelSource::new("wx/station1");
        let outlet = Arc::new(VecOutlet::default());
        let router = TopicRouter::new(plan(None), source, outlet.clone());

        handle.publish(r#"{"speed": 10}"#);
        drop(handle);

        let report = router.run(CancellationToken::new()).await;
        assert_eq!(report.counters.dropped_position, 1);
        assert!(outlet.packets().is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_listening() {
        let (source, _handle) = ChannelSource::new("wx/station1");
        let router = TopicRouter::new(plan(None), source, Arc::new(VecOutlet::default()));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(router.run(cancel.clone()));
        cancel.cancel();
        let report = task.await.unwrap();
        assert_eq!(report.outcome, RouterOutcome::Cancelled);
    }

    #[tokio::test]
    async fn source_failure_faults_router() {
        let (source, handle) = ChannelSource::new("wx/station1");
        let router = TopicRouter::new(plan(None), source, Arc::new(VecOutlet::default()));

        handle.fail("broker went away");
        let report = router.run(CancellationToken::new()).await;
        assert!(report.outcome.is_fault());
    }

    #[tokio::test]
    async fn closed_queue_faults_router() {
        let (source, handle) = ChannelSource::new("wx/station1");
        let outlet = Arc::new(VecOutlet {
            closed: true,
            ..Default::default()
        });
        let router = TopicRouter::new(plan(Some(Location::new(1.0, 1.0))), source, outlet);

        handle.publish(r#"{"speed": 1}"#);
        let report = router.run(CancellationToken::new()).await;
        assert!(report.outcome.is_fault());
        assert_eq!(report.counters.published, 0);
    }
}
