//! Pipeline supervisor
//!
//! Owns every queue, router and dispatcher of one run. Routers and
//! dispatchers use separate cancellation tokens: external shutdown only stops
//! the routers, dispatchers are cancelled after the queues drain.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{MessageSource, OutputTarget, PacketOutlet, PacketSender, PipelineSettings};
use dispatcher::{output_queue, DispatcherReport, OutputDispatcher, OutputQueue};
use ingestion::{RoutePlan, RouterReport, TopicRouter};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::SupervisorError;
use crate::report::PipelineReport;

type Task<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Supervisor tuning
#[derive(Debug, Clone, Copy)]
pub struct SupervisorSettings {
    /// Upper bound on the wait for queues to drain
    pub drain_timeout: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self::from(&PipelineSettings::default())
    }
}

impl From<&PipelineSettings> for SupervisorSettings {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            drain_timeout: settings.drain_timeout(),
        }
    }
}

struct Output {
    queue: OutputQueue,
    dispatcher: Task<DispatcherReport>,
}

/// Assembles and runs one pipeline
pub struct Supervisor {
    settings: SupervisorSettings,
    router_cancel: CancellationToken,
    dispatcher_cancel: CancellationToken,
    outputs: BTreeMap<OutputTarget, Output>,
    routers: Vec<Task<RouterReport>>,
    topics: HashSet<String>,
}

impl Supervisor {
    pub fn new(settings: SupervisorSettings) -> Self {
        Self {
            settings,
            router_cancel: CancellationToken::new(),
            dispatcher_cancel: CancellationToken::new(),
            outputs: BTreeMap::new(),
            routers: Vec::new(),
            topics: HashSet::new(),
        }
    }

    /// Token that stops every router (external shutdown)
    ///
    /// Queues still drain and dispatchers still stop in order after it fires.
    pub fn cancel_token(&self) -> CancellationToken {
        self.router_cancel.clone()
    }

    /// Create the queue and dispatcher of one target
    ///
    /// Returns a producer handle onto the new queue. Producers outside the
    /// configured routes may publish through it and end the output early with
    /// [`OutputQueue::terminate`]; otherwise the dispatcher is cancelled once
    /// the queue drains.
    pub fn add_output<S>(
        &mut self,
        target: OutputTarget,
        sender: S,
    ) -> Result<OutputQueue, SupervisorError>
    where
        S: PacketSender + 'static,
    {
        if self.outputs.contains_key(&target) {
            return Err(SupervisorError::DuplicateOutput { target });
        }

        let (queue, receiver) = output_queue(target);
        let dispatcher = OutputDispatcher::new(receiver, sender);
        let task: Task<DispatcherReport> =
            Box::pin(dispatcher.run(self.dispatcher_cancel.clone()));
        self.outputs.insert(
            target,
            Output {
                queue: queue.clone(),
                dispatcher: task,
            },
        );
        Ok(queue)
    }

    /// Bind a router for `plan` to its target's queue
    pub fn add_route<M>(&mut self, plan: RoutePlan, source: M) -> Result<(), SupervisorError>
    where
        M: MessageSource + 'static,
    {
        let output = self
            .outputs
            .get(&plan.target)
            .ok_or_else(|| SupervisorError::NoOutput {
                topic: plan.topic.clone(),
                target: plan.target,
            })?;
        if !self.topics.insert(plan.topic.clone()) {
            return Err(SupervisorError::DuplicateRoute { topic: plan.topic });
        }

        let outlet: Arc<dyn PacketOutlet> = Arc::new(output.queue.clone());
        let router = TopicRouter::new(plan, source, outlet);
        self.routers
            .push(Box::pin(router.run(self.router_cancel.clone())));
        Ok(())
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn route_count(&self) -> usize {
        self.routers.len()
    }

    /// Run until every router has stopped, then drain and stop the outputs
    #[instrument(
        name = "supervisor_run",
        skip_all,
        fields(outputs = self.outputs.len(), routes = self.routers.len())
    )]
    pub async fn run(self) -> PipelineReport {
        let started = Instant::now();
        let Supervisor {
            settings,
            router_cancel,
            dispatcher_cancel,
            outputs,
            routers,
            ..
        } = self;

        let mut queues = Vec::with_capacity(outputs.len());
        let mut dispatchers = JoinSet::new();
        for (target, output) in outputs {
            info!(output = %target, "starting dispatcher");
            queues.push(output.queue);
            dispatchers.spawn(output.dispatcher);
        }

        let mut router_set = JoinSet::new();
        for router in routers {
            router_set.spawn(router);
        }
        info!(routers = router_set.len(), "pipeline running");

        let mut router_reports = Vec::new();
        let mut task_failures = 0usize;
        while let Some(joined) = router_set.join_next().await {
            match joined {
                Ok(report) => {
                    if let ingestion::RouterOutcome::Faulted(reason) = &report.outcome {
                        warn!(topic = %report.topic, reason = %reason, "router faulted");
                    }
                    router_reports.push(report);
                }
                Err(e) => {
                    error!(error = %e, "router task failed");
                    task_failures += 1;
                }
            }
        }
        info!("all routers stopped, draining output queues");

        let drain = async {
            for queue in &queues {
                queue.join().await;
            }
        };
        let drained = tokio::time::timeout(settings.drain_timeout, drain)
            .await
            .is_ok();
        if !drained {
            let pending: usize = queues.iter().map(OutputQueue::pending).sum();
            warn!(
                timeout_secs = settings.drain_timeout.as_secs(),
                pending,
                "output queues did not drain in time, stopping anyway"
            );
        }

        dispatcher_cancel.cancel();
        let mut dispatcher_reports = Vec::new();
        while let Some(joined) = dispatchers.join_next().await {
            match joined {
                Ok(report) => dispatcher_reports.push(report),
                Err(e) => {
                    error!(error = %e, "dispatcher task failed");
                    task_failures += 1;
                }
            }
        }

        router_reports.sort_by(|a, b| a.topic.cmp(&b.topic));
        dispatcher_reports.sort_by_key(|r| r.target);

        let report = PipelineReport {
            routers: router_reports,
            dispatchers: dispatcher_reports,
            drained,
            interrupted: router_cancel.is_cancelled(),
            task_failures,
            duration: started.elapsed(),
        };
        info!(
            duration_secs = report.duration.as_secs_f64(),
            published = report.packets_published(),
            sent = report.packets_sent(),
            faults = report.fault_count(),
            "pipeline stopped"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::{
        ContractError, EncodedPacket, FieldPaths, Location, PacketKind, PayloadFormat,
        TopicRoute,
    };
    use dispatcher::DispatcherOutcome;
    use encoder::WeatherEncoder;
    use extractor::ExpressionCache;
    use ingestion::{ChannelSource, RouterOutcome};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSender {
        sent: Arc<Mutex<Vec<String>>>,
        delay_ms: u64,
    }

    impl PacketSender for RecordingSender {
        fn name(&self) -> &str {
            "recording"
        }

        async fn connect(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn send(&mut self, packet: &EncodedPacket) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            self.sent.lock().unwrap().push(packet.to_string());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn plan(topic: &str, target: OutputTarget) -> RoutePlan {
        let route = TopicRoute {
            topic: topic.to_string(),
            input_type: PayloadFormat::Json,
            output_type: PacketKind::Weather,
            target,
            fields: FieldPaths {
                wind_speed: Some("speed".into()),
                ..Default::default()
            },
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        RoutePlan::build(
            &route,
            &mut ExpressionCache::new(),
            WeatherEncoder::new("M2A"),
            Some(Location::new(40.0, -105.0)),
        )
        .unwrap()
        .with_clock(Arc::new(move || at))
    }

    #[tokio::test]
    async fn two_routers_share_one_queue() {
        let sender = RecordingSender::default();
        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        supervisor
            .add_output(OutputTarget::Internet, sender.clone())
            .unwrap();

        let (source_a, handle_a) = ChannelSource::new("wx/a");
        let (source_b, handle_b) = ChannelSource::new("wx/b");
        supervisor
            .add_route(plan("wx/a", OutputTarget::Internet), source_a)
            .unwrap();
        supervisor
            .add_route(plan("wx/b", OutputTarget::Internet), source_b)
            .unwrap();

        handle_a.publish(r#"{"speed": 5}"#);
        handle_b.publish(r#"{"speed": 7}"#);
        drop(handle_a);
        drop(handle_b);

        let report = supervisor.run().await;
        assert!(report.drained);
        assert!(!report.interrupted);
        assert_eq!(report.routers.len(), 2);
        assert!(report
            .routers
            .iter()
            .all(|r| r.outcome == RouterOutcome::Completed));
        assert_eq!(report.dispatchers.len(), 1);
        assert_eq!(report.dispatchers[0].outcome, DispatcherOutcome::Cancelled);
        assert_eq!(report.dispatchers[0].counters.sent, 2);

        let mut sent = sender.sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("_.../005g"));
        assert!(sent[1].contains("_.../007g"));
    }

    #[tokio::test]
    async fn route_without_output_is_rejected() {
        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        supervisor
            .add_output(OutputTarget::Internet, RecordingSender::default())
            .unwrap();
        let (source, _handle) = ChannelSource::new("wx/a");
        let err = supervisor
            .add_route(plan("wx/a", OutputTarget::Kiss), source)
            .unwrap_err();
        assert!(matches!(err, SupervisorError::NoOutput { .. }));
    }

    #[tokio::test]
    async fn duplicate_output_and_route_are_rejected() {
        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        supervisor
            .add_output(OutputTarget::Kiss, RecordingSender::default())
            .unwrap();
        assert!(matches!(
            supervisor.add_output(OutputTarget::Kiss, RecordingSender::default()),
            Err(SupervisorError::DuplicateOutput { .. })
        ));

        let (first, _h1) = ChannelSource::new("wx/a");
        let (second, _h2) = ChannelSource::new("wx/a");
        supervisor
            .add_route(plan("wx/a", OutputTarget::Kiss), first)
            .unwrap();
        assert!(matches!(
            supervisor.add_route(plan("wx/a", OutputTarget::Kiss), second),
            Err(SupervisorError::DuplicateRoute { .. })
        ));
    }

    #[tokio::test]
    async fn output_handle_feeds_and_terminates() {
        use contracts::PacketOutlet;

        let sender = RecordingSender::default();
        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        let queue = supervisor
            .add_output(OutputTarget::Internet, sender.clone())
            .unwrap();

        queue.publish(EncodedPacket::new("one")).unwrap();
        queue.publish(EncodedPacket::new("two")).unwrap();
        assert!(queue.terminate());

        let report = supervisor.run().await;
        assert!(report.drained);
        assert!(report.is_clean());
        assert_eq!(report.dispatchers[0].counters.sent, 2);
        assert_eq!(report.dispatchers[0].counters.discarded, 0);
        assert_eq!(*sender.sent.lock().unwrap(), vec!["one", "two"]);
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn fault_does_not_stop_siblings() {
        let sender = RecordingSender::default();
        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        supervisor
            .add_output(OutputTarget::Internet, sender.clone())
            .unwrap();

        let (healthy, healthy_handle) = ChannelSource::new("wx/a");
        let (broken, broken_handle) = ChannelSource::new("wx/b");
        supervisor
            .add_route(plan("wx/a", OutputTarget::Internet), healthy)
            .unwrap();
        supervisor
            .add_route(plan("wx/b", OutputTarget::Internet), broken)
            .unwrap();

        broken_handle.fail("broker went away");
        healthy_handle.publish(r#"{"speed": 3}"#);
        drop(healthy_handle);

        let report = supervisor.run().await;
        assert_eq!(report.fault_count(), 1);
        assert_eq!(report.routers[0].outcome, RouterOutcome::Completed);
        assert!(report.routers[1].outcome.is_fault());
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn external_shutdown_still_drains() {
        let sender = RecordingSender {
            delay_ms: 10,
            ..Default::default()
        };
        let mut supervisor = Supervisor::new(SupervisorSettings::default());
        supervisor
            .add_output(OutputTarget::Internet, sender.clone())
            .unwrap();
        let (source, handle) = ChannelSource::new("wx/a");
        supervisor
            .add_route(plan("wx/a", OutputTarget::Internet), source)
            .unwrap();

        let cancel = supervisor.cancel_token();
        let run = tokio::spawn(supervisor.run());
        for speed in 0..3 {
            handle.publish(format!(r#"{{"speed": {speed}}}"#));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let report = run.await.unwrap();
        assert!(report.interrupted);
        assert!(report.drained);
        assert_eq!(report.routers[0].outcome, RouterOutcome::Cancelled);
        assert_eq!(report.routers[0].counters.published, 3);
        assert_eq!(sender.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn drain_timeout_is_bounded() {
        let sender = RecordingSender {
            delay_ms: 500,
            ..Default::default()
        };
        let mut supervisor = Supervisor::new(SupervisorSettings {
            drain_timeout: Duration::from_millis(50),
        });
        supervisor
            .add_output(OutputTarget::Internet, sender)
            .unwrap();
        let (source, handle) = ChannelSource::new("wx/a");
        supervisor
            .add_route(plan("wx/a", OutputTarget::Internet), source)
            .unwrap();

        for speed in 0..3 {
            handle.publish(format!(r#"{{"speed": {speed}}}"#));
        }
        drop(handle);

        let report = supervisor.run().await;
        assert!(!report.drained);
        let counters = report.dispatchers[0].counters;
        assert_eq!(counters.sent, 1);
        assert_eq!(counters.discarded, 2);
    }
}
