//! Output dispatcher - single consumer of one target's queue

use std::sync::Arc;
use std::time::Instant;

use contracts::{ContractError, EncodedPacket, OutputTarget, PacketSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::{DispatcherCounters, DispatcherMetrics};
use crate::queue::{QueueItem, QueueReceiver};

/// Dispatcher lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Draining,
    Cancelled,
    Faulted,
    Stopped,
}

/// How a dispatcher ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatcherOutcome {
    /// Termination marker received or every producer gone
    Completed,
    /// Stopped by cancellation
    Cancelled,
    /// Sender failed with a non-connection error before draining
    Faulted(String),
}

impl DispatcherOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

/// Final report of one dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherReport {
    pub target: OutputTarget,
    pub sender: String,
    pub outcome: DispatcherOutcome,
    pub counters: DispatcherCounters,
}

/// Takes packets off one queue and hands them to one sender, in order
pub struct OutputDispatcher<S> {
    receiver: QueueReceiver,
    sender: S,
    metrics: Arc<DispatcherMetrics>,
    state: DispatcherState,
}

impl<S: PacketSender + 'static> OutputDispatcher<S> {
    /// Create a dispatcher owning `sender`
    pub fn new(receiver: QueueReceiver, sender: S) -> Self {
        Self {
            receiver,
            sender,
            metrics: Arc::new(DispatcherMetrics::new()),
            state: DispatcherState::Idle,
        }
    }

    pub fn target(&self) -> OutputTarget {
        self.receiver.target()
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Shared counters, readable while the dispatcher runs
    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.metrics
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<DispatcherReport> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until terminated or cancelled
    ///
    /// A connection failure at startup is not fatal: packets are still handed
    /// to the sender, which reconnects per packet. Any other `connect` error
    /// faults the dispatcher and closes its queue. The sender is closed before
    /// returning.
    #[instrument(
        name = "dispatcher_run",
        skip_all,
        fields(output = %self.receiver.target(), sender = %self.sender.name())
    )]
    pub async fn run(mut self, cancel: CancellationToken) -> DispatcherReport {
        let outcome = match self.sender.connect().await {
            Ok(()) => {
                self.transition(DispatcherState::Draining);
                self.drain(&cancel).await
            }
            // Senders reconnect on the next packet
            Err(e @ ContractError::SenderConnection { .. }) => {
                warn!(error = %e, "sender not connected, retrying on each packet");
                self.transition(DispatcherState::Draining);
                self.drain(&cancel).await
            }
            Err(e) => {
                error!(error = %e, "sender cannot be used");
                self.transition(DispatcherState::Faulted);
                self.discard_remaining();
                DispatcherOutcome::Faulted(e.to_string())
            }
        };

        if let Err(e) = self.sender.close().await {
            warn!(error = %e, "sender close failed");
        }
        self.transition(DispatcherState::Stopped);

        let counters = self.metrics.snapshot();
        info!(
            sent = counters.sent,
            failed = counters.failed,
            discarded = counters.discarded,
            outcome = ?outcome,
            "dispatcher stopped"
        );

        DispatcherReport {
            target: self.receiver.target(),
            sender: self.sender.name().to_string(),
            outcome,
            counters,
        }
    }

    async fn drain(&mut self, cancel: &CancellationToken) -> DispatcherOutcome {
        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = self.receiver.recv() => Some(item),
            };

            match item {
                None => {
                    self.transition(DispatcherState::Cancelled);
                    self.discard_remaining();
                    return DispatcherOutcome::Cancelled;
                }
                Some(Some(QueueItem::Packet(packet))) => {
                    self.deliver(&packet).await;
                    self.receiver.task_done();
                }
                Some(Some(QueueItem::Terminate)) | Some(None) => {
                    debug!("queue terminated");
                    self.discard_remaining();
                    return DispatcherOutcome::Completed;
                }
            }
        }
    }

    async fn deliver(&mut self, packet: &EncodedPacket) {
        let output = self.receiver.target().as_str();
        let started = Instant::now();

        match self.sender.send(packet).await {
            Ok(()) => {
                self.metrics.inc_sent();
                observability::record_packet_sent(output, "success");
                observability::record_send_latency_ms(
                    output,
                    started.elapsed().as_secs_f64() * 1000.0,
                );
            }
            Err(e) => {
                self.metrics.inc_failed();
                observability::record_packet_sent(output, "failure");
                error!(output, error = %e, packet = %packet, "send failed, packet discarded");
            }
        }
    }

    fn discard_remaining(&self) {
        let discarded = self.receiver.close_and_discard();
        if discarded > 0 {
            self.metrics.add_discarded(discarded);
            for _ in 0..discarded {
                observability::record_packet_sent(self.receiver.target().as_str(), "discarded");
            }
            warn!(discarded, "queued packets discarded");
        }
    }

    fn transition(&mut self, next: DispatcherState) {
        debug!(from = ?self.state, to = ?next, "dispatcher state");
        self.state = next;
    }
}
