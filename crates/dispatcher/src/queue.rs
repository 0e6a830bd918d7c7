//! Output queue - unbounded FIFO between topic routers and one dispatcher
//!
//! Producers publish through [`OutputQueue`] (cloneable, one per router);
//! the single consumer owns the [`QueueReceiver`]. A pending counter tracks
//! packets that have not yet been handed to the sender, so the supervisor can
//! wait for the queue to drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::{ContractError, EncodedPacket, OutputTarget, PacketOutlet};
use tokio::sync::Notify;
use tracing::debug;

/// Queue entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    /// A packet for the sender
    Packet(EncodedPacket),
    /// Stop after everything queued before it
    Terminate,
}

#[derive(Debug, Default)]
struct Pending {
    count: AtomicUsize,
    drained: Notify,
}

impl Pending {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn done(&self, n: usize) {
        if n == 0 {
            return;
        }
        if self.count.fetch_sub(n, Ordering::AcqRel) == n {
            self.drained.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

/// Create the queue of one output target
pub fn output_queue(target: OutputTarget) -> (OutputQueue, QueueReceiver) {
    let (tx, rx) = async_channel::unbounded();
    let pending = Arc::new(Pending::default());
    (
        OutputQueue {
            target,
            tx,
            pending: Arc::clone(&pending),
        },
        QueueReceiver {
            target,
            rx,
            pending,
        },
    )
}

/// Producer side
#[derive(Debug, Clone)]
pub struct OutputQueue {
    target: OutputTarget,
    tx: async_channel::Sender<QueueItem>,
    pending: Arc<Pending>,
}

impl OutputQueue {
    /// Packets enqueued but not yet handed to the sender
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Whether the consumer has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Append the termination marker
    ///
    /// The dispatcher stops after handing off everything queued before the
    /// marker. The supervisor itself stops dispatchers by cancellation after
    /// the drain; this is for producers holding the handle returned by
    /// `Supervisor::add_output`. Returns false if the consumer is already gone.
    pub fn terminate(&self) -> bool {
        self.tx.try_send(QueueItem::Terminate).is_ok()
    }

    /// Wait until every published packet has been handed off or discarded
    pub async fn join(&self) {
        loop {
            let notified = self.pending.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl PacketOutlet for OutputQueue {
    fn target(&self) -> OutputTarget {
        self.target
    }

    fn publish(&self, packet: EncodedPacket) -> Result<(), ContractError> {
        self.pending.add();
        if self.tx.try_send(QueueItem::Packet(packet)).is_err() {
            self.pending.done(1);
            return Err(ContractError::QueueClosed {
                target: self.target,
            });
        }
        observability::record_queue_depth(self.target.as_str(), self.pending.get());
        Ok(())
    }
}

/// Consumer side, owned by exactly one dispatcher
#[derive(Debug)]
pub struct QueueReceiver {
    target: OutputTarget,
    rx: async_channel::Receiver<QueueItem>,
    pending: Arc<Pending>,
}

impl QueueReceiver {
    pub fn target(&self) -> OutputTarget {
        self.target
    }

    /// Next item; `None` once every producer is gone and the queue is empty
    pub async fn recv(&self) -> Option<QueueItem> {
        self.rx.recv().await.ok()
    }

    /// Mark one received packet as handed off
    pub fn task_done(&self) {
        self.pending.done(1);
        observability::record_queue_depth(self.target.as_str(), self.pending.get());
    }

    /// Items currently buffered
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Close the queue and drop everything still buffered
    ///
    /// Returns the number of packets discarded. Later publishes fail with
    /// `QueueClosed`.
    pub fn close_and_discard(&self) -> u64 {
        self.rx.close();
        let mut discarded = 0;
        while let Ok(item) = self.rx.try_recv() {
            if let QueueItem::Packet(_) = item {
                discarded += 1;
            }
        }
        self.pending.done(discarded);
        if discarded > 0 {
            debug!(output = %self.target, discarded, "queued packets discarded");
        }
        observability::record_queue_depth(self.target.as_str(), self.pending.get());
        discarded as u64
    }
}
