//! PacketOutlet trait - producer side of an output queue
//!
//! Topic routers publish through this seam; the dispatcher crate provides the
//! queue behind it.

use crate::{ContractError, EncodedPacket, OutputTarget};

/// Producer handle onto one target's output queue
///
/// Publishing never blocks: queues are unbounded.
pub trait PacketOutlet: Send + Sync {
    /// Target the queue feeds
    fn target(&self) -> OutputTarget;

    /// Append a packet to the queue
    ///
    /// # Errors
    /// `ContractError::QueueClosed` once the consumer is gone
    fn publish(&self, packet: EncodedPacket) -> Result<(), ContractError>;
}
