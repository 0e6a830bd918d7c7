//! PacketSender trait - Dispatcher output interface
//!
//! Defines the abstract interface for transport senders.

use crate::{ContractError, EncodedPacket};

/// Packet output trait
///
/// All transport implementations must implement this trait. A sender is owned
/// by exactly one dispatcher and is never shared.
#[trait_variant::make(PacketSender: Send)]
pub trait LocalPacketSender {
    /// Sender name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Establish the connection (called once before the dispatcher starts)
    async fn connect(&mut self) -> Result<(), ContractError>;

    /// Transmit one packet
    ///
    /// Must not block indefinitely.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn send(&mut self, packet: &EncodedPacket) -> Result<(), ContractError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), ContractError>;
}
