//! MessageSource trait - topic channel abstraction
//!
//! Decouples topic routers from the concrete broker client, so the MQTT
//! connection and in-memory / replay sources are driven the same way.

use crate::{ContractError, RawMessage};

/// Receive side of one subscribed topic
///
/// # Contract
///
/// - `subscribe` is called exactly once, before the first `recv`
/// - `recv` yields messages in the order they were received
/// - `Ok(None)` means the source ended normally (no more messages will arrive)
/// - `Err(_)` means the underlying connection was lost; it is not retried
#[trait_variant::make(MessageSource: Send)]
pub trait LocalMessageSource {
    /// Topic (or topic filter) this source is bound to
    fn topic(&self) -> &str;

    /// Subscribe to the topic
    async fn subscribe(&mut self) -> Result<(), ContractError>;

    /// Wait for the next message
    async fn recv(&mut self) -> Result<Option<RawMessage>, ContractError>;
}
