//! LogSender - logs packets via tracing instead of transmitting them

use contracts::{ContractError, EncodedPacket, PacketSender};
use tracing::{info, instrument};

/// Sender that only logs, used for `--print-only` runs and tests
pub struct LogSender {
    name: String,
    header: Option<String>,
    sent: u64,
}

impl LogSender {
    /// Create a new LogSender with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: None,
            sent: 0,
        }
    }

    /// Prefix logged packets with a TNC2 header (e.g. `N0CALL>APRS,TCPIP*:`)
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Packets logged so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    fn line(&self, packet: &EncodedPacket) -> String {
        match &self.header {
            Some(header) => format!("{header}{packet}"),
            None => packet.to_string(),
        }
    }
}

impl PacketSender for LogSender {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sender_connect", skip(self))]
    async fn connect(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sender_send", skip(self, packet), fields(sender = %self.name))]
    async fn send(&mut self, packet: &EncodedPacket) -> Result<(), ContractError> {
        self.sent += 1;
        info!(sender = %self.name, packet = %self.line(packet), "packet");
        Ok(())
    }

    #[instrument(name = "log_sender_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sender = %self.name, sent = self.sent, "LogSender closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_logged_packets() {
        let mut sender = LogSender::new("print").with_header("N0CALL>APRS,TCPIP*:");
        sender.connect().await.unwrap();
        sender.send(&EncodedPacket::new("@070905z")).await.unwrap();
        assert_eq!(sender.sent(), 1);
        assert_eq!(
            sender.line(&EncodedPacket::new("x")),
            "N0CALL>APRS,TCPIP*:x"
        );
        sender.close().await.unwrap();
    }

    #[test]
    fn test_log_sender_name() {
        let sender = LogSender::new("my_logger");
        assert_eq!(sender.name(), "my_logger");
    }
}
