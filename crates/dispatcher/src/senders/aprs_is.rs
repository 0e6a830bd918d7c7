//! AprsIsSender - TNC2 lines over an APRS-IS TCP connection

use std::time::Duration;

use contracts::{AprsConfig, ContractError, EncodedPacket, PacketSender};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Software name announced in the login line
const SOFTWARE_NAME: &str = "mqtt2aprs";

/// Configuration for AprsIsSender
#[derive(Debug, Clone)]
pub struct AprsIsSenderConfig {
    pub host: String,
    pub port: u16,
    /// Login callsign, including SSID
    pub callsign: String,
    pub passcode: i32,
    /// Bound on connect and on each write
    pub io_timeout: Duration,
}

impl AprsIsSenderConfig {
    /// Create config from the station section
    pub fn from_aprs(aprs: &AprsConfig, io_timeout: Duration) -> Self {
        Self {
            host: aprs.host.clone(),
            port: aprs.port,
            callsign: aprs.callsign_with_ssid(),
            passcode: aprs.password,
            io_timeout,
        }
    }

    /// Login line, CRLF terminated
    pub fn login_line(&self) -> String {
        format!(
            "user {} pass {} vers {} {}\r\n",
            self.callsign,
            self.passcode,
            SOFTWARE_NAME,
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// Sender that writes packets to an APRS-IS server
///
/// A failed write drops the connection; the next packet reconnects.
pub struct AprsIsSender {
    name: String,
    config: AprsIsSenderConfig,
    header: String,
    stream: Option<TcpStream>,
}

impl AprsIsSender {
    /// Create a new AprsIsSender; nothing is opened until `connect`
    pub fn new(name: impl Into<String>, config: AprsIsSenderConfig) -> Self {
        let header = encoder::aprs_is_header(&config.callsign);
        Self {
            name: name.into(),
            config,
            header,
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Full line written for one packet
    pub fn line(&self, packet: &EncodedPacket) -> String {
        format!("{}{}\r\n", self.header, packet)
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    async fn open(&self) -> Result<TcpStream, ContractError> {
        let addr = self.addr();
        let mut stream = timeout(self.config.io_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                ContractError::sender_connection(&self.name, format!("{addr}: timed out"))
            })?
            .map_err(|e| ContractError::sender_connection(&self.name, format!("{addr}: {e}")))?;

        let login = self.config.login_line();
        timeout(self.config.io_timeout, stream.write_all(login.as_bytes()))
            .await
            .map_err(|_| ContractError::sender_connection(&self.name, "login timed out"))?
            .map_err(|e| ContractError::sender_connection(&self.name, e.to_string()))?;

        info!(
            sender = %self.name,
            server = %addr,
            callsign = %self.config.callsign,
            "logged in to APRS-IS"
        );
        Ok(stream)
    }
}

impl PacketSender for AprsIsSender {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "aprs_is_sender_connect", skip(self), fields(sender = %self.name))]
    async fn connect(&mut self) -> Result<(), ContractError> {
        if self.stream.is_none() {
            self.stream = Some(self.open().await?);
        }
        Ok(())
    }

    #[instrument(name = "aprs_is_sender_send", skip(self, packet), fields(sender = %self.name))]
    async fn send(&mut self, packet: &EncodedPacket) -> Result<(), ContractError> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                debug!(sender = %self.name, "reconnecting");
                self.open().await?
            }
        };

        let line = self.line(packet);
        match timeout(self.config.io_timeout, stream.write_all(line.as_bytes())).await {
            Ok(Ok(())) => {
                self.stream = Some(stream);
                debug!(sender = %self.name, bytes = line.len(), "Sent");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(sender = %self.name, error = %e, "write failed, dropping connection");
                Err(ContractError::sender_write(&self.name, e.to_string()))
            }
            Err(_) => {
                warn!(sender = %self.name, "write timed out, dropping connection");
                Err(ContractError::sender_write(&self.name, "write timed out"))
            }
        }
    }

    #[instrument(name = "aprs_is_sender_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        debug!(sender = %self.name, "AprsIsSender closed");
        Ok(())
    }
}
