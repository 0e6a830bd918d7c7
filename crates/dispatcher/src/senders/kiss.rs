//! KissSender - AX.25 UI frames in KISS framing, to a serial TNC or a TCP KISS port

use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use contracts::{AprsConfig, ContractError, EncodedPacket, KissConfig, PacketSender};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;

/// KISS frame delimiter
pub const FEND: u8 = 0xC0;
/// KISS escape
pub const FESC: u8 = 0xDB;
/// Escaped FEND
pub const TFEND: u8 = 0xDC;
/// Escaped FESC
pub const TFESC: u8 = 0xDD;

/// Data frame on TNC port 0
const KISS_DATA_PORT0: u8 = 0x00;
/// AX.25 UI frame control field
const AX25_CONTROL_UI: u8 = 0x03;
/// AX.25 "no layer 3" protocol id
const AX25_PID_NO_L3: u8 = 0xF0;

/// One AX.25 address field (callsign + SSID)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Address {
    callsign: String,
    ssid: u8,
}

impl Ax25Address {
    /// Parse `CALL` or `CALL-N`
    pub fn parse(text: &str) -> Result<Self, DispatcherError> {
        let (call, ssid) = match text.split_once('-') {
            Some((call, ssid)) => {
                let ssid: u8 = ssid
                    .parse()
                    .map_err(|_| DispatcherError::invalid_address(text, "SSID is not a number"))?;
                (call, ssid)
            }
            None => (text, 0),
        };

        if call.is_empty() || call.len() > 6 {
            return Err(DispatcherError::invalid_address(
                text,
                "callsign must be 1-6 characters",
            ));
        }
        if !call.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DispatcherError::invalid_address(
                text,
                "callsign must be alphanumeric",
            ));
        }
        if ssid > 15 {
            return Err(DispatcherError::invalid_address(text, "SSID must be 0-15"));
        }

        Ok(Self {
            callsign: call.to_ascii_uppercase(),
            ssid,
        })
    }

    /// Seven encoded bytes; `command` sets the C bit, `last` the extension bit
    fn encode(&self, command: bool, last: bool, out: &mut Vec<u8>) {
        let mut call = [b' '; 6];
        for (slot, byte) in call.iter_mut().zip(self.callsign.bytes()) {
            *slot = byte;
        }
        out.extend(call.iter().map(|b| b << 1));

        let mut ssid = 0x60 | (self.ssid << 1);
        if command {
            ssid |= 0x80;
        }
        if last {
            ssid |= 0x01;
        }
        out.push(ssid);
    }
}

/// Build an AX.25 UI frame carrying `info`
pub fn ax25_ui_frame(
    destination: &Ax25Address,
    source: &Ax25Address,
    digipeaters: &[Ax25Address],
    info: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(16 + 7 * digipeaters.len() + info.len());
    destination.encode(true, false, &mut frame);
    source.encode(false, digipeaters.is_empty(), &mut frame);
    for (idx, digi) in digipeaters.iter().enumerate() {
        digi.encode(false, idx + 1 == digipeaters.len(), &mut frame);
    }
    frame.push(AX25_CONTROL_UI);
    frame.push(AX25_PID_NO_L3);
    frame.extend_from_slice(info);
    frame
}

/// Wrap a frame for the TNC: FEND, command byte, escaped data, FEND
pub fn kiss_encode(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + 4);
    out.push(FEND);
    out.push(KISS_DATA_PORT0);
    for &byte in frame {
        match byte {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            other => out.push(other),
        }
    }
    out.push(FEND);
    out
}

/// Where the TNC lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KissPath {
    /// `tcp://host:port`
    Tcp(String),
    /// Serial device (or any writable file)
    Device(PathBuf),
}

impl KissPath {
    pub fn parse(path: &str) -> Self {
        match path.strip_prefix("tcp://") {
            Some(addr) => Self::Tcp(addr.to_string()),
            None => Self::Device(PathBuf::from(path)),
        }
    }
}

/// Configuration for KissSender
#[derive(Debug, Clone)]
pub struct KissSenderConfig {
    pub path: KissPath,
    pub source: Ax25Address,
    pub digipeaters: Vec<Ax25Address>,
    /// Bound on open and on each write
    pub io_timeout: Duration,
}

impl KissSenderConfig {
    /// Create config from the `kiss` and station sections
    pub fn from_config(
        kiss: &KissConfig,
        aprs: &AprsConfig,
        io_timeout: Duration,
    ) -> Result<Self, DispatcherError> {
        let path = kiss
            .path()
            .ok_or_else(|| DispatcherError::sender_creation("kiss", "kiss.path is not set"))?;
        let digipeaters = kiss
            .digipeaters
            .iter()
            .map(|d| Ax25Address::parse(d))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path: KissPath::parse(path),
            source: Ax25Address::parse(&aprs.callsign_with_ssid())?,
            digipeaters,
            io_timeout,
        })
    }
}

type Transport = Pin<Box<dyn AsyncWrite + Send + Sync>>;

/// Sender that writes KISS frames to a TNC
pub struct KissSender {
    name: String,
    config: KissSenderConfig,
    destination: Ax25Address,
    transport: Option<Transport>,
}

impl KissSender {
    /// Create a new KissSender; nothing is opened until `connect`
    pub fn new(name: impl Into<String>, config: KissSenderConfig) -> Self {
        Self {
            name: name.into(),
            config,
            destination: Ax25Address {
                callsign: encoder::TOCALL.to_string(),
                ssid: 0,
            },
            transport: None,
        }
    }

    /// Bytes written for one packet
    pub fn frame(&self, packet: &EncodedPacket) -> Vec<u8> {
        let frame = ax25_ui_frame(
            &self.destination,
            &self.config.source,
            &self.config.digipeaters,
            packet.as_bytes(),
        );
        kiss_encode(&frame)
    }

    async fn open(&self) -> Result<Transport, ContractError> {
        let opening = async {
            let transport: Transport = match &self.config.path {
                KissPath::Tcp(addr) => Box::pin(TcpStream::connect(addr).await?),
                KissPath::Device(path) => Box::pin(
                    tokio::fs::OpenOptions::new()
                        .write(true)
                        .append(true)
                        .open(path)
                        .await?,
                ),
            };
            Ok::<_, std::io::Error>(transport)
        };

        let transport = timeout(self.config.io_timeout, opening)
            .await
            .map_err(|_| ContractError::sender_connection(&self.name, "open timed out"))?
            .map_err(|e| {
                ContractError::sender_connection(&self.name, format!("{:?}: {e}", self.config.path))
            })?;
        info!(sender = %self.name, path = ?self.config.path, "KISS TNC opened");
        Ok(transport)
    }
}

impl PacketSender for KissSender {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "kiss_sender_connect", skip(self), fields(sender = %self.name))]
    async fn connect(&mut self) -> Result<(), ContractError> {
        if self.transport.is_none() {
            self.transport = Some(self.open().await?);
        }
        Ok(())
    }

    #[instrument(name = "kiss_sender_send", skip(self, packet), fields(sender = %self.name))]
    async fn send(&mut self, packet: &EncodedPacket) -> Result<(), ContractError> {
        let mut transport = match self.transport.take() {
            Some(transport) => transport,
            None => self.open().await?,
        };

        let bytes = self.frame(packet);
        let write = async {
            transport.write_all(&bytes).await?;
            transport.flush().await
        };
        match timeout(self.config.io_timeout, write).await {
            Ok(Ok(())) => {
                self.transport = Some(transport);
                debug!(sender = %self.name, bytes = bytes.len(), "Sent");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(sender = %self.name, error = %e, "write failed, reopening on next packet");
                Err(ContractError::sender_write(&self.name, e.to_string()))
            }
            Err(_) => {
                warn!(sender = %self.name, "write timed out, reopening on next packet");
                Err(ContractError::sender_write(&self.name, "write timed out"))
            }
        }
    }

    #[instrument(name = "kiss_sender_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut transport) = self.transport.take() {
            let _ = transport.shutdown().await;
        }
        debug!(sender = %self.name, "KissSender closed");
        Ok(())
    }
}
