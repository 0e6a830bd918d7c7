//! Sender implementations
//!
//! Contains AprsIsSender, KissSender, and LogSender.

mod aprs_is;
mod kiss;
mod log;

use std::time::Duration;

use contracts::{BridgeConfig, ContractError, EncodedPacket, OutputTarget, PacketSender};

pub use self::aprs_is::{AprsIsSender, AprsIsSenderConfig};
pub use self::kiss::{
    ax25_ui_frame, kiss_encode, Ax25Address, KissPath, KissSender, KissSenderConfig, FEND, FESC,
    TFEND, TFESC,
};
pub use self::log::LogSender;

use crate::error::DispatcherError;

/// Sender selected from configuration
pub enum ConfiguredSender {
    AprsIs(AprsIsSender),
    Kiss(KissSender),
    Log(LogSender),
}

impl ConfiguredSender {
    /// Build the sender for one target
    ///
    /// `print_only` replaces the real transport with a [`LogSender`].
    pub fn from_config(
        target: OutputTarget,
        config: &BridgeConfig,
        print_only: bool,
    ) -> Result<Self, DispatcherError> {
        let name = target.as_str();
        let aprs = config.aprs.as_ref().ok_or_else(|| {
            DispatcherError::sender_creation(name, "the [aprs] section is required")
        })?;

        if print_only {
            let sender = match target {
                OutputTarget::Internet => {
                    LogSender::new(name).with_header(encoder::aprs_is_header(
                        &aprs.callsign_with_ssid(),
                    ))
                }
                OutputTarget::Kiss => LogSender::new(name),
            };
            return Ok(Self::Log(sender));
        }

        let io_timeout: Duration = config.pipeline.send_timeout();
        match target {
            OutputTarget::Internet => Ok(Self::AprsIs(AprsIsSender::new(
                name,
                AprsIsSenderConfig::from_aprs(aprs, io_timeout),
            ))),
            OutputTarget::Kiss => {
                let kiss = config.kiss.as_ref().ok_or_else(|| {
                    DispatcherError::sender_creation(name, "the [kiss] section is required")
                })?;
                let sender_config = KissSenderConfig::from_config(kiss, aprs, io_timeout)?;
                Ok(Self::Kiss(KissSender::new(name, sender_config)))
            }
        }
    }
}

impl PacketSender for ConfiguredSender {
    fn name(&self) -> &str {
        match self {
            Self::AprsIs(sender) => sender.name(),
            Self::Kiss(sender) => sender.name(),
            Self::Log(sender) => sender.name(),
        }
    }

    async fn connect(&mut self) -> Result<(), ContractError> {
        match self {
            Self::AprsIs(sender) => sender.connect().await,
            Self::Kiss(sender) => sender.connect().await,
            Self::Log(sender) => sender.connect().await,
        }
    }

    async fn send(&mut self, packet: &EncodedPacket) -> Result<(), ContractError> {
        match self {
            Self::AprsIs(sender) => sender.send(packet).await,
            Self::Kiss(sender) => sender.send(packet).await,
            Self::Log(sender) => sender.send(packet).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::AprsIs(sender) => sender.close().await,
            Self::Kiss(sender) => sender.close().await,
            Self::Log(sender) => sender.close().await,
        }
    }
}
