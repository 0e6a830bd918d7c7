//! Packet assembly

use chrono::{DateTime, Utc};
use contracts::{EncodedPacket, Location, WeatherRecord};
use tracing::trace;

use crate::error::EncodeError;
use crate::position::encode_position;
use crate::weather::encode_weather_fields;

/// Destination (tocall) used in the address header
pub const TOCALL: &str = "APRS";

/// Weather station symbol code, ends the position block
const WEATHER_SYMBOL: char = '_';

/// Assemble a positioned weather report
///
/// `@DDHHMMz<position>_<weather>w<suffix>`, timestamped with `sent_at` in UTC.
pub fn encode_weather(
    record: &WeatherRecord,
    position: Location,
    sent_at: DateTime<Utc>,
    suffix: &str,
) -> Result<EncodedPacket, EncodeError> {
    let position = encode_position(position.latitude, position.longitude)?;
    let fields = encode_weather_fields(record);
    let packet = format!(
        "@{}z{position}{WEATHER_SYMBOL}{fields}w{suffix}",
        sent_at.format("%d%H%M")
    );
    trace!(packet = %packet, "weather packet encoded");
    Ok(EncodedPacket::new(packet))
}

/// TNC2 address header for packets gated onto APRS-IS
pub fn aprs_is_header(callsign: &str) -> String {
    format!("{callsign}>{TOCALL},TCPIP*:")
}

/// Encoder bound to the pipeline's software suffix
#[derive(Debug, Clone)]
pub struct WeatherEncoder {
    software_suffix: String,
}

impl WeatherEncoder {
    pub fn new(software_suffix: impl Into<String>) -> Self {
        Self {
            software_suffix: software_suffix.into(),
        }
    }

    pub fn software_suffix(&self) -> &str {
        &self.software_suffix
    }

    pub fn encode(
        &self,
        record: &WeatherRecord,
        position: Location,
        sent_at: DateTime<Utc>,
    ) -> Result<EncodedPacket, EncodeError> {
        encode_weather(record, position, sent_at, &self.software_suffix)
    }
}
