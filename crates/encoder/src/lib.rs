//! # Encoder
//!
//! APRS positioned weather report encoding.
//!
//! - `encode_position`: decimal degrees → `DDMM.MMH/DDDMM.MMH`
//! - `encode_weather_fields`: fixed-width weather segment with `.` sentinels
//! - `encode_weather`: full `@DDHHMMz...` packet

mod error;
mod packet;
mod position;
mod weather;

pub use error::EncodeError;
pub use packet::{aprs_is_header, encode_weather, WeatherEncoder, TOCALL};
pub use position::encode_position;
pub use weather::encode_weather_fields;
