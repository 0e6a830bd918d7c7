//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! - `RawMessage` (source) -> `WeatherRecord` (extractor) -> `EncodedPacket` (encoder)
//! - `EncodedPacket` is handed to a `PacketSender` by the dispatcher
//!
//! ## Time Model
//! - All timestamps are UTC (`chrono::DateTime<Utc>`)
//! - Packets carry day/hour/minute only, as the wire format requires

mod config;
mod error;
mod message;
mod outlet;
mod packet;
mod record;
mod route;
mod sender;
mod source;

pub use config::*;
pub use error::*;
pub use message::RawMessage;
pub use outlet::PacketOutlet;
pub use packet::EncodedPacket;
pub use record::{Location, WeatherRecord};
pub use route::*;
pub use sender::*;
pub use source::*;
