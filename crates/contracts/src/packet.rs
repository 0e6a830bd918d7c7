//! EncodedPacket - Encoder output

use std::fmt;

/// An encoded wire packet
///
/// Opaque text for the transports; they only frame and transmit it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedPacket(String);

impl EncodedPacket {
    /// Wrap an already-encoded packet string
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Packet text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Packet bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Packet length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the packet is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EncodedPacket {
    fn from(text: String) -> Self {
        Self(text)
    }
}
