//! Payload decoding

use contracts::PayloadFormat;
use serde_json::Value;

use crate::error::MessageError;

/// Decode a raw payload into a structured document
pub fn decode_payload(format: PayloadFormat, payload: &[u8]) -> Result<Value, MessageError> {
    match format {
        PayloadFormat::Json => {
            serde_json::from_slice(payload).map_err(|e| MessageError::Decode {
                message: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object() {
        let value = decode_payload(PayloadFormat::Json, br#"{"speed": 12}"#).unwrap();
        assert_eq!(value["speed"], 12);
    }

    #[test]
    fn malformed_json() {
        let err = decode_payload(PayloadFormat::Json, b"{speed: ").unwrap_err();
        assert_eq!(err.reason(), "decode");
    }

    #[test]
    fn invalid_utf8() {
        assert!(decode_payload(PayloadFormat::Json, &[0xff, 0xfe]).is_err());
    }
}
