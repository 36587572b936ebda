//! Codec trait and the JSON implementation.
//!
//! Game frames travel as WebSocket text frames, so the codec works on
//! strings rather than byte buffers. Behind the [`Codec`] seam a binary
//! codec could be swapped in without touching the session or room layers.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between wire frames and protocol types.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one text frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Parses one text frame back into a value.
    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError>;
}

/// The default [`Codec`]: JSON via `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
