//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding game frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound message failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was malformed, truncated, or carried an
    /// unrecognized tag. The session endpoint drops the session on this.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates the protocol (e.g. a non-text frame
    /// where JSON was expected).
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
