//! Unified error type for the server crate.

use gridrush_protocol::ProtocolError;
use gridrush_room::RoomError;
use gridrush_session::SessionError;

/// Top-level error wrapping the layer-specific errors, so handlers and
/// `main` use one type with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Encoding/decoding of a game frame failed, or a client broke the
    /// framing rules.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Authentication or session bookkeeping failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The target room is missing or its engine is gone.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The WebSocket connection failed mid-pump.
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    /// Startup configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
