//! Error types for the room layer.

use gridrush_protocol::RoomId;

/// Errors that can occur while talking to a room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this id exists in the directory.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's engine is gone or its channels are closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
