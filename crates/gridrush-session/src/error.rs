//! Error types for the session layer.

use gridrush_protocol::UserId;

/// Errors that can occur while establishing or addressing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The auth collaborator rejected the presented token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No registry entry exists for the user.
    #[error("no session registered for user {0}")]
    NotRegistered(UserId),
}
