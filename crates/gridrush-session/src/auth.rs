//! Authentication seam.
//!
//! Gridrush does not mint or validate login credentials itself — an external
//! collaborator (OAuth flow, JWT cookie issuer) does. The room layer only
//! needs an opaque authenticated user id, so the boundary is a single trait
//! the deployment implements.

use gridrush_protocol::UserId;

use crate::SessionError;

/// Validates a bearer token and resolves the player identity behind it.
///
/// `Send + Sync + 'static` because the server shares one authenticator
/// across every connection task.
pub trait Authenticator: Send + Sync + 'static {
    /// Returns the authenticated [`UserId`] for a token, or
    /// [`SessionError::AuthFailed`] if the token is invalid or expired.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send;
}
