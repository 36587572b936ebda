//! The deployment's [`Authenticator`] implementation.
//!
//! Login, token minting, and cookie issuance belong to the external auth
//! service; by the time a request reaches this server the cookie carries
//! the player's digest identity. This authenticator only checks the digest
//! has the shape that service mints.

use gridrush_protocol::UserId;
use gridrush_session::{Authenticator, SessionError};

/// Accepts the 8-character lowercase hex digests the auth service derives
/// from verified accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexDigestAuth;

impl Authenticator for HexDigestAuth {
    async fn authenticate(&self, token: &str) -> Result<UserId, SessionError> {
        let well_formed = token.len() == 8
            && token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if well_formed {
            Ok(UserId::new(token))
        } else {
            Err(SessionError::AuthFailed("malformed user digest".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_an_eight_char_hex_digest() {
        let user_id = HexDigestAuth.authenticate("a1b2c3d4").await.unwrap();
        assert_eq!(user_id, UserId::new("a1b2c3d4"));
    }

    #[tokio::test]
    async fn test_rejects_wrong_length() {
        assert!(HexDigestAuth.authenticate("a1b2").await.is_err());
        assert!(HexDigestAuth.authenticate("a1b2c3d4e5").await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_non_hex_characters() {
        assert!(HexDigestAuth.authenticate("a1b2c3zz").await.is_err());
        assert!(HexDigestAuth.authenticate("A1B2C3D4").await.is_err());
        assert!(HexDigestAuth.authenticate("").await.is_err());
    }
}
