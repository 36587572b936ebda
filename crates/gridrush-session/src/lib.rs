//! Player session management for Gridrush.
//!
//! This crate covers the identity side of a room:
//!
//! 1. **Authentication seam** — the [`Authenticator`] trait; the deployment
//!    decides how a bearer token maps to a [`UserId`](gridrush_protocol::UserId).
//! 2. **Session handles** — a [`Session`] pairs an authenticated user with
//!    the bounded outbound queue of one WebSocket connection.
//! 3. **Client registry** — the per-room [`ClientRegistry`] tracks who is
//!    connected, replaces connections on reconnect, and provides the fan-out
//!    primitives (broadcast, bounded direct send).

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod registry;
mod session;

pub use auth::Authenticator;
pub use error::SessionError;
pub use registry::{ClientRegistry, DIRECT_SEND_TIMEOUT};
pub use session::{SEND_QUEUE_CAPACITY, Session};
