//! # Gridrush
//!
//! Realtime multiplayer grid-arena server. Authenticated players connect
//! over WebSocket, move one cell at a time on a shared grid, collect coins
//! and diamonds for score, and watch every other player do the same.
//! Rounds follow the wall clock, so all rooms run in the same phase.
//!
//! This crate is the outer surface: the axum router, the WebSocket session
//! endpoint with its two pumps, configuration, and the binary entry point.
//! The game itself lives in `gridrush-room`.

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod routes;

pub use auth::HexDigestAuth;
pub use config::ServerConfig;
pub use error::ServerError;
pub use routes::{AppState, build_state, router};
