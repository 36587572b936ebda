//! Room lifecycle for Gridrush.
//!
//! Each room runs as an isolated pair of Tokio tasks: the **engine**, the
//! sole writer of all game state (grid, items, scores, round membership),
//! fed by typed channels; and the **round scheduler**, which watches the
//! wall clock and asks the engine to move through the round phases. The
//! [`RoomManager`] is the name → [`Room`] directory built at startup.

mod config;
mod engine;
mod error;
mod grid;
mod manager;
mod room;
mod scheduler;

pub use config::{ArenaConfig, COIN_VALUE, DIAMOND_VALUE};
pub use error::RoomError;
pub use grid::{GridState, MoveError, Occupant};
pub use manager::RoomManager;
pub use room::{Room, RoomStatus};
