//! Wire protocol for Gridrush.
//!
//! Every frame on a game session is a JSON object `{"type": ..., "content": ...}`.
//! This crate defines the typed rendition of that envelope ([`GameMsg`] and its
//! payload structs), the identity and grid primitives that appear inside it
//! ([`UserId`], [`RoomId`], [`Position`], [`Item`]), and the [`Codec`] used to
//! move between frames and types.
//!
//! The protocol layer knows nothing about connections, rooms, or rounds — it
//! only describes what travels on the wire.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AlertMsg, ChatMsg, Countdown, ErrorMsg, GameMsg, Item, ItemAction,
    ItemKind, ItemPosition, PlayerPosition, PlayerScore, Position, RoomId,
    RoundInfo, UserId, WaitingNotification,
};
