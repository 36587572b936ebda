//! Session handles: one authenticated user on one connection.

use gridrush_protocol::{GameMsg, UserId};
use tokio::sync::mpsc;

/// Capacity of a session's outbound queue.
///
/// The queue is the only buffering between the room engine and a client. A
/// client that cannot drain 256 messages is considered failed and is closed
/// rather than allowed to stall the engine.
pub const SEND_QUEUE_CAPACITY: usize = 256;

/// One authenticated bidirectional connection, bound to a (room, user) pair
/// by registration.
///
/// The session endpoint creates the outbound channel, hands the sender half
/// to the room via [`Session`], and keeps the receiver half for its write
/// pump. The registry owns the sender from then on: when it drops the sender
/// (removal or reconnect replacement), the write pump sees the queue close
/// and shuts the connection down.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: UserId,
    sender: mpsc::Sender<GameMsg>,
}

impl Session {
    pub fn new(user_id: UserId, sender: mpsc::Sender<GameMsg>) -> Self {
        Self { user_id, sender }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn sender(&self) -> &mpsc::Sender<GameMsg> {
        &self.sender
    }
}
