//! The client registry: who is in the room and how to reach them.
//!
//! One registry per room. The engine task and the session pumps both touch
//! it, so the map sits behind a read/write lock. Mutations (register,
//! remove, flag flips) hold the write lock briefly; fan-out snapshots the
//! recipients under the read lock and sends outside it, so a receiver being
//! removed mid-broadcast can never invalidate the iteration.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use gridrush_protocol::{GameMsg, UserId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::timeout;

use crate::Session;

/// How long a direct send may wait on a full queue before it is dropped.
pub const DIRECT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

struct ClientEntry {
    sender: mpsc::Sender<GameMsg>,
    connected: bool,
}

/// Tracks every player known to a room and their connection state.
///
/// A player stays registered across a disconnect — only the `connected`
/// flag flips — so their grid state survives until the round boundary
/// garbage-collects them.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<UserId, ClientEntry>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session. Returns `true` if the user was not known
    /// before (first time), `false` on a reconnect.
    ///
    /// On reconnect the stored sender is replaced; dropping the old sender
    /// closes the previous connection's queue, which tears its pumps down.
    pub fn register(&self, session: &Session) -> bool {
        let mut clients = self.clients.write().expect("registry lock poisoned");
        let first_time = !clients.contains_key(session.user_id());
        clients.insert(
            session.user_id().clone(),
            ClientEntry {
                sender: session.sender().clone(),
                connected: true,
            },
        );
        if first_time {
            tracing::info!(user_id = %session.user_id(), "client registered");
        } else {
            tracing::info!(user_id = %session.user_id(), "client reconnected, connection replaced");
        }
        first_time
    }

    /// Flips the connected flag. Called by the session endpoint when a pump
    /// exits; the player's game state is left alone.
    pub fn mark_connected(&self, user_id: &UserId, connected: bool) {
        let mut clients = self.clients.write().expect("registry lock poisoned");
        if let Some(entry) = clients.get_mut(user_id) {
            entry.connected = connected;
        }
    }

    /// Removes a client entirely, closing its queue. Engine-only path
    /// (round cleanup, failed receivers).
    pub fn remove(&self, user_id: &UserId) {
        let mut clients = self.clients.write().expect("registry lock poisoned");
        if clients.remove(user_id).is_some() {
            tracing::debug!(%user_id, "client removed from registry");
        }
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.clients
            .read()
            .expect("registry lock poisoned")
            .contains_key(user_id)
    }

    pub fn is_connected(&self, user_id: &UserId) -> bool {
        self.clients
            .read()
            .expect("registry lock poisoned")
            .get(user_id)
            .is_some_and(|entry| entry.connected)
    }

    /// Snapshot of users currently marked connected.
    pub fn connected_ids(&self) -> Vec<UserId> {
        self.clients
            .read()
            .expect("registry lock poisoned")
            .iter()
            .filter(|(_, entry)| entry.connected)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Snapshot of users whose connection has gone away. Round
    /// initialization uses this to garbage-collect.
    pub fn disconnected_ids(&self) -> Vec<UserId> {
        self.clients
            .read()
            .expect("registry lock poisoned")
            .iter()
            .filter(|(_, entry)| !entry.connected)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Non-blocking fan-out to every session.
    ///
    /// A session whose queue rejects the message (full or closed) is a
    /// failed consumer: it is removed from the registry, which closes its
    /// queue and lets its pumps shut the connection. Returns the ids that
    /// were dropped.
    pub fn broadcast(&self, msg: &GameMsg) -> Vec<UserId> {
        let recipients: Vec<(UserId, mpsc::Sender<GameMsg>)> = {
            let clients = self.clients.read().expect("registry lock poisoned");
            clients
                .iter()
                .map(|(id, entry)| (id.clone(), entry.sender.clone()))
                .collect()
        };

        let mut failed = Vec::new();
        for (user_id, sender) in recipients {
            match sender.try_send(msg.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%user_id, "send queue saturated, dropping session");
                    failed.push(user_id);
                }
                Err(TrySendError::Closed(_)) => failed.push(user_id),
            }
        }

        if !failed.is_empty() {
            let mut clients = self.clients.write().expect("registry lock poisoned");
            for user_id in &failed {
                clients.remove(user_id);
            }
        }
        failed
    }

    /// Direct send to one session with a bounded wait. On timeout or a
    /// closed queue the message is logged and dropped; the session is left
    /// for the broadcast path or pump exit to clean up.
    pub async fn send_to(&self, user_id: &UserId, msg: GameMsg) {
        let sender = {
            let clients = self.clients.read().expect("registry lock poisoned");
            clients.get(user_id).map(|entry| entry.sender.clone())
        };
        let Some(sender) = sender else {
            tracing::debug!(%user_id, "direct send to unknown client");
            return;
        };

        match timeout(DIRECT_SEND_TIMEOUT, sender.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => tracing::debug!(%user_id, "direct send to closed queue"),
            Err(_) => tracing::warn!(%user_id, "direct send timed out, message dropped"),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gridrush_protocol::Position;

    fn uid(id: &str) -> UserId {
        UserId::new(id)
    }

    /// Registers a user with a queue of the given capacity, returning the
    /// receiver half so tests can observe what the registry delivered.
    fn register_with_queue(
        registry: &ClientRegistry,
        id: &str,
        capacity: usize,
    ) -> (bool, mpsc::Receiver<GameMsg>) {
        let (tx, rx) = mpsc::channel(capacity);
        let first_time = registry.register(&Session::new(uid(id), tx));
        (first_time, rx)
    }

    fn probe_msg() -> GameMsg {
        GameMsg::position_update(uid("u1"), Position::new(1, 1))
    }

    #[test]
    fn test_register_new_user_returns_first_time() {
        let registry = ClientRegistry::new();
        let (first_time, _rx) = register_with_queue(&registry, "u1", 8);

        assert!(first_time);
        assert!(registry.contains(&uid("u1")));
        assert!(registry.is_connected(&uid("u1")));
    }

    #[test]
    fn test_register_same_user_again_is_a_reconnect() {
        let registry = ClientRegistry::new();
        let (_, _rx1) = register_with_queue(&registry, "u1", 8);

        let (first_time, _rx2) = register_with_queue(&registry, "u1", 8);

        assert!(!first_time, "second register must report a reconnect");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_replaces_old_connection_queue() {
        let registry = ClientRegistry::new();
        let (_, mut old_rx) = register_with_queue(&registry, "u1", 8);
        let (_, mut new_rx) = register_with_queue(&registry, "u1", 8);

        registry.broadcast(&probe_msg());

        // The replaced queue closed (its sender was dropped), the new one
        // got the message.
        assert!(old_rx.try_recv().is_err());
        assert!(new_rx.try_recv().is_ok());
    }

    #[test]
    fn test_reconnect_after_disconnect_marks_connected() {
        let registry = ClientRegistry::new();
        let (_, _rx1) = register_with_queue(&registry, "u1", 8);
        registry.mark_connected(&uid("u1"), false);
        assert!(!registry.is_connected(&uid("u1")));

        let (first_time, _rx2) = register_with_queue(&registry, "u1", 8);

        assert!(!first_time);
        assert!(registry.is_connected(&uid("u1")));
    }

    #[test]
    fn test_disconnected_ids_snapshot() {
        let registry = ClientRegistry::new();
        let (_, _rx1) = register_with_queue(&registry, "u1", 8);
        let (_, _rx2) = register_with_queue(&registry, "u2", 8);
        registry.mark_connected(&uid("u2"), false);

        assert_eq!(registry.disconnected_ids(), vec![uid("u2")]);
        assert_eq!(registry.connected_ids(), vec![uid("u1")]);
    }

    #[test]
    fn test_remove_closes_the_queue() {
        let registry = ClientRegistry::new();
        let (_, mut rx) = register_with_queue(&registry, "u1", 8);

        registry.remove(&uid("u1"));

        assert!(!registry.contains(&uid("u1")));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_broadcast_reaches_every_session() {
        let registry = ClientRegistry::new();
        let (_, mut rx1) = register_with_queue(&registry, "u1", 8);
        let (_, mut rx2) = register_with_queue(&registry, "u2", 8);

        let failed = registry.broadcast(&probe_msg());

        assert!(failed.is_empty());
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_drops_saturated_session() {
        let registry = ClientRegistry::new();
        // Capacity 1 and never drained: the second broadcast saturates it.
        let (_, _rx_full) = register_with_queue(&registry, "slow", 1);
        let (_, mut rx_ok) = register_with_queue(&registry, "fast", 8);

        registry.broadcast(&probe_msg());
        let failed = registry.broadcast(&probe_msg());

        assert_eq!(failed, vec![uid("slow")]);
        assert!(!registry.contains(&uid("slow")), "slow consumer removed");
        assert!(registry.contains(&uid("fast")));
        assert!(rx_ok.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_send_to_delivers_to_one_session() {
        let registry = ClientRegistry::new();
        let (_, mut rx1) = register_with_queue(&registry, "u1", 8);
        let (_, mut rx2) = register_with_queue(&registry, "u2", 8);

        registry.send_to(&uid("u1"), probe_msg()).await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err(), "direct send must not fan out");
    }

    #[tokio::test]
    async fn test_send_to_unknown_user_is_a_noop() {
        let registry = ClientRegistry::new();
        registry.send_to(&uid("ghost"), probe_msg()).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_to_full_queue_times_out_without_removal() {
        let registry = ClientRegistry::new();
        let (_, _rx) = register_with_queue(&registry, "slow", 1);

        registry.broadcast(&probe_msg()); // fill the queue
        registry.send_to(&uid("slow"), probe_msg()).await;

        // Direct sends drop on timeout but do not remove the session.
        assert!(registry.contains(&uid("slow")));
    }
}
