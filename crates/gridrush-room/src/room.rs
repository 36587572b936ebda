//! The room handle: how the rest of the server talks to a running room.
//!
//! [`Room`] is cheap to clone — channel senders plus shared registry and
//! round tag. The engine and scheduler tasks it fronts are spawned once
//! and live for the process lifetime.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use gridrush_protocol::{ItemAction, PlayerPosition, RoomId, UserId};
use gridrush_session::{ClientRegistry, Session};
use gridrush_tick::{RoundPhase, RoundSchedule};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::engine::{ENGINE_CHANNEL_CAPACITY, RoomControl, RoomEngine};
use crate::scheduler::RoundScheduler;
use crate::{ArenaConfig, RoomError};

/// Snapshot served by the lobby's room-status probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatus {
    /// Current phase name.
    pub state: String,
    /// When the next round seats players, in ms since the Unix epoch.
    pub next_round_start: i64,
}

/// Handle to one running room.
#[derive(Clone)]
pub struct Room {
    id: RoomId,
    config: ArenaConfig,
    schedule: RoundSchedule,
    registry: Arc<ClientRegistry>,
    round: Arc<RwLock<RoundPhase>>,
    position_tx: mpsc::Sender<PlayerPosition>,
    action_tx: mpsc::Sender<ItemAction>,
    control_tx: mpsc::Sender<RoomControl>,
}

impl Room {
    /// Spawns the engine and scheduler tasks for a new room and returns
    /// the handle.
    pub(crate) fn spawn(id: RoomId, config: ArenaConfig, schedule: RoundSchedule) -> Self {
        let schedule = schedule.validated();
        let registry = Arc::new(ClientRegistry::new());
        let round = Arc::new(RwLock::new(RoundPhase::Waiting));

        let (position_tx, position_rx) = mpsc::channel(ENGINE_CHANNEL_CAPACITY);
        let (action_tx, action_rx) = mpsc::channel(ENGINE_CHANNEL_CAPACITY);
        let (control_tx, control_rx) = mpsc::channel(ENGINE_CHANNEL_CAPACITY);

        let engine = RoomEngine::new(
            id.clone(),
            config.clone(),
            schedule,
            Arc::clone(&registry),
            Arc::clone(&round),
            position_rx,
            action_rx,
            control_rx,
            StdRng::from_os_rng(),
        );
        tokio::spawn(engine.run());

        let scheduler = RoundScheduler::new(
            id.clone(),
            schedule,
            Arc::clone(&round),
            Arc::clone(&registry),
            control_tx.clone(),
        );
        tokio::spawn(scheduler.run());

        Self {
            id,
            config,
            schedule,
            registry,
            round,
            position_tx,
            action_tx,
            control_tx,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Registers a session with the room. Returns `true` on a first-time
    /// registration, `false` on a reconnect (the engine then replays the
    /// stored position instead of assigning a new seat).
    pub async fn register(&self, session: &Session) -> Result<bool, RoomError> {
        let first_time = self.registry.register(session);
        self.control_tx
            .send(RoomControl::Joined {
                user_id: session.user_id().clone(),
                first_time,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.id.clone()))?;
        Ok(first_time)
    }

    /// Marks a session disconnected after its pumps exit. Grid state is
    /// left intact until the next round boundary.
    pub fn disconnect(&self, user_id: &UserId) {
        self.registry.mark_connected(user_id, false);
    }

    /// Queues a move request for the engine. The caller must have set the
    /// payload's `id` to the authenticated user.
    pub async fn submit_position(&self, update: PlayerPosition) -> Result<(), RoomError> {
        self.position_tx
            .send(update)
            .await
            .map_err(|_| RoomError::Unavailable(self.id.clone()))
    }

    /// Queues an item pickup for the engine.
    pub async fn submit_action(&self, action: ItemAction) -> Result<(), RoomError> {
        self.action_tx
            .send(action)
            .await
            .map_err(|_| RoomError::Unavailable(self.id.clone()))
    }

    /// Current phase and next seating time, for the lobby probe.
    pub fn status(&self) -> RoomStatus {
        let phase = *self.round.read().expect("round lock poisoned");
        RoomStatus {
            state: phase.as_str().to_string(),
            next_round_start: self
                .schedule
                .next_round_start(Utc::now())
                .timestamp_millis(),
        }
    }
}
