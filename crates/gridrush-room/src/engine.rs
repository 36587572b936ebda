//! The room engine: one task, sole writer of all game state.
//!
//! Every mutation of the grid, items, scores, or round membership happens
//! here. Session pumps and the round scheduler submit intents over bounded
//! channels; the engine serializes them, which is what makes the occupancy
//! invariants checkable at a single point. Fan-out goes through the room's
//! [`ClientRegistry`]: broadcasts are non-blocking (slow consumers are
//! dropped, never waited on), direct sends use the registry's bounded wait.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use gridrush_protocol::{
    GameMsg, ItemAction, ItemKind, PlayerPosition, RoomId, RoundInfo, UserId,
    WaitingNotification,
};
use gridrush_session::ClientRegistry;
use gridrush_tick::{RoundPhase, RoundSchedule};
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use crate::grid::{GridState, MoveError};
use crate::{ArenaConfig, COIN_VALUE, DIAMOND_VALUE};

/// Capacity of the engine's inbound channels.
pub(crate) const ENGINE_CHANNEL_CAPACITY: usize = 64;

/// Control events delivered to the engine alongside the position and item
/// channels: session registrations and scheduler-requested transitions.
#[derive(Debug)]
pub(crate) enum RoomControl {
    Joined { user_id: UserId, first_time: bool },
    Phase { phase: RoundPhase, now: DateTime<Utc> },
}

/// Round membership of one player. `connected` lives in the registry; a
/// player is active when both hold.
struct PlayerEntry {
    allow_join: bool,
}

pub(crate) struct RoomEngine {
    id: RoomId,
    config: ArenaConfig,
    schedule: RoundSchedule,
    registry: Arc<ClientRegistry>,
    round: Arc<RwLock<RoundPhase>>,
    grid: GridState,
    players: HashMap<UserId, PlayerEntry>,
    position_rx: mpsc::Receiver<PlayerPosition>,
    action_rx: mpsc::Receiver<ItemAction>,
    control_rx: mpsc::Receiver<RoomControl>,
    rng: StdRng,
}

impl RoomEngine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: RoomId,
        config: ArenaConfig,
        schedule: RoundSchedule,
        registry: Arc<ClientRegistry>,
        round: Arc<RwLock<RoundPhase>>,
        position_rx: mpsc::Receiver<PlayerPosition>,
        action_rx: mpsc::Receiver<ItemAction>,
        control_rx: mpsc::Receiver<RoomControl>,
        rng: StdRng,
    ) -> Self {
        Self {
            id,
            config,
            schedule,
            registry,
            round,
            grid: GridState::new(),
            players: HashMap::new(),
            position_rx,
            action_rx,
            control_rx,
            rng,
        }
    }

    /// Runs the engine loop until every inbound channel is closed.
    pub(crate) async fn run(mut self) {
        tracing::info!(room_id = %self.id, "room engine started");

        loop {
            tokio::select! {
                Some(update) = self.position_rx.recv() => {
                    self.apply_position(update).await;
                }
                Some(action) = self.action_rx.recv() => {
                    self.apply_item_action(action).await;
                }
                Some(control) = self.control_rx.recv() => match control {
                    RoomControl::Joined { user_id, first_time } => {
                        self.apply_join(user_id, first_time).await;
                    }
                    RoomControl::Phase { phase, now } => {
                        self.apply_phase(phase, now).await;
                    }
                },
                else => break,
            }
        }

        tracing::info!(room_id = %self.id, "room engine stopped");
    }

    fn phase(&self) -> RoundPhase {
        *self.round.read().expect("round lock poisoned")
    }

    /// Whether a player currently takes part in the round.
    fn is_active(&self, user_id: &UserId) -> bool {
        self.players
            .get(user_id)
            .is_some_and(|entry| entry.allow_join)
    }

    // -- position updates -------------------------------------------------

    async fn apply_position(&mut self, update: PlayerPosition) {
        let user_id = update.id.clone();

        if !self.is_active(&user_id) {
            tracing::debug!(room_id = %self.id, %user_id, "move outside an active round");
            self.registry
                .send_to(
                    &user_id,
                    GameMsg::error_to(user_id.clone(), "not in the current round"),
                )
                .await;
            return;
        }

        let Some(current) = self.grid.position_of(&user_id) else {
            tracing::warn!(room_id = %self.id, %user_id, "move with no stored position");
            self.registry
                .send_to(
                    &user_id,
                    GameMsg::error_to(
                        user_id.clone(),
                        format!("no position found for user {user_id}"),
                    ),
                )
                .await;
            return;
        };

        match self
            .grid
            .move_player(&user_id, update.position, self.config.grid_size)
        {
            Ok(_) => {
                self.registry
                    .broadcast(&GameMsg::position_update(user_id, update.position));
            }
            Err(MoveError::OutOfGrid) => {
                self.registry
                    .send_to(&user_id, GameMsg::resync(user_id.clone(), current, "out of grid"))
                    .await;
            }
            Err(MoveError::TooFar) => {
                self.registry
                    .send_to(&user_id, GameMsg::resync(user_id.clone(), current, "over 1 step"))
                    .await;
            }
            Err(MoveError::Occupied) => {
                self.registry
                    .send_to(
                        &user_id,
                        GameMsg::error_to(user_id.clone(), "target cell is occupied"),
                    )
                    .await;
                self.registry
                    .send_to(
                        &user_id,
                        GameMsg::resync(user_id.clone(), current, "cell occupied"),
                    )
                    .await;
            }
            Err(MoveError::UnknownPlayer) => {
                // position_of above succeeded, so this cannot happen; keep
                // the engine alive regardless.
                tracing::error!(room_id = %self.id, %user_id, "position map lost during move");
            }
        }
    }

    // -- item actions ------------------------------------------------------

    async fn apply_item_action(&mut self, action: ItemAction) {
        let user_id = action.id.clone();

        if !self.is_active(&user_id) {
            tracing::debug!(room_id = %self.id, %user_id, "item action outside an active round");
            self.registry
                .send_to(
                    &user_id,
                    GameMsg::error_to(user_id.clone(), "not in the current round"),
                )
                .await;
            return;
        }

        let key = action.position.cell_key();
        let Some(found) = self.grid.item_at(&key) else {
            tracing::debug!(room_id = %self.id, %user_id, cell = %key, "item action on an empty cell");
            return;
        };

        if found.item.kind == ItemKind::Unknown {
            tracing::warn!(room_id = %self.id, %user_id, cell = %key, "item of unknown kind, ignoring");
            return;
        }

        // The stored item is authoritative; whatever value the client
        // claimed is ignored.
        let collected = match self.grid.remove_item(&key) {
            Some(item) => item,
            None => return,
        };
        let score = self.grid.update_score(&user_id, collected.item.value);

        tracing::debug!(
            room_id = %self.id,
            %user_id,
            kind = %collected.item.kind,
            value = collected.item.value,
            score,
            "item collected"
        );

        self.registry.broadcast(&GameMsg::ItemCollected(ItemAction {
            valid: true,
            id: user_id.clone(),
            item: collected.item,
            position: collected.position,
        }));
        self.registry
            .broadcast(&GameMsg::score_update(user_id, score));
    }

    // -- joins, reconnects, late joiners ----------------------------------

    async fn apply_join(&mut self, user_id: UserId, first_time: bool) {
        let phase = self.phase();
        self.players
            .entry(user_id.clone())
            .or_insert(PlayerEntry { allow_join: false });

        if !first_time {
            if let Some(position) = self.grid.position_of(&user_id) {
                // Reconnect mid-round: replay the stored position to the
                // reconnecting client only; everyone else never saw them
                // leave.
                tracing::info!(room_id = %self.id, %user_id, "reconnect, replaying position");
                self.registry
                    .send_to(&user_id, GameMsg::position_update(user_id.clone(), position))
                    .await;
                return;
            }
            // Position was cleaned up in between: fall through and treat
            // them like a new late joiner.
        }

        if phase == RoundPhase::Preparing || !self.config.join_protect {
            self.seat_player(&user_id).await;
            if self.grid.position_of(&user_id).is_some() {
                self.send_snapshot(&user_id).await;
            }
        } else {
            let next_start = self.schedule.next_round_start(Utc::now());
            tracing::info!(room_id = %self.id, %user_id, "late joiner, holding until next round");
            self.registry
                .send_to(
                    &user_id,
                    GameMsg::WaitingNotification(WaitingNotification {
                        message: "a round is in progress, you will join the next one".into(),
                        next_round_start: next_start.timestamp(),
                    }),
                )
                .await;
        }
    }

    /// Seats one player: random start cell, score opened at zero,
    /// membership switched on, position broadcast to the room.
    async fn seat_player(&mut self, user_id: &UserId) {
        match self
            .grid
            .assign_start(user_id, self.config.grid_size, &mut self.rng)
        {
            Some(position) => {
                let entry = self
                    .players
                    .entry(user_id.clone())
                    .or_insert(PlayerEntry { allow_join: false });
                entry.allow_join = true;
                tracing::info!(room_id = %self.id, %user_id, %position, "player seated");
                self.registry
                    .broadcast(&GameMsg::position_update(user_id.clone(), position));
            }
            None => {
                tracing::error!(room_id = %self.id, %user_id, "no free starting cell");
                self.registry
                    .send_to(
                        user_id,
                        GameMsg::alert_to(
                            user_id.clone(),
                            "no free starting cell, you will join the next round",
                        ),
                    )
                    .await;
            }
        }
    }

    /// Sends the full round state to one client: every obstacle, every
    /// item, every other player's position, and all known scores.
    async fn send_snapshot(&self, user_id: &UserId) {
        for obstacle in self.grid.obstacles() {
            self.registry
                .send_to(user_id, GameMsg::ObstaclePosition(*obstacle))
                .await;
        }
        for item in self.grid.items() {
            self.registry
                .send_to(user_id, GameMsg::ItemPosition(item.clone()))
                .await;
        }
        for (other, position) in self.grid.positions() {
            if other != user_id {
                self.registry
                    .send_to(user_id, GameMsg::position_update(other.clone(), *position))
                    .await;
            }
        }
        for (player, score) in self.grid.scores() {
            self.registry
                .send_to(user_id, GameMsg::score_update(player.clone(), *score))
                .await;
        }
    }

    // -- round transitions -------------------------------------------------

    async fn apply_phase(&mut self, phase: RoundPhase, now: DateTime<Utc>) {
        match phase {
            RoundPhase::Waiting => {
                self.broadcast_round_state(RoundPhase::Waiting, now);
            }
            RoundPhase::Cleanup => {
                self.grid.clear();
                for user_id in self.registry.disconnected_ids() {
                    tracing::debug!(room_id = %self.id, %user_id, "collecting disconnected player");
                    self.registry.remove(&user_id);
                    self.players.remove(&user_id);
                }
                self.broadcast_round_state(RoundPhase::Cleanup, now);
            }
            RoundPhase::Preparing => {
                self.init_round(now).await;
            }
            RoundPhase::Playing => {
                self.broadcast_round_state(RoundPhase::Playing, now);
            }
            RoundPhase::Ended => {
                for entry in self.players.values_mut() {
                    entry.allow_join = false;
                }
                self.broadcast_round_state(RoundPhase::Ended, now);
            }
        }
    }

    /// Preparing entry: fresh board, items placed, every connected player
    /// seated and brought up to date.
    async fn init_round(&mut self, now: DateTime<Utc>) {
        self.grid.clear();

        let obstacles = self.grid.place_obstacles(
            self.config.obstacle_count,
            self.config.grid_size,
            &mut self.rng,
        );
        let coins = self.grid.place_items(
            ItemKind::Coin,
            COIN_VALUE,
            self.config.coin_count,
            self.config.grid_size,
            &mut self.rng,
        );
        let diamonds = self.grid.place_items(
            ItemKind::Diamond,
            DIAMOND_VALUE,
            self.config.diamond_count,
            self.config.grid_size,
            &mut self.rng,
        );
        tracing::info!(
            room_id = %self.id,
            obstacles,
            coins,
            diamonds,
            "round initialized"
        );

        self.broadcast_round_state(RoundPhase::Preparing, now);

        let connected = self.registry.connected_ids();
        for user_id in &connected {
            self.seat_player(user_id).await;
        }
        for user_id in &connected {
            self.send_snapshot(user_id).await;
        }
    }

    fn broadcast_round_state(&self, phase: RoundPhase, now: DateTime<Utc>) {
        tracing::info!(room_id = %self.id, phase = %phase, "round phase entered");
        self.registry.broadcast(&GameMsg::RoundState(RoundInfo {
            state: phase.as_str().to_string(),
            current_time: now.timestamp_millis(),
            end_time: self.schedule.phase_end_time(now).timestamp_millis(),
        }));
    }
}

// =========================================================================
// Tests
// =========================================================================
