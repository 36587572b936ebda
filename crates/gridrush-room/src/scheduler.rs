//! The per-room round scheduler task.
//!
//! A 100 ms ticker watches the wall clock. When the second-of-minute
//! crosses into a new phase the shared round tag is flipped (under its
//! lock) and the transition is handed to the engine task, which performs
//! the actual state mutations. Every tick also pushes a countdown to all
//! sessions. Observing a phase that is already active does nothing, which
//! makes the scheduler immune to clock skew replays.

use std::sync::{Arc, RwLock};

use gridrush_protocol::{Countdown, GameMsg, RoomId};
use gridrush_session::ClientRegistry;
use gridrush_tick::{RoundPhase, RoundSchedule, RoundTicker};
use tokio::sync::mpsc;

use crate::engine::RoomControl;

pub(crate) struct RoundScheduler {
    room_id: RoomId,
    schedule: RoundSchedule,
    round: Arc<RwLock<RoundPhase>>,
    registry: Arc<ClientRegistry>,
    control_tx: mpsc::Sender<RoomControl>,
}

impl RoundScheduler {
    pub(crate) fn new(
        room_id: RoomId,
        schedule: RoundSchedule,
        round: Arc<RwLock<RoundPhase>>,
        registry: Arc<ClientRegistry>,
        control_tx: mpsc::Sender<RoomControl>,
    ) -> Self {
        Self {
            room_id,
            schedule,
            round,
            registry,
            control_tx,
        }
    }

    /// Runs until the engine goes away.
    pub(crate) async fn run(self) {
        tracing::info!(room_id = %self.room_id, "round scheduler started");
        let mut ticker = RoundTicker::new();

        loop {
            let now = ticker.tick().await;
            let expected = self.schedule.phase_now(now);

            if advance_phase(&self.round, expected) {
                tracing::debug!(
                    room_id = %self.room_id,
                    phase = %expected,
                    "wall clock crossed a phase boundary"
                );
                if self
                    .control_tx
                    .send(RoomControl::Phase {
                        phase: expected,
                        now,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }

            self.registry.broadcast(&GameMsg::Countdown(Countdown {
                remaining_time: self.schedule.remaining_secs(now),
                current_state: expected.as_str().to_string(),
            }));
        }

        tracing::info!(room_id = %self.room_id, "round scheduler stopped");
    }
}

/// Compare-and-set on the round tag. Returns `true` only when the tag
/// actually changed; re-entering the active phase is a no-op.
pub(crate) fn advance_phase(round: &RwLock<RoundPhase>, expected: RoundPhase) -> bool {
    let mut current = round.write().expect("round lock poisoned");
    if *current == expected {
        false
    } else {
        *current = expected;
        true
    }
}
