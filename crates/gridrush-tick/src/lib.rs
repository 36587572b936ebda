//! Wall-clock round scheduling for Gridrush.
//!
//! Rounds are keyed to the system clock's second-of-minute so that every
//! room in a deployment — and every deployment replica — sits in the same
//! phase at the same instant. The default schedule:
//!
//! ```text
//! second  0....5....10....15..........................59...60
//! phase   waiting cleanup preparing      playing        ended
//! ```
//!
//! [`RoundSchedule`] is the pure time math (phase lookup, countdown,
//! boundary timestamps); [`RoundTicker`] is the 100 ms driver a room's
//! scheduler task runs on. Transition detection stays with the caller,
//! which makes entering an already-active phase a natural no-op.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::warn;

// ---------------------------------------------------------------------------
// RoundPhase
// ---------------------------------------------------------------------------

/// The five phases of a round. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Idle gap before the old round's state is torn down.
    Waiting,
    /// Grid, items, scores, and disconnected players are cleared.
    Cleanup,
    /// Obstacles and items are placed, players are seated.
    Preparing,
    /// Moves and pickups are accepted.
    Playing,
    /// Round is over; players are frozen until the next cycle.
    Ended,
}

impl RoundPhase {
    /// The phase name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Cleanup => "cleanup",
            Self::Preparing => "preparing",
            Self::Playing => "playing",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RoundSchedule
// ---------------------------------------------------------------------------

/// Second-of-minute boundaries of the round cycle.
///
/// Each field is the exclusive end of its phase; `Ended` always runs to the
/// top of the next minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSchedule {
    pub waiting_end: u32,
    pub cleanup_end: u32,
    pub preparing_end: u32,
    pub playing_end: u32,
}

impl Default for RoundSchedule {
    fn default() -> Self {
        Self {
            waiting_end: 5,
            cleanup_end: 10,
            preparing_end: 15,
            playing_end: 59,
        }
    }
}

impl RoundSchedule {
    /// Clamps the boundaries into a usable shape: strictly increasing and
    /// all within the minute. Called by the room layer before use.
    pub fn validated(mut self) -> Self {
        if self.playing_end > 59 {
            warn!(playing_end = self.playing_end, "playing_end past the minute, clamping");
            self.playing_end = 59;
        }
        if self.preparing_end >= self.playing_end {
            self.preparing_end = self.playing_end.saturating_sub(1);
        }
        if self.cleanup_end >= self.preparing_end {
            self.cleanup_end = self.preparing_end.saturating_sub(1);
        }
        if self.waiting_end >= self.cleanup_end {
            self.waiting_end = self.cleanup_end.saturating_sub(1);
        }
        self
    }

    /// The phase that holds at a given second-of-minute.
    pub fn phase_at(&self, second: u32) -> RoundPhase {
        match second {
            s if s < self.waiting_end => RoundPhase::Waiting,
            s if s < self.cleanup_end => RoundPhase::Cleanup,
            s if s < self.preparing_end => RoundPhase::Preparing,
            s if s < self.playing_end => RoundPhase::Playing,
            _ => RoundPhase::Ended,
        }
    }

    /// The phase that holds right now.
    pub fn phase_now(&self, now: DateTime<Utc>) -> RoundPhase {
        self.phase_at(now.second())
    }

    /// The second-of-minute at which a phase hands over. `Ended` hands over
    /// at the top of the next minute (reported as 60).
    pub fn phase_end_second(&self, phase: RoundPhase) -> u32 {
        match phase {
            RoundPhase::Waiting => self.waiting_end,
            RoundPhase::Cleanup => self.cleanup_end,
            RoundPhase::Preparing => self.preparing_end,
            RoundPhase::Playing => self.playing_end,
            RoundPhase::Ended => 60,
        }
    }

    /// Wall-clock end of the phase that holds at `now`.
    pub fn phase_end_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let end = self.phase_end_second(self.phase_now(now));
        if end >= 60 {
            at_second(now + TimeDelta::seconds(60), 0)
        } else {
            at_second(now, end)
        }
    }

    /// Whole seconds until the current phase hands over.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.phase_end_time(now) - now).num_seconds()
    }

    /// The next instant at which players are seated (the next Preparing
    /// boundary). Late joiners and the room-status probe both report this.
    pub fn next_round_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let preparing_start = self.cleanup_end;
        if now.second() < preparing_start {
            at_second(now, preparing_start)
        } else {
            at_second(now + TimeDelta::seconds(60), preparing_start)
        }
    }
}

/// This minute at `second`, with sub-second precision dropped.
fn at_second(now: DateTime<Utc>, second: u32) -> DateTime<Utc> {
    now.with_nanosecond(0)
        .and_then(|t| t.with_second(second))
        .unwrap_or(now)
}

// ---------------------------------------------------------------------------
// RoundTicker
// ---------------------------------------------------------------------------

/// Tick granularity of the round scheduler.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Drives a room's scheduler at [`TICK_INTERVAL`].
///
/// Missed ticks are skipped rather than replayed: phase detection is keyed
/// to the wall clock, so catching up on stale ticks would only re-observe
/// the current phase.
pub struct RoundTicker {
    interval: Interval,
}

impl RoundTicker {
    pub fn new() -> Self {
        let mut interval = time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Waits for the next tick and returns the wall-clock time at which it
    /// fired.
    pub async fn tick(&mut self) -> DateTime<Utc> {
        self.interval.tick().await;
        Utc::now()
    }
}

impl Default for RoundTicker {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
