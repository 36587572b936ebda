//! Per-room arena configuration.

use serde::{Deserialize, Serialize};

/// Score value of a coin.
pub const COIN_VALUE: i32 = 10;
/// Score value of a diamond.
pub const DIAMOND_VALUE: i32 = 100;

/// Configuration for one grid arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Side length of the square grid.
    pub grid_size: i32,

    /// Obstacles placed per round.
    pub obstacle_count: usize,

    /// Coins placed per round.
    pub coin_count: usize,

    /// Diamonds placed per round.
    pub diamond_count: usize,

    /// When `true`, a session that registers mid-round waits for the next
    /// Preparing phase; when `false`, it is seated immediately.
    pub join_protect: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            grid_size: 15,
            obstacle_count: 10,
            coin_count: 10,
            diamond_count: 2,
            join_protect: true,
        }
    }
}

impl ArenaConfig {
    /// Upper bound on random placement attempts per init pass. A saturated
    /// grid ends placement early instead of spinning forever.
    pub fn max_placement_attempts(&self) -> usize {
        (self.grid_size as usize).saturating_mul(self.grid_size as usize)
    }

    /// Checks the values are usable. The server aborts startup on `Err`.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_size < 2 {
            return Err(format!("grid_size must be at least 2, got {}", self.grid_size));
        }
        let cells = self.max_placement_attempts();
        let wanted = self.obstacle_count + self.coin_count + self.diamond_count;
        if wanted >= cells {
            return Err(format!(
                "{wanted} obstacles/items cannot fit a {} x {} grid with players",
                self.grid_size, self.grid_size
            ));
        }
        Ok(())
    }
}
