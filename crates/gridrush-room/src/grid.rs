//! Grid and item store for one room.
//!
//! All fields are owned exclusively by the room engine task; nothing here
//! is synchronized. The store keeps two views in lockstep: `positions`
//! (player → cell) and `occupied` (cell → occupant), plus the item map and
//! the score accumulator.
//!
//! Items deliberately do not block movement — a player steps onto an item's
//! cell to collect it — so they live outside `occupied`. Obstacles and
//! players block.

use std::collections::HashMap;

use gridrush_protocol::{Item, ItemKind, ItemPosition, Position, UserId};
use rand::Rng;

/// What blocks a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupant {
    Obstacle,
    Player(UserId),
}

/// Why a move request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The mover has no stored position.
    UnknownPlayer,
    /// The target cell is outside the grid.
    OutOfGrid,
    /// The target is more than one step away (diagonals included).
    TooFar,
    /// The target cell holds an obstacle or another player.
    Occupied,
}

/// The authoritative per-round grid state.
#[derive(Debug, Default)]
pub struct GridState {
    occupied: HashMap<String, Occupant>,
    obstacles: Vec<Position>,
    items: HashMap<String, ItemPosition>,
    positions: HashMap<UserId, Position>,
    scores: HashMap<UserId, i32>,
}

impl GridState {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell_free(&self, key: &str) -> bool {
        !self.occupied.contains_key(key) && !self.items.contains_key(key)
    }

    /// Places up to `count` obstacles on random free cells.
    ///
    /// Sampling covers `[0, grid_size - 1)²`, retrying on collisions with a
    /// `grid_size²` bound on total attempts, so a saturated grid yields
    /// fewer obstacles instead of an unbounded loop. Returns how many were
    /// placed.
    pub fn place_obstacles(
        &mut self,
        count: usize,
        grid_size: i32,
        rng: &mut impl Rng,
    ) -> usize {
        let max_attempts = (grid_size as usize).saturating_mul(grid_size as usize);
        let mut placed = 0;
        let mut attempts = 0;

        while placed < count && attempts < max_attempts {
            attempts += 1;
            let cell = random_cell(grid_size, rng);
            let key = cell.cell_key();
            if !self.cell_free(&key) {
                continue;
            }
            self.occupied.insert(key, Occupant::Obstacle);
            self.obstacles.push(cell);
            placed += 1;
        }
        placed
    }

    /// Places up to `count` items of one kind, same retry discipline as
    /// [`place_obstacles`](Self::place_obstacles). Returns how many were
    /// placed.
    pub fn place_items(
        &mut self,
        kind: ItemKind,
        value: i32,
        count: usize,
        grid_size: i32,
        rng: &mut impl Rng,
    ) -> usize {
        let max_attempts = (grid_size as usize).saturating_mul(grid_size as usize);
        let mut placed = 0;
        let mut attempts = 0;

        while placed < count && attempts < max_attempts {
            attempts += 1;
            let cell = random_cell(grid_size, rng);
            let key = cell.cell_key();
            if !self.cell_free(&key) {
                continue;
            }
            self.items.insert(
                key,
                ItemPosition {
                    item: Item { kind, value },
                    position: cell,
                },
            );
            placed += 1;
        }
        placed
    }

    /// Seats a player on a random free cell and opens their score at zero.
    ///
    /// Start cells avoid obstacles, other players, and items, so no round
    /// begins with an item under a player. Returns `None` if the retry
    /// bound is exhausted. Re-seating an already seated player returns
    /// their current cell unchanged.
    pub fn assign_start(
        &mut self,
        user_id: &UserId,
        grid_size: i32,
        rng: &mut impl Rng,
    ) -> Option<Position> {
        if let Some(existing) = self.positions.get(user_id) {
            return Some(*existing);
        }

        let max_attempts = (grid_size as usize).saturating_mul(grid_size as usize);
        for _ in 0..max_attempts {
            let cell = random_cell(grid_size, rng);
            let key = cell.cell_key();
            if !self.cell_free(&key) {
                continue;
            }
            self.occupied.insert(key, Occupant::Player(user_id.clone()));
            self.positions.insert(user_id.clone(), cell);
            self.scores.entry(user_id.clone()).or_insert(0);
            return Some(cell);
        }
        None
    }

    /// Applies a move request. On success the occupancy and position maps
    /// are updated together and the previous cell is returned.
    ///
    /// A zero-distance move is accepted without touching state — it is the
    /// client's resync tool.
    pub fn move_player(
        &mut self,
        user_id: &UserId,
        to: Position,
        grid_size: i32,
    ) -> Result<Position, MoveError> {
        let from = *self
            .positions
            .get(user_id)
            .ok_or(MoveError::UnknownPlayer)?;

        if !to.in_bounds(grid_size) {
            return Err(MoveError::OutOfGrid);
        }
        if from.step_distance(to) > 1 {
            return Err(MoveError::TooFar);
        }
        if from == to {
            return Ok(from);
        }
        if self.occupied.contains_key(&to.cell_key()) {
            return Err(MoveError::Occupied);
        }

        self.occupied.remove(&from.cell_key());
        self.occupied
            .insert(to.cell_key(), Occupant::Player(user_id.clone()));
        self.positions.insert(user_id.clone(), to);
        Ok(from)
    }

    pub fn item_at(&self, key: &str) -> Option<&ItemPosition> {
        self.items.get(key)
    }

    pub fn remove_item(&mut self, key: &str) -> Option<ItemPosition> {
        self.items.remove(key)
    }

    /// Adds `value` to the player's score and returns the new total.
    pub fn update_score(&mut self, user_id: &UserId, value: i32) -> i32 {
        let score = self.scores.entry(user_id.clone()).or_insert(0);
        *score += value;
        *score
    }

    /// Drops every trace of a player (position, occupancy, score).
    pub fn remove_player(&mut self, user_id: &UserId) {
        if let Some(position) = self.positions.remove(user_id) {
            self.occupied.remove(&position.cell_key());
        }
        self.scores.remove(user_id);
    }

    /// Clears all round state. Runs at the Cleanup boundary.
    pub fn clear(&mut self) {
        self.occupied.clear();
        self.obstacles.clear();
        self.items.clear();
        self.positions.clear();
        self.scores.clear();
    }

    pub fn occupant(&self, key: &str) -> Option<&Occupant> {
        self.occupied.get(key)
    }

    pub fn position_of(&self, user_id: &UserId) -> Option<Position> {
        self.positions.get(user_id).copied()
    }

    pub fn score_of(&self, user_id: &UserId) -> Option<i32> {
        self.scores.get(user_id).copied()
    }

    pub fn obstacles(&self) -> &[Position] {
        &self.obstacles
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemPosition> {
        self.items.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = (&UserId, &Position)> {
        self.positions.iter()
    }

    pub fn scores(&self) -> impl Iterator<Item = (&UserId, &i32)> {
        self.scores.iter()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn player_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_cleared(&self) -> bool {
        self.occupied.is_empty()
            && self.obstacles.is_empty()
            && self.items.is_empty()
            && self.positions.is_empty()
            && self.scores.is_empty()
    }

    // -- test seams -------------------------------------------------------

    /// Seats a player on an exact cell.
    #[cfg(test)]
    pub(crate) fn force_place_player(&mut self, user_id: &UserId, position: Position) {
        self.occupied
            .insert(position.cell_key(), Occupant::Player(user_id.clone()));
        self.positions.insert(user_id.clone(), position);
        self.scores.entry(user_id.clone()).or_insert(0);
    }

    /// Places an item on an exact cell.
    #[cfg(test)]
    pub(crate) fn force_place_item(&mut self, kind: ItemKind, value: i32, position: Position) {
        self.items.insert(
            position.cell_key(),
            ItemPosition {
                item: Item { kind, value },
                position,
            },
        );
    }

    /// Places an obstacle on an exact cell.
    #[cfg(test)]
    pub(crate) fn force_place_obstacle(&mut self, position: Position) {
        self.occupied
            .insert(position.cell_key(), Occupant::Obstacle);
        self.obstacles.push(position);
    }

    /// Asserts the cross-map invariants: positions/occupied mutually
    /// consistent, one occupant per cell, everything in bounds, items never
    /// under obstacles.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self, grid_size: i32) {
        let player_cells = self
            .occupied
            .iter()
            .filter(|(_, occupant)| matches!(occupant, Occupant::Player(_)))
            .count();
        assert_eq!(
            player_cells,
            self.positions.len(),
            "occupied player cells must mirror the positions map"
        );

        for (user_id, position) in &self.positions {
            assert!(position.in_bounds(grid_size), "{user_id} out of bounds");
            assert_eq!(
                self.occupied.get(&position.cell_key()),
                Some(&Occupant::Player(user_id.clone())),
                "positions[{user_id}] not reflected in occupied"
            );
        }
        for obstacle in &self.obstacles {
            assert!(obstacle.in_bounds(grid_size));
            assert_eq!(
                self.occupied.get(&obstacle.cell_key()),
                Some(&Occupant::Obstacle)
            );
        }
        for (key, item) in &self.items {
            assert_eq!(*key, item.position.cell_key());
            assert!(item.position.in_bounds(grid_size));
            assert_ne!(
                self.occupied.get(key),
                Some(&Occupant::Obstacle),
                "item stacked on an obstacle at {key}"
            );
        }
    }
}

/// A random cell in `[0, grid_size - 1)²`, the placement sampling range.
fn random_cell(grid_size: i32, rng: &mut impl Rng) -> Position {
    let bound = (grid_size - 1).max(1);
    Position::new(rng.random_range(0..bound), rng.random_range(0..bound))
}

// =========================================================================
// Tests
// =========================================================================
