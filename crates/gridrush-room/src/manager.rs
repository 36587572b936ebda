//! Room directory: named rooms created at startup.

use std::collections::HashMap;

use gridrush_protocol::RoomId;
use gridrush_tick::RoundSchedule;

use crate::{ArenaConfig, Room};

/// Owns every room in the process. Built once at startup and read-only
/// afterwards, so callers share it behind an `Arc` without further locking.
#[derive(Default)]
pub struct RoomManager {
    rooms: HashMap<RoomId, Room>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room, launching its engine and scheduler tasks, and
    /// returns a handle to it.
    pub fn create_room(
        &mut self,
        id: RoomId,
        config: ArenaConfig,
        schedule: RoundSchedule,
    ) -> Room {
        let room = Room::spawn(id.clone(), config, schedule);
        tracing::info!(room_id = %id, "room created");
        self.rooms.insert(id, room.clone());
        room
    }

    pub fn get(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
