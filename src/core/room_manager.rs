use std::collections::BTreeMap;
use std::sync::Arc;

use super::{BoardSize, Room, RoomStatus, RoundConfig};

/// Owner of every room, one per board size
///
/// Rooms are created on the first connection to their size and live for the
/// rest of the process. Rooms share nothing with each other.
#[derive(Debug)]
pub struct RoomManager {
    /// Map of board size to its room
    rooms: BTreeMap<BoardSize, Arc<Room>>,
    /// Timing applied to every room created by this manager
    config: RoundConfig,
}

impl RoomManager {
    /// Create a manager with no rooms yet
    pub fn new(config: RoundConfig) -> Self {
        Self {
            rooms: BTreeMap::new(),
            config,
        }
    }

    /// Retrieve the room for a size, creating it on first use
    ///
    /// # Arguments
    ///
    /// * `size` - Board configuration the connection asked for
    pub fn room(&mut self, size: BoardSize) -> Arc<Room> {
        let config = &self.config;
        Arc::clone(self.rooms.entry(size).or_insert_with(|| {
            tracing::info!("Creating room {}", size);
            Room::new(size, config.clone())
        }))
    }

    /// Retrieve an existing room without creating it
    pub fn get_room(&self, size: BoardSize) -> Option<Arc<Room>> {
        self.rooms.get(&size).cloned()
    }

    /// Rooms created so far, ordered by size
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.values().cloned().collect()
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoundConfig::default())
    }
}

/// Get statistics about active rooms
///
/// # Returns
///
/// JSON value with per-room status and totals
pub async fn collect_stats(rooms: &[Arc<Room>]) -> serde_json::Value {
    let mut statuses: Vec<RoomStatus> = Vec::with_capacity(rooms.len());
    for room in rooms {
        statuses.push(room.status().await);
    }

    let total_players: usize = statuses.iter().map(|status| status.players).sum();

    serde_json::json!({
        "total_rooms": statuses.len(),
        "total_players": total_players,
        "rooms": statuses,
    })
}
