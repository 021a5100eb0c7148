//! Room registry: creates rooms on first reference and hands out handles.

use std::collections::HashMap;
use std::sync::Arc;

use quizhub_protocol::RoomId;

use crate::Room;

/// Tracks every room in the process.
///
/// Not thread-safe by itself — the registry is owned by the hub actor,
/// whose event loop is the only code that touches it, so a plain `HashMap`
/// is enough. Handing out `Arc<Room>` lets callers keep operating on a
/// room without holding any registry borrow.
///
/// Rooms are never removed: a finished room stays resident until process
/// exit. Fine for the sample-bank scale this server targets.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Arc<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room with this id, creating it (default config, sample
    /// questions) on first reference.
    pub fn get_or_create(&mut self, id: &RoomId) -> Arc<Room> {
        if let Some(room) = self.rooms.get(id) {
            return Arc::clone(room);
        }
        let room = Arc::new(Room::new(id.clone()));
        self.rooms.insert(id.clone(), Arc::clone(&room));
        tracing::info!(room_id = %id, "room created");
        room
    }

    /// Returns the room with this id, if it exists.
    pub fn get(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(id).map(Arc::clone)
    }

    /// Number of rooms ever created.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_creates_once() {
        let mut registry = RoomRegistry::new();
        assert!(registry.is_empty());

        let a = registry.get_or_create(&RoomId::new("R1"));
        let b = registry.get_or_create(&RoomId::new("R1"));

        assert_eq!(registry.len(), 1);
        // Same allocation, not a second room under the same id.
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_distinct_ids_get_distinct_rooms() {
        let mut registry = RoomRegistry::new();
        let a = registry.get_or_create(&RoomId::new("R1"));
        let b = registry.get_or_create(&RoomId::new("R2"));

        assert_eq!(registry.len(), 2);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_get_without_create_returns_none() {
        let registry = RoomRegistry::new();
        assert!(registry.get(&RoomId::new("nope")).is_none());
    }
}
