//! Room registry for named fan-out groups
//!
//! Rooms are created by `create_room`, grow as invitees are added, and are
//! never deleted. Disconnects do not prune memberships: a room keeps naming
//! departed identities, and delivery to them simply becomes a no-op.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

/// State for a single room
#[derive(Debug, Clone)]
pub struct Room {
    /// Room name
    pub name: String,
    /// Identity that created the room
    pub creator: String,
    /// Member identities, the creator included
    pub members: HashSet<String>,
}

impl Room {
    /// Create a new room; the creator is its first member
    pub fn new(name: String, creator: String) -> Self {
        let mut members = HashSet::new();
        members.insert(creator.clone());
        Self {
            name,
            creator,
            members,
        }
    }

    /// Check if an identity is a member of this room
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }

    /// Add a member to the room
    pub fn add_member(&mut self, user_id: &str) -> bool {
        self.members.insert(user_id.to_string())
    }
}

/// Manages all rooms
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
}

impl RoomRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a room
    ///
    /// Room names are assumed unique at creation time and never re-checked:
    /// creating a name that already exists replaces the old room outright.
    pub async fn create(&self, name: &str, creator: &str) {
        let mut rooms = self.rooms.write().await;
        rooms.insert(
            name.to_string(),
            Room::new(name.to_string(), creator.to_string()),
        );
    }

    /// Add an identity to a room's member set
    ///
    /// Returns `false` when the room is unknown.
    pub async fn add_member(&self, name: &str, user_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(name) {
            Some(room) => {
                room.add_member(user_id);
                true
            }
            None => false,
        }
    }

    /// Whether a room exists
    pub async fn contains(&self, name: &str) -> bool {
        let rooms = self.rooms.read().await;
        rooms.contains_key(name)
    }

    /// Member identities of a room excluding `except`, for fan-out
    ///
    /// Returns `None` when the room is unknown.
    pub async fn members_except(&self, name: &str, except: &str) -> Option<Vec<String>> {
        let rooms = self.rooms.read().await;
        rooms.get(name).map(|room| {
            room.members
                .iter()
                .filter(|member| member.as_str() != except)
                .cloned()
                .collect()
        })
    }
}
