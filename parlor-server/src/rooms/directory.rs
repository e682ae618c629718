//! Room directory and per-session membership index
//!
//! Rooms and the session-to-room index live behind one lock so that every
//! transition (create, join with implicit leave, leave, delete with member
//! eviction) is atomic: at any observation point a room's member set is
//! exactly the sessions whose current room is that room. Rooms persist
//! while empty; only their owner removes them.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::RngExt;
use tokio::sync::RwLock;

use parlor_common::protocol::RoomInfo;

use super::types::{
    CreateError, DeleteError, DeleteOutcome, Departed, JoinError, JoinOutcome, LeaveOutcome, Room,
};

/// Room ids are drawn from the nine-digit numeric space
const ROOM_ID_RANGE: RangeInclusive<u64> = 100_000_000..=999_999_999;

/// Retry cap for id generation before giving up
///
/// A saturated id space never happens at realistic room counts, but the
/// generation loop must still terminate.
const MAX_ID_ATTEMPTS: u32 = 64;

#[derive(Debug, Default)]
struct DirectoryState {
    /// Map of room id -> Room
    rooms: HashMap<String, Room>,
    /// Map of session id -> current room id
    memberships: HashMap<u32, String>,
}

/// Manages all rooms and which room each session is in
#[derive(Debug, Clone)]
pub struct Directory {
    state: Arc<RwLock<DirectoryState>>,
    next_seq: Arc<AtomicU64>,
}

impl Directory {
    /// Create a new empty directory
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(DirectoryState::default())),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a room and return its descriptor
    ///
    /// The room is visible to `list()` immediately. The owner is not
    /// auto-joined; joining is a separate explicit step.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: &str,
    ) -> Result<RoomInfo, CreateError> {
        self.create_in(name, description, created_by, ROOM_ID_RANGE)
            .await
    }

    /// Create with an explicit id range (narrowed by tests to force
    /// collisions and exhaustion)
    async fn create_in(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: &str,
        id_range: RangeInclusive<u64>,
    ) -> Result<RoomInfo, CreateError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CreateError::EmptyName);
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let mut state = self.state.write().await;

        let id = generate_room_id(&state.rooms, id_range).ok_or(CreateError::IdSpaceExhausted)?;

        let room = Room {
            id: id.clone(),
            name: name.to_string(),
            description,
            created_by: created_by.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
            created_seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            members: std::collections::HashSet::new(),
        };

        let info = room.info();
        state.rooms.insert(id, room);

        Ok(info)
    }

    /// List all rooms, newest first, with derived member counts
    pub async fn list(&self) -> Vec<RoomInfo> {
        let state = self.state.read().await;
        let mut rooms: Vec<&Room> = state.rooms.values().collect();
        rooms.sort_by(|a, b| b.created_seq.cmp(&a.created_seq));
        rooms.iter().map(|r| r.info()).collect()
    }

    /// Get one room's descriptor
    pub async fn get(&self, room_id: &str) -> Option<RoomInfo> {
        let state = self.state.read().await;
        state.rooms.get(room_id).map(Room::info)
    }

    /// Join a room, implicitly leaving the current one
    ///
    /// A session is never a member of two rooms: when it is already in
    /// another room, the returned outcome carries a `departed` record and
    /// the old room's member set was updated in the same critical section.
    /// Re-joining the current room is a no-op reported via `already_member`.
    pub async fn join(&self, session_id: u32, room_id: &str) -> Result<JoinOutcome, JoinError> {
        let mut state = self.state.write().await;

        if !state.rooms.contains_key(room_id) {
            return Err(JoinError::NotFound);
        }

        if state.memberships.get(&session_id).map(String::as_str) == Some(room_id) {
            let room = state.rooms.get(room_id).expect("room checked above");
            return Ok(JoinOutcome {
                room: room.info(),
                already_member: true,
                departed: None,
            });
        }

        let departed = match state.memberships.remove(&session_id) {
            Some(old_room_id) => {
                let remaining = match state.rooms.get_mut(&old_room_id) {
                    Some(old_room) => {
                        old_room.members.remove(&session_id);
                        old_room.members.iter().copied().collect()
                    }
                    None => Vec::new(),
                };
                Some(Departed {
                    room_id: old_room_id,
                    remaining,
                })
            }
            None => None,
        };

        state.memberships.insert(session_id, room_id.to_string());
        let room = state.rooms.get_mut(room_id).expect("room checked above");
        room.members.insert(session_id);

        Ok(JoinOutcome {
            room: room.info(),
            already_member: false,
            departed,
        })
    }

    /// Leave the current room
    ///
    /// Returns `None` when the session is not in any room; that is a
    /// no-op, not an error.
    pub async fn leave(&self, session_id: u32) -> Option<LeaveOutcome> {
        let mut state = self.state.write().await;

        let room_id = state.memberships.remove(&session_id)?;
        let remaining = match state.rooms.get_mut(&room_id) {
            Some(room) => {
                room.members.remove(&session_id);
                room.members.iter().copied().collect()
            }
            None => Vec::new(),
        };

        Some(LeaveOutcome { room_id, remaining })
    }

    /// Clear a session's room assignment on disconnect
    ///
    /// Identical to `leave`; named separately so call sites read as the
    /// disconnect unwind.
    pub async fn remove_session(&self, session_id: u32) -> Option<LeaveOutcome> {
        self.leave(session_id).await
    }

    /// Delete a room, evicting every member
    ///
    /// Only the owner may delete. The room removal and the eviction of all
    /// members happen under one write lock, so a join racing with the
    /// deletion observes either the intact room or `NotFound`, never a
    /// half-deleted one.
    pub async fn delete(
        &self,
        room_id: &str,
        requester: &str,
    ) -> Result<DeleteOutcome, DeleteError> {
        let mut state = self.state.write().await;

        let room = state.rooms.get(room_id).ok_or(DeleteError::NotFound)?;
        if room.created_by != requester {
            return Err(DeleteError::NotOwner);
        }

        let room = state.rooms.remove(room_id).expect("room checked above");
        let evicted: Vec<u32> = room.members.iter().copied().collect();
        for session_id in &evicted {
            state.memberships.remove(session_id);
        }

        Ok(DeleteOutcome {
            room_name: room.name,
            evicted,
        })
    }

    /// The room a session is currently in, if any
    pub async fn current_room(&self, session_id: u32) -> Option<String> {
        let state = self.state.read().await;
        state.memberships.get(&session_id).cloned()
    }

    /// Member session ids for a room
    ///
    /// Returns `None` if the room doesn't exist.
    pub async fn member_sessions(&self, room_id: &str) -> Option<Vec<u32>> {
        let state = self.state.read().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.members.iter().copied().collect())
    }

    /// Check if a room exists
    #[cfg(test)]
    pub async fn exists(&self, room_id: &str) -> bool {
        let state = self.state.read().await;
        state.rooms.contains_key(room_id)
    }

    /// Verify the membership index and room member sets agree
    ///
    /// For every room, the member set must equal the sessions whose
    /// current room is that room.
    #[cfg(test)]
    pub async fn check_invariant(&self) {
        let state = self.state.read().await;
        for (room_id, room) in &state.rooms {
            for session_id in &room.members {
                assert_eq!(
                    state.memberships.get(session_id),
                    Some(room_id),
                    "session {} in room {} without matching assignment",
                    session_id,
                    room_id
                );
            }
        }
        for (session_id, room_id) in &state.memberships {
            let room = state
                .rooms
                .get(room_id)
                .unwrap_or_else(|| panic!("session {} assigned to missing room {}", session_id, room_id));
            assert!(
                room.has_member(*session_id),
                "session {} assigned to room {} but not in member set",
                session_id,
                room_id
            );
        }
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a random unused id, retrying on collision
///
/// Returns `None` once the retry cap is hit.
fn generate_room_id(
    taken: &HashMap<String, Room>,
    range: RangeInclusive<u64>,
) -> Option<String> {
    let mut rng = rand::rng();
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = rng.random_range(range.clone()).to_string();
        if !taken.contains_key(&id) {
            return Some(id);
        }
    }
    None
}
