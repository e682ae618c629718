//! Room types for the directory
//!
//! This module contains the core data structures used by the room
//! directory and membership coordinator.

use std::collections::HashSet;

use parlor_common::protocol::RoomInfo;

/// State for a single room
#[derive(Debug, Clone)]
pub struct Room {
    /// Generated nine-digit numeric id
    pub id: String,
    /// Display name (trimmed, non-empty)
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Nickname of the owning user
    pub created_by: String,
    /// Creation time (Unix milliseconds)
    pub created_at: i64,
    /// Monotonic creation sequence, used to order the room list
    /// deterministically when two rooms share a millisecond
    pub created_seq: u64,
    /// Session ids of connections currently in this room
    pub members: HashSet<u32>,
}

impl Room {
    /// Check if the room has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a session is a member of this room
    pub fn has_member(&self, session_id: u32) -> bool {
        self.members.contains(&session_id)
    }

    /// Build the client-facing descriptor with the derived member count
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            user_count: self.members.len() as u32,
        }
    }
}

/// Error when creating a room fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    /// Room name trims to empty
    EmptyName,
    /// Id generation exhausted its retry budget
    IdSpaceExhausted,
}

/// Error when joining a room fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// Room does not exist (or was deleted)
    NotFound,
}

/// Error when deleting a room fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// Room does not exist
    NotFound,
    /// Requester is not the room owner
    NotOwner,
}

/// The room a session implicitly left when joining another
#[derive(Debug)]
pub struct Departed {
    pub room_id: String,
    /// Remaining member session ids (for broadcasting the leave)
    pub remaining: Vec<u32>,
}

/// Result of joining a room
#[derive(Debug)]
pub struct JoinOutcome {
    /// Descriptor of the joined room, member count already updated
    pub room: RoomInfo,
    /// The session was already in this room; nothing changed
    pub already_member: bool,
    /// Set when the join implicitly left another room
    pub departed: Option<Departed>,
}

/// Result of leaving a room
#[derive(Debug)]
pub struct LeaveOutcome {
    pub room_id: String,
    /// Remaining member session ids (for broadcasting the leave)
    pub remaining: Vec<u32>,
}

/// Result of deleting a room
#[derive(Debug)]
pub struct DeleteOutcome {
    /// The deleted room's name, for notifications
    pub room_name: String,
    /// Sessions whose room assignment was cleared by the deletion
    pub evicted: Vec<u32>,
}
