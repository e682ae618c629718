//! Protocol definitions for the Parlor chat server
//!
//! All events are sent as JSON text frames over WebSocket. Inbound frames
//! are a [`ClientFrame`]: an internally-tagged [`ClientEvent`] plus an
//! optional `seq` correlation id. Requests that expect an acknowledgment
//! carry `seq`; the matching `*Response` event echoes it so the client can
//! pair acks with requests.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Client request events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Announce the connection's identity (resolved by the external
    /// account layer). Idempotent: a second announce on the same
    /// connection is a no-op.
    UserJoin { id: String, nickname: String },
    /// Create a new room
    CreateRoom {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Request the room list
    GetRooms,
    /// Join a room (implicitly leaving the current one)
    JoinRoom { room_id: String },
    /// Leave the current room (no-op when not in a room)
    LeaveRoom,
    /// Delete a room (owner only)
    DeleteRoom { room_id: String },
    /// Send a text message to the current room
    ChatMessage { message: String },
    /// Send an emoji to the current room
    EmojiMessage { emoji: String },
    /// Share a file with the current room
    FileMessage { file: FileInfo },
    /// Typing indicator, relayed to the current room
    Typing { is_typing: bool },
    /// Mark this user as away (connection stays up)
    Away,
    /// Mark this user as back online
    Back,
}

/// Server events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Full presence snapshot, sent whenever it changes
    OnlineUsers { users: Vec<OnlineUser> },
    /// Full room directory, sent after identity announce
    RoomList { rooms: Vec<RoomInfo> },
    /// A room was created
    NewRoom { room: RoomInfo },
    /// A room was deleted by its owner
    RoomDeleted { room_id: String, room_name: String },
    /// Membership snapshot for one room
    RoomUsers {
        room_id: String,
        users: Vec<OnlineUser>,
    },
    /// Chat or system message
    Message { message: ChatMessage },
    /// A user's presence status changed
    UserStatus {
        user_id: String,
        status: PresenceStatus,
    },
    /// Someone in the room started or stopped typing
    UserTyping {
        nickname: String,
        is_typing: bool,
        room_id: String,
    },
    /// Transport-level error (malformed frame, invalid input)
    Error { message: String },
    /// Acknowledgment for `createRoom`
    CreateRoomResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomInfo>,
    },
    /// Acknowledgment for `getRooms`
    RoomListResponse {
        success: bool,
        rooms: Vec<RoomInfo>,
    },
    /// Acknowledgment for `joinRoom`
    JoinRoomResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomInfo>,
    },
    /// Acknowledgment for `leaveRoom`
    LeaveRoomResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    /// Acknowledgment for `deleteRoom`
    DeleteRoomResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
}

/// Inbound frame: an event plus an optional ack correlation id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub event: ClientEvent,
}

/// Outbound frame: `seq` is present only on acknowledgments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub event: ServerEvent,
}

/// One identified connection, as shown in presence and room member lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    /// User id from the external account store
    pub id: String,
    pub nickname: String,
    /// Server-assigned connection id
    pub session_id: u32,
}

/// Room descriptor as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    /// Generated nine-digit numeric id
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Nickname of the owning user
    pub created_by: String,
    /// Unix milliseconds
    pub created_at: i64,
    /// Number of connections currently in the room (derived)
    pub user_count: u32,
}

/// Kind tag for chat messages
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    Text,
    Emoji,
    File,
    System,
}

/// Presence status values carried by `userStatus` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    Offline,
}

/// File descriptor attached to file messages
///
/// The data URL is produced by the external upload layer; this core treats
/// it as an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub data_url: String,
}

/// A chat or system message as broadcast to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Sender nickname, or "system" for synthesized messages
    pub sender: String,
    pub body: String,
    pub kind: MessageKind,
    /// Target room; `None` for connection-scoped system messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileInfo>,
    /// Unix milliseconds at send time
    pub sent_at: i64,
}
