//! Server-synthesized system messages
//!
//! System messages are routed through the same `message` event as user
//! chat, tagged with the "system" sender and kind so clients render them
//! distinctly. This is a set of helpers invoked synchronously by the
//! handlers, not a separate component.

use parlor_common::SYSTEM_SENDER;
use parlor_common::protocol::{ChatMessage, MessageKind, ServerEvent};

use super::current_timestamp_millis;

fn system_message(body: String, room_id: Option<String>) -> ServerEvent {
    ServerEvent::Message {
        message: ChatMessage {
            sender: SYSTEM_SENDER.to_string(),
            body,
            kind: MessageKind::System,
            room_id,
            file: None,
            sent_at: current_timestamp_millis(),
        },
    }
}

/// Welcome sent to a connection right after its identity is attached
pub fn welcome(nickname: &str) -> ServerEvent {
    system_message(format!("Welcome, {}", nickname), None)
}

/// Welcome sent to a connection that just joined a room
pub fn room_welcome(room_name: &str, room_id: &str) -> ServerEvent {
    system_message(
        format!("Welcome to {}", room_name),
        Some(room_id.to_string()),
    )
}

/// Join notice sent to a room, excluding the joining connection
pub fn user_joined(nickname: &str, room_id: &str) -> ServerEvent {
    system_message(
        format!("{} joined the room", nickname),
        Some(room_id.to_string()),
    )
}

/// Leave notice sent to a room's remaining members
pub fn user_left(nickname: &str, room_id: &str) -> ServerEvent {
    system_message(
        format!("{} left the room", nickname),
        Some(room_id.to_string()),
    )
}

/// Deletion notice sent to the deleted room's members
///
/// Carries no room id: by the time it is delivered the members' room
/// assignment is already cleared.
pub fn room_deleted(room_name: &str) -> ServerEvent {
    system_message(format!("Room {} was deleted by its owner", room_name), None)
}

/// Sent to a session evicted by a newer login for the same user
pub fn superseded() -> ServerEvent {
    system_message("You signed in from another connection".to_string(), None)
}

/// Guidance for chat attempts with no identity attached
pub fn sign_in_first() -> ServerEvent {
    system_message("Sign in before sending messages".to_string(), None)
}

/// Guidance for chat attempts outside any room
pub fn join_a_room_first() -> ServerEvent {
    system_message("Join or create a room first".to_string(), None)
}
