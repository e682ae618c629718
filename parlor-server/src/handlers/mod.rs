//! Event handlers for client requests

pub mod errors;
mod message;
mod room_create;
mod room_delete;
mod room_join;
mod room_leave;
mod room_list;
mod status;
pub mod system;
mod typing;
mod user_join;

#[cfg(test)]
pub mod testing;

pub use errors::*;
pub use message::{handle_chat_message, handle_emoji_message, handle_file_message};
pub use room_create::handle_create_room;
pub use room_delete::handle_delete_room;
pub use room_join::handle_join_room;
pub use room_leave::handle_leave_room;
pub use room_list::handle_get_rooms;
pub use status::{handle_away, handle_back};
pub use typing::handle_typing;
pub use user_join::handle_user_join;

use std::io;
use std::net::SocketAddr;

use futures_util::{Sink, SinkExt};
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::{ServerEvent, ServerFrame};

use crate::archive::Archive;
use crate::rooms::Directory;
use crate::users::{OutboundSender, Registry};

/// Context passed to all handlers with shared resources
pub struct HandlerContext<'a, W> {
    /// Sink half of the connection's WebSocket, for direct replies
    pub writer: &'a mut W,
    pub peer_addr: SocketAddr,
    pub registry: &'a Registry,
    pub rooms: &'a Directory,
    /// Optional fire-and-forget archive
    pub archive: Option<&'a Archive>,
    /// Sender for this connection's outbound channel (cloned into the
    /// registry at identity attach)
    pub tx: &'a OutboundSender,
    /// Correlation id from the incoming frame (echoed on acknowledgments)
    pub seq: Option<u64>,
    pub debug: bool,
}

impl<'a, W> HandlerContext<'a, W>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    /// Send an acknowledgment, echoing the request's correlation id
    pub async fn respond(&mut self, event: ServerEvent) -> io::Result<()> {
        let seq = self.seq;
        self.write_frame(ServerFrame { seq, event }).await
    }

    /// Send an event directly to this connection, with no correlation id
    pub async fn send(&mut self, event: ServerEvent) -> io::Result<()> {
        self.write_frame(ServerFrame { seq: None, event }).await
    }

    async fn write_frame(&mut self, frame: ServerFrame) -> io::Result<()> {
        let json = serde_json::to_string(&frame).map_err(io::Error::other)?;
        self.writer
            .send(Message::text(json))
            .await
            .map_err(io::Error::other)
    }
}

/// Recompute a room's member list and broadcast it to the room
///
/// No-op when the room no longer exists (e.g., refresh racing a delete).
pub async fn broadcast_room_users(registry: &Registry, rooms: &Directory, room_id: &str) {
    if let Some(members) = rooms.member_sessions(room_id).await {
        let users = registry.users_for_sessions(&members).await;
        registry
            .send_many(
                &members,
                ServerEvent::RoomUsers {
                    room_id: room_id.to_string(),
                    users,
                },
            )
            .await;
    }
}

/// Get current Unix timestamp in milliseconds
pub fn current_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
