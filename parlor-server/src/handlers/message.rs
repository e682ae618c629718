//! Message routing for chat, emoji, and file events
//!
//! The router resolves the sender's current room and broadcasts to exactly
//! its members, sender included: the sender's own UI renders the echo
//! through the same path as remote messages. Out-of-sequence sends never
//! error the connection; the sender alone gets a guiding system message.

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::{ChatMessage, FileInfo, MessageKind, ServerEvent};
use parlor_common::validators;

use super::{HandlerContext, current_timestamp_millis, message_error_to_message, system};

/// Handle the chatMessage event
pub async fn handle_chat_message<W>(
    message: String,
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    route(message, MessageKind::Text, None, session_id, ctx).await
}

/// Handle the emojiMessage event
pub async fn handle_emoji_message<W>(
    emoji: String,
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    route(emoji, MessageKind::Emoji, None, session_id, ctx).await
}

/// Handle the fileMessage event
///
/// The body is synthesized from the file name; the descriptor rides along
/// for the client to render a download link.
pub async fn handle_file_message<W>(
    file: FileInfo,
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let body = format!("shared a file: {}", file.name);
    route(body, MessageKind::File, Some(file), session_id, ctx).await
}

async fn route<W>(
    body: String,
    kind: MessageKind,
    file: Option<FileInfo>,
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let Some(session_id) = session_id else {
        return ctx.send(system::sign_in_first()).await;
    };
    let Some(session) = ctx.registry.get(session_id).await else {
        return ctx.send(system::sign_in_first()).await;
    };

    // File bodies are server-synthesized; only user-typed bodies validate
    if kind != MessageKind::File
        && let Err(e) = validators::validate_message(&body)
    {
        return ctx
            .send(ServerEvent::Error {
                message: message_error_to_message(e),
            })
            .await;
    }

    let Some(room_id) = ctx.rooms.current_room(session_id).await else {
        return ctx.send(system::join_a_room_first()).await;
    };

    let message = ChatMessage {
        sender: session.nickname,
        body,
        kind,
        room_id: Some(room_id.clone()),
        file,
        sent_at: current_timestamp_millis(),
    };

    if let Some(members) = ctx.rooms.member_sessions(&room_id).await {
        ctx.registry
            .send_many(
                &members,
                ServerEvent::Message {
                    message: message.clone(),
                },
            )
            .await;
    }

    // Archival never delays the broadcast
    if let Some(archive) = ctx.archive {
        archive.record_message(&message);
    }

    Ok(())
}
