//! Handler for the typing indicator
//!
//! Relayed to the sender's current room only, excluding the typist.
//! No state change and no response; out-of-sequence indicators are
//! silently dropped.

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::ServerEvent;

use super::HandlerContext;

/// Handle the typing event
pub async fn handle_typing<W>(
    is_typing: bool,
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let Some(session_id) = session_id else {
        return Ok(());
    };
    let Some(session) = ctx.registry.get(session_id).await else {
        return Ok(());
    };
    let Some(room_id) = ctx.rooms.current_room(session_id).await else {
        return Ok(());
    };

    let Some(members) = ctx.rooms.member_sessions(&room_id).await else {
        return Ok(());
    };
    let others: Vec<u32> = members
        .into_iter()
        .filter(|id| *id != session_id)
        .collect();

    ctx.registry
        .send_many(
            &others,
            ServerEvent::UserTyping {
                nickname: session.nickname,
                is_typing,
                room_id,
            },
        )
        .await;

    Ok(())
}
