//! Handler for the leaveRoom event

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::ErrorKind;
use parlor_common::protocol::ServerEvent;

use super::{HandlerContext, broadcast_room_users, err_not_signed_in, system};

/// Handle the leaveRoom event
///
/// Leaving while not in any room is a successful no-op, so a client whose
/// room was deleted underneath it can still issue the leave it had queued.
pub async fn handle_leave_room<W>(
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let Some(session_id) = session_id else {
        return ctx
            .respond(ServerEvent::LeaveRoomResponse {
                success: false,
                error: Some(err_not_signed_in()),
                kind: Some(ErrorKind::NotLoggedIn.as_str().to_string()),
            })
            .await;
    };
    let Some(session) = ctx.registry.get(session_id).await else {
        return ctx
            .respond(ServerEvent::LeaveRoomResponse {
                success: false,
                error: Some(err_not_signed_in()),
                kind: Some(ErrorKind::NotLoggedIn.as_str().to_string()),
            })
            .await;
    };

    if let Some(outcome) = ctx.rooms.leave(session_id).await {
        ctx.registry
            .send_many(
                &outcome.remaining,
                system::user_left(&session.nickname, &outcome.room_id),
            )
            .await;
        broadcast_room_users(ctx.registry, ctx.rooms, &outcome.room_id).await;
    }

    ctx.respond(ServerEvent::LeaveRoomResponse {
        success: true,
        error: None,
        kind: None,
    })
    .await
}
