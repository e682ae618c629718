//! Handler for the joinRoom event
//!
//! A connection is in at most one room: joining while in another room
//! first performs the implicit leave, with the old room's notifications
//! emitted before the new room's.

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::ErrorKind;
use parlor_common::protocol::ServerEvent;

use super::{
    HandlerContext, broadcast_room_users, err_not_signed_in, err_room_not_found, system,
};
use crate::rooms::JoinError;

fn error_response(kind: ErrorKind, error: String) -> ServerEvent {
    ServerEvent::JoinRoomResponse {
        success: false,
        error: Some(error),
        kind: Some(kind.as_str().to_string()),
        room: None,
    }
}

/// Handle the joinRoom event
pub async fn handle_join_room<W>(
    room_id: String,
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let Some(session_id) = session_id else {
        return ctx
            .respond(error_response(ErrorKind::NotLoggedIn, err_not_signed_in()))
            .await;
    };
    let Some(session) = ctx.registry.get(session_id).await else {
        return ctx
            .respond(error_response(ErrorKind::NotLoggedIn, err_not_signed_in()))
            .await;
    };

    let outcome = match ctx.rooms.join(session_id, &room_id).await {
        Ok(outcome) => outcome,
        Err(JoinError::NotFound) => {
            return ctx
                .respond(error_response(
                    ErrorKind::NotFound,
                    err_room_not_found(&room_id),
                ))
                .await;
        }
    };

    // Re-joining the current room changes nothing and notifies nobody
    if outcome.already_member {
        return ctx
            .respond(ServerEvent::JoinRoomResponse {
                success: true,
                error: None,
                kind: None,
                room: Some(outcome.room),
            })
            .await;
    }

    // The old room hears about the departure first
    if let Some(departed) = outcome.departed {
        ctx.registry
            .send_many(
                &departed.remaining,
                system::user_left(&session.nickname, &departed.room_id),
            )
            .await;
        broadcast_room_users(ctx.registry, ctx.rooms, &departed.room_id).await;
    }

    ctx.send(system::room_welcome(&outcome.room.name, &outcome.room.id))
        .await?;

    let members = ctx
        .rooms
        .member_sessions(&outcome.room.id)
        .await
        .unwrap_or_default();
    let others: Vec<u32> = members
        .iter()
        .copied()
        .filter(|id| *id != session_id)
        .collect();
    ctx.registry
        .send_many(
            &others,
            system::user_joined(&session.nickname, &outcome.room.id),
        )
        .await;

    broadcast_room_users(ctx.registry, ctx.rooms, &outcome.room.id).await;

    ctx.respond(ServerEvent::JoinRoomResponse {
        success: true,
        error: None,
        kind: None,
        room: Some(outcome.room),
    })
    .await
}
