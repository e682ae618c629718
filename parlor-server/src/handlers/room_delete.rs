//! Handler for the deleteRoom event
//!
//! Every code path acknowledges the request exactly once. The directory
//! removes the room and clears all member assignments atomically, so a
//! join racing the delete observes the room as gone.

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::ErrorKind;
use parlor_common::protocol::ServerEvent;

use super::{
    HandlerContext, err_not_room_owner, err_not_signed_in, err_room_not_found, system,
};
use crate::rooms::DeleteError;

fn error_response(kind: ErrorKind, error: String) -> ServerEvent {
    ServerEvent::DeleteRoomResponse {
        success: false,
        error: Some(error),
        kind: Some(kind.as_str().to_string()),
    }
}

/// Handle the deleteRoom event
pub async fn handle_delete_room<W>(
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

    let outcome = match ctx.rooms.delete(&room_id, &session.nickname).await {
        Ok(outcome) => outcome,
        Err(DeleteError::NotFound) => {
            return ctx
                .respond(error_response(
                    ErrorKind::NotFound,
                    err_room_not_found(&room_id),
                ))
                .await;
        }
        Err(DeleteError::NotOwner) => {
            eprintln!(
                "deleteRoom for {} from {} (not the owner)",
                room_id, session.nickname
            );
            return ctx
                .respond(error_response(ErrorKind::Forbidden, err_not_room_owner()))
                .await;
        }
    };

    if ctx.debug {
        eprintln!(
            "Room '{}' deleted by {}, evicting {} member(s)",
            outcome.room_name,
            session.nickname,
            outcome.evicted.len()
        );
    }

    // Members whose room just vanished get the notice even though their
    // assignment is already cleared; everyone gets the directory update.
    ctx.registry
        .send_many(&outcome.evicted, system::room_deleted(&outcome.room_name))
        .await;
    ctx.registry
        .broadcast(ServerEvent::RoomDeleted {
            room_id: room_id.clone(),
            room_name: outcome.room_name.clone(),
        })
        .await;

    if let Some(archive) = ctx.archive {
        archive.record_room_deleted(&room_id);
    }

    ctx.respond(ServerEvent::DeleteRoomResponse {
        success: true,
        error: None,
        kind: None,
    })
    .await
}
