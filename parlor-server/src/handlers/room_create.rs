//! Handler for the createRoom event

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::ErrorKind;
use parlor_common::protocol::ServerEvent;
use parlor_common::validators;

use super::{
    HandlerContext, err_id_space_exhausted, err_not_signed_in, err_room_name_empty,
    room_description_error_to_message, room_name_error_to_message,
};
use crate::rooms::CreateError;

fn error_response(kind: ErrorKind, error: String) -> ServerEvent {
    ServerEvent::CreateRoomResponse {
        success: false,
        error: Some(error),
        kind: Some(kind.as_str().to_string()),
        room: None,
    }
}

/// Handle the createRoom event
///
/// The created room is acknowledged to the requester and announced to all
/// connections. The creator is not auto-joined; a joinRoom request is
/// expected to follow.
pub async fn handle_create_room<W>(
    name: String,
    description: Option<String>,
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

    if let Err(e) = validators::validate_room_name(&name) {
        return ctx
            .respond(error_response(
                ErrorKind::Validation,
                room_name_error_to_message(e),
            ))
            .await;
    }
    if let Some(ref description) = description
        && let Err(e) = validators::validate_room_description(description)
    {
        return ctx
            .respond(error_response(
                ErrorKind::Validation,
                room_description_error_to_message(e),
            ))
            .await;
    }

    let room = match ctx
        .rooms
        .create(&name, description.as_deref(), &session.nickname)
        .await
    {
        Ok(room) => room,
        Err(CreateError::EmptyName) => {
            return ctx
                .respond(error_response(ErrorKind::Validation, err_room_name_empty()))
                .await;
        }
        Err(CreateError::IdSpaceExhausted) => {
            eprintln!(
                "Room id generation exhausted (requested by {})",
                session.nickname
            );
            return ctx
                .respond(error_response(
                    ErrorKind::IdSpaceExhausted,
                    err_id_space_exhausted(),
                ))
                .await;
        }
    };

    if let Some(archive) = ctx.archive {
        archive.record_room_created(&room);
    }

    // Everyone learns about the new room, the requester also gets the ack
    ctx.registry
        .broadcast(ServerEvent::NewRoom { room: room.clone() })
        .await;

    ctx.respond(ServerEvent::CreateRoomResponse {
        success: true,
        error: None,
        kind: None,
        room: Some(room),
    })
    .await
}
