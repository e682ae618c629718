//! Handler for the getRooms event

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::ServerEvent;

use super::HandlerContext;

/// Handle the getRooms event
///
/// The directory is public: no identity is required to browse it.
pub async fn handle_get_rooms<W>(ctx: &mut HandlerContext<'_, W>) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let rooms = ctx.rooms.list().await;
    ctx.respond(ServerEvent::RoomListResponse {
        success: true,
        rooms,
    })
    .await
}
