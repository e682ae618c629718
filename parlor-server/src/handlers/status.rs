//! Handlers for the away/back presence events
//!
//! These only change the advertised status; the connection and any room
//! membership are untouched.

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::{PresenceStatus, ServerEvent};

use super::HandlerContext;

/// Handle the away event
pub async fn handle_away<W>(
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    broadcast_status(session_id, PresenceStatus::Away, ctx).await
}

/// Handle the back event
pub async fn handle_back<W>(
    session_id: Option<u32>,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    broadcast_status(session_id, PresenceStatus::Online, ctx).await
}

async fn broadcast_status<W>(
    session_id: Option<u32>,
    status: PresenceStatus,
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

    ctx.registry
        .broadcast(ServerEvent::UserStatus {
            user_id: session.user_id,
            status,
        })
        .await;

    Ok(())
}
