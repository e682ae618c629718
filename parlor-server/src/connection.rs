//! Client connection handling
//!
//! One task per WebSocket session. The loop multiplexes inbound frames
//! with the connection's outbound channel; queued outbound events are
//! drained before the next inbound frame is processed, so every broadcast
//! a handler enqueued is on the wire (per recipient) in enqueue order.

use std::io;
use std::net::SocketAddr;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::{
    ClientEvent, ClientFrame, PresenceStatus, ServerEvent, ServerFrame,
};

use crate::archive::Archive;
use crate::handlers::{self, HandlerContext, broadcast_room_users, system};
use crate::rooms::Directory;
use crate::users::{Outbound, Registry};

/// Maximum size of a single inbound frame (16 MB)
///
/// File messages carry base64 data URLs, so frames are allowed to be
/// large, but not unbounded: anything bigger is rejected without parsing
/// to keep a hostile client from exhausting memory.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Parameters for handling a connection
#[derive(Clone)]
pub struct ConnectionParams {
    pub peer_addr: SocketAddr,
    pub registry: Registry,
    pub rooms: Directory,
    pub archive: Option<Archive>,
    pub debug: bool,
}

/// Connection state for a single client
///
/// Identity fields are set once, at the userJoin announce, and survive in
/// the loop even if the registry entry is evicted by a newer login; the
/// disconnect unwind still needs the nickname for leave notices.
pub struct ConnectionState {
    pub session_id: Option<u32>,
    pub user_id: Option<String>,
    pub nickname: Option<String>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            session_id: None,
            user_id: None,
            nickname: None,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle one session over any WebSocket-message stream
///
/// Generic so tests can drive a mock socket; the real acceptor lives in
/// the `websocket` module.
pub async fn handle_session<S>(stream: S, params: ConnectionParams) -> io::Result<()>
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    let ConnectionParams {
        peer_addr,
        registry,
        rooms,
        archive,
        debug,
    } = params;

    let (mut writer, mut reader) = stream.split();

    // Channel for events other connections (and handlers) queue for this client
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    let mut state = ConnectionState::new();

    loop {
        tokio::select! {
            // Drain queued outbound events before reading the next frame,
            // so notifications describing one state transition are sent
            // before the next transition is processed.
            biased;

            queued = rx.recv() => {
                match queued {
                    Some(Outbound::Event(event)) => {
                        if write_event(&mut writer, None, event).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Shutdown) => {
                        let _ = writer.send(Message::Close(None)).await;
                        break;
                    }
                    // Unreachable while `tx` is alive above, but a closed
                    // channel still means this connection is done.
                    None => break,
                }
            }

            frame = reader.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_FRAME_SIZE {
                            if debug {
                                eprintln!(
                                    "Frame too large from {}: {} bytes",
                                    peer_addr,
                                    text.len()
                                );
                            }
                            let event = ServerEvent::Error {
                                message: "Frame too large".to_string(),
                            };
                            if write_event(&mut writer, None, event).await.is_err() {
                                break;
                            }
                            continue;
                        }

                        match serde_json::from_str::<ClientFrame>(text.as_str()) {
                            Ok(frame) => {
                                let mut ctx = HandlerContext {
                                    writer: &mut writer,
                                    peer_addr,
                                    registry: &registry,
                                    rooms: &rooms,
                                    archive: archive.as_ref(),
                                    tx: &tx,
                                    seq: frame.seq,
                                    debug,
                                };

                                if let Err(e) = handle_client_event(frame.event, &mut state, &mut ctx).await {
                                    if debug {
                                        eprintln!("Error handling event from {}: {}", peer_addr, e);
                                    }
                                    break;
                                }
                            }
                            Err(e) => {
                                // Malformed input costs the frame, not the connection
                                if debug {
                                    eprintln!("Malformed frame from {}: {}", peer_addr, e);
                                }
                                let event = ServerEvent::Error {
                                    message: "Malformed frame".to_string(),
                                };
                                if write_event(&mut writer, None, event).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {
                        // The protocol is text-only; tungstenite answers pings itself
                    }
                    Some(Err(e)) => {
                        if debug {
                            eprintln!("WebSocket error from {}: {}", peer_addr, e);
                        }
                        break;
                    }
                }
            }
        }
    }

    let _ = writer.close().await;

    // Disconnect unwind: room membership first, then presence, so there is
    // no window where the user is shown online but missing from every
    // member list (or the reverse) past the end of this handler.
    if let Some(session_id) = state.session_id {
        let nickname = state.nickname.clone().unwrap_or_default();

        if let Some(outcome) = rooms.remove_session(session_id).await {
            registry
                .send_many(
                    &outcome.remaining,
                    system::user_left(&nickname, &outcome.room_id),
                )
                .await;
            broadcast_room_users(&registry, &rooms, &outcome.room_id).await;
        }

        // Detach returns None when a newer login already evicted this
        // session; presence was rebroadcast at that point.
        if let Some(session) = registry.detach(session_id).await {
            if debug {
                println!("User '{}' disconnected", session.nickname);
            }
            registry
                .broadcast(ServerEvent::UserStatus {
                    user_id: session.user_id,
                    status: PresenceStatus::Offline,
                })
                .await;
            registry.broadcast_presence().await;
        }
    }

    Ok(())
}

async fn write_event<W>(writer: &mut W, seq: Option<u64>, event: ServerEvent) -> io::Result<()>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    let frame = ServerFrame { seq, event };
    let json = serde_json::to_string(&frame).map_err(io::Error::other)?;
    writer
        .send(Message::text(json))
        .await
        .map_err(io::Error::other)
}

/// Dispatch one event from the client
async fn handle_client_event<W>(
    event: ClientEvent,
    state: &mut ConnectionState,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    match event {
        ClientEvent::UserJoin { id, nickname } => {
            handlers::handle_user_join(id, nickname, state, ctx).await
        }
        ClientEvent::CreateRoom { name, description } => {
            handlers::handle_create_room(name, description, state.session_id, ctx).await
        }
        ClientEvent::GetRooms => handlers::handle_get_rooms(ctx).await,
        ClientEvent::JoinRoom { room_id } => {
            handlers::handle_join_room(room_id, state.session_id, ctx).await
        }
        ClientEvent::LeaveRoom => handlers::handle_leave_room(state.session_id, ctx).await,
        ClientEvent::DeleteRoom { room_id } => {
            handlers::handle_delete_room(room_id, state.session_id, ctx).await
        }
        ClientEvent::ChatMessage { message } => {
            handlers::handle_chat_message(message, state.session_id, ctx).await
        }
        ClientEvent::EmojiMessage { emoji } => {
            handlers::handle_emoji_message(emoji, state.session_id, ctx).await
        }
        ClientEvent::FileMessage { file } => {
            handlers::handle_file_message(file, state.session_id, ctx).await
        }
        ClientEvent::Typing { is_typing } => {
            handlers::handle_typing(is_typing, state.session_id, ctx).await
        }
        ClientEvent::Away => handlers::handle_away(state.session_id, ctx).await,
        ClientEvent::Back => handlers::handle_back(state.session_id, ctx).await,
    }
}
