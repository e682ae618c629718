//! WebSocket acceptor
//!
//! Performs the WebSocket handshake on an accepted TCP socket and hands
//! the stream to the generic session handler.

use std::io;

use tokio::net::TcpStream;

use crate::connection::{ConnectionParams, handle_session};

/// Handle a WebSocket chat connection
pub async fn handle_websocket_connection(
    socket: TcpStream,
    params: ConnectionParams,
) -> io::Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(socket)
        .await
        .map_err(|e| io::Error::other(format!("WebSocket handshake failed: {}", e)))?;

    handle_session(ws_stream, params).await
}
