//! Session representation for identified connections

use std::net::SocketAddr;

use parlor_common::protocol::ServerEvent;
use tokio::sync::mpsc;

/// Messages delivered to a connection's event loop
#[derive(Debug)]
pub enum Outbound {
    /// Serialize and send this event to the client
    Event(ServerEvent),
    /// Close the connection (sent when a newer login supersedes this session)
    Shutdown,
}

/// Sender half of a connection's outbound channel
pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Parameters for registering a new session
pub struct NewSessionParams {
    /// User id from the external account store
    pub user_id: String,
    pub nickname: String,
    /// Remote address of the connection
    pub address: SocketAddr,
    /// Channel sender for delivering events to this connection
    pub tx: OutboundSender,
}

/// An identified connection
#[derive(Debug, Clone)]
pub struct Session {
    /// Server-assigned connection id, unique for the process lifetime
    pub session_id: u32,
    /// User id from the external account store
    pub user_id: String,
    pub nickname: String,
    /// Remote address of the connection
    pub address: SocketAddr,
    /// When the identity was attached (Unix seconds)
    pub connected_at: i64,
    /// Channel sender for delivering events to this connection
    pub tx: OutboundSender,
}

impl Session {
    /// Deliver an event to this connection, ignoring send errors
    ///
    /// A closed channel means the connection is already tearing down; its
    /// own disconnect path cleans up registry state.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.tx.send(Outbound::Event(event));
    }

    /// Ask this connection's event loop to close the socket
    pub fn shutdown(&self) {
        let _ = self.tx.send(Outbound::Shutdown);
    }
}
