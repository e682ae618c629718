//! Connection registry and presence tracking
//!
//! The registry maps server-assigned session ids to identified connections
//! and enforces the single-active-connection-per-user policy: a login on a
//! new connection evicts any previous session for the same user id. The
//! presence snapshot is derived from the registry on every call; there is
//! no separately maintained presence state.

pub mod session;

pub use session::{NewSessionParams, Outbound, OutboundSender, Session};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::RwLock;

use parlor_common::protocol::{OnlineUser, ServerEvent};

/// Result of attaching an identity to a connection
#[derive(Debug)]
pub struct AttachOutcome {
    /// Session id assigned to the announcing connection
    pub session_id: u32,
    /// Prior session for the same user id, removed from the registry.
    ///
    /// The caller is responsible for notifying and shutting it down; its
    /// room membership is cleaned up by that connection's own disconnect
    /// path once the shutdown lands.
    pub evicted: Option<Session>,
}

/// Manages all identified connections
#[derive(Debug, Clone)]
pub struct Registry {
    sessions: Arc<RwLock<HashMap<u32, Session>>>,
    next_id: Arc<AtomicU32>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Generate the next session id
    fn next_session_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Bind an identity to a connection and return the assigned session id
    ///
    /// If another session is already mapped to the same user id it is
    /// removed from the registry and returned in the outcome, so the
    /// caller can notify it before shutting it down. The eviction and the
    /// insert happen under one write lock: no observer sees two sessions
    /// for one user.
    pub async fn attach(&self, params: NewSessionParams) -> AttachOutcome {
        let mut sessions = self.sessions.write().await;

        let evicted_id = sessions
            .values()
            .find(|s| s.user_id == params.user_id)
            .map(|s| s.session_id);
        let evicted = evicted_id.and_then(|id| sessions.remove(&id));

        let session_id = self.next_session_id();
        sessions.insert(
            session_id,
            Session {
                session_id,
                user_id: params.user_id,
                nickname: params.nickname,
                address: params.address,
                connected_at: current_timestamp(),
                tx: params.tx,
            },
        );

        AttachOutcome {
            session_id,
            evicted,
        }
    }

    /// Remove a session, returning it if it was present
    ///
    /// Called exactly once per connection, at disconnect. Returns `None`
    /// for sessions already evicted by a superseding login.
    pub async fn detach(&self, session_id: u32) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&session_id)
    }

    /// Get a session by id
    pub async fn get(&self, session_id: u32) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(&session_id).cloned()
    }

    /// Presence snapshot: all identified connections in attach order
    ///
    /// Recomputed from current state on every call. Session ids are
    /// allocated monotonically, so ascending id order is attach order.
    pub async fn snapshot(&self) -> Vec<OnlineUser> {
        let sessions = self.sessions.read().await;
        let mut users: Vec<OnlineUser> = sessions.values().map(online_user).collect();
        users.sort_by_key(|u| u.session_id);
        users
    }

    /// Presence entries for a set of session ids, in attach order
    ///
    /// Sessions no longer in the registry are skipped.
    pub async fn users_for_sessions(&self, session_ids: &[u32]) -> Vec<OnlineUser> {
        let sessions = self.sessions.read().await;
        let mut users: Vec<OnlineUser> = session_ids
            .iter()
            .filter_map(|id| sessions.get(id))
            .map(online_user)
            .collect();
        users.sort_by_key(|u| u.session_id);
        users
    }

    /// Deliver an event to one session (best-effort)
    pub async fn send_to(&self, session_id: u32, event: ServerEvent) {
        let sessions = self.sessions.read().await;
        if let Some(session) = sessions.get(&session_id) {
            session.send(event);
        }
    }

    /// Deliver an event to a set of sessions (best-effort)
    pub async fn send_many(&self, session_ids: &[u32], event: ServerEvent) {
        let sessions = self.sessions.read().await;
        for id in session_ids {
            if let Some(session) = sessions.get(id) {
                session.send(event.clone());
            }
        }
    }

    /// Deliver an event to every identified connection
    pub async fn broadcast(&self, event: ServerEvent) {
        let sessions = self.sessions.read().await;
        for session in sessions.values() {
            session.send(event.clone());
        }
    }

    /// Deliver an event to every identified connection except one
    pub async fn broadcast_except(&self, event: ServerEvent, skip_session_id: u32) {
        let sessions = self.sessions.read().await;
        for session in sessions.values() {
            if session.session_id != skip_session_id {
                session.send(event.clone());
            }
        }
    }

    /// Broadcast the current presence snapshot to every connection
    ///
    /// Invoked at every attach and detach; best-effort delivery to
    /// whatever connections are currently reachable.
    pub async fn broadcast_presence(&self) {
        let users = self.snapshot().await;
        self.broadcast(ServerEvent::OnlineUsers { users }).await;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn online_user(session: &Session) -> OnlineUser {
    OnlineUser {
        id: session.user_id.clone(),
        nickname: session.nickname.clone(),
        session_id: session.session_id,
    }
}

/// Get current Unix timestamp in seconds
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("System time should be after UNIX_EPOCH")
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_params(user_id: &str, nickname: &str) -> (NewSessionParams, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            NewSessionParams {
                user_id: user_id.to_string(),
                nickname: nickname.to_string(),
                address: "127.0.0.1:12345".parse().unwrap(),
                tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn test_attach_assigns_increasing_ids() {
        let registry = Registry::new();

        let (params, _rx1) = test_params("u1", "alice");
        let first = registry.attach(params).await;
        let (params, _rx2) = test_params("u2", "bob");
        let second = registry.attach(params).await;

        assert!(second.session_id > first.session_id);
        assert!(first.evicted.is_none());
        assert!(second.evicted.is_none());
    }

    #[tokio::test]
    async fn test_attach_evicts_prior_session_for_same_user() {
        let registry = Registry::new();

        let (params, _rx1) = test_params("u1", "alice");
        let first = registry.attach(params).await;

        let (params, _rx2) = test_params("u1", "alice");
        let second = registry.attach(params).await;

        let evicted = second.evicted.expect("prior session should be evicted");
        assert_eq!(evicted.session_id, first.session_id);

        // Only the new session remains
        assert!(registry.get(first.session_id).await.is_none());
        assert!(registry.get(second.session_id).await.is_some());

        let users = registry.snapshot().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].session_id, second.session_id);
    }

    #[tokio::test]
    async fn test_detach_returns_session_once() {
        let registry = Registry::new();

        let (params, _rx) = test_params("u1", "alice");
        let outcome = registry.attach(params).await;

        let detached = registry.detach(outcome.session_id).await;
        assert!(detached.is_some());
        assert_eq!(detached.unwrap().nickname, "alice");

        // Second detach (e.g., after eviction) finds nothing
        assert!(registry.detach(outcome.session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_in_attach_order() {
        let registry = Registry::new();

        let mut receivers = Vec::new();
        for (user_id, nickname) in [("u1", "alice"), ("u2", "bob"), ("u3", "carol")] {
            let (params, rx) = test_params(user_id, nickname);
            registry.attach(params).await;
            receivers.push(rx);
        }

        let users = registry.snapshot().await;
        let nicknames: Vec<&str> = users.iter().map(|u| u.nickname.as_str()).collect();
        assert_eq!(nicknames, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_detach() {
        let registry = Registry::new();

        let (params, _rx1) = test_params("u1", "alice");
        let alice = registry.attach(params).await;
        let (params, _rx2) = test_params("u2", "bob");
        registry.attach(params).await;

        registry.detach(alice.session_id).await;

        let users = registry.snapshot().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].nickname, "bob");
    }

    #[tokio::test]
    async fn test_users_for_sessions_skips_unknown() {
        let registry = Registry::new();

        let (params, _rx) = test_params("u1", "alice");
        let alice = registry.attach(params).await;

        let users = registry
            .users_for_sessions(&[alice.session_id, 9999])
            .await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].nickname, "alice");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_sessions() {
        let registry = Registry::new();

        let (params, mut rx1) = test_params("u1", "alice");
        registry.attach(params).await;
        let (params, mut rx2) = test_params("u2", "bob");
        registry.attach(params).await;

        registry
            .broadcast(ServerEvent::RoomDeleted {
                room_id: "123456789".to_string(),
                room_name: "Alpha".to_string(),
            })
            .await;

        for rx in [&mut rx1, &mut rx2] {
            match rx.try_recv().expect("should receive broadcast") {
                Outbound::Event(ServerEvent::RoomDeleted { room_name, .. }) => {
                    assert_eq!(room_name, "Alpha");
                }
                other => panic!("Expected RoomDeleted, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_broadcast_except_skips_sender() {
        let registry = Registry::new();

        let (params, mut rx1) = test_params("u1", "alice");
        let alice = registry.attach(params).await;
        let (params, mut rx2) = test_params("u2", "bob");
        registry.attach(params).await;

        registry
            .broadcast_except(
                ServerEvent::UserStatus {
                    user_id: "u1".to_string(),
                    status: parlor_common::protocol::PresenceStatus::Online,
                },
                alice.session_id,
            )
            .await;

        assert!(rx1.try_recv().is_err(), "sender should not receive");
        assert!(rx2.try_recv().is_ok(), "other session should receive");
    }

    #[tokio::test]
    async fn test_broadcast_presence_sends_snapshot() {
        let registry = Registry::new();

        let (params, mut rx) = test_params("u1", "alice");
        registry.attach(params).await;

        registry.broadcast_presence().await;

        match rx.try_recv().expect("should receive presence") {
            Outbound::Event(ServerEvent::OnlineUsers { users }) => {
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].id, "u1");
            }
            other => panic!("Expected OnlineUsers, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_to_closed_channel_is_ignored() {
        let registry = Registry::new();

        let (params, rx) = test_params("u1", "alice");
        let outcome = registry.attach(params).await;
        drop(rx);

        // Must not panic or error
        registry
            .send_to(
                outcome.session_id,
                ServerEvent::OnlineUsers { users: vec![] },
            )
            .await;
    }
}
