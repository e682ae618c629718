//! Shared test utilities for handler tests

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Sink;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::{ServerEvent, ServerFrame};

use super::HandlerContext;
use crate::rooms::Directory;
use crate::users::{NewSessionParams, Outbound, OutboundSender, Registry};

/// Correlation id used for all test requests
pub const TEST_SEQ: u64 = 1;

/// Sink that records every frame a handler writes
pub struct MockSink {
    pub sent: Vec<Message>,
}

impl MockSink {
    fn new() -> Self {
        Self { sent: Vec::new() }
    }
}

impl Sink<Message> for MockSink {
    type Error = tokio_tungstenite::tungstenite::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.sent.push(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Test context that owns all resources needed for handler testing
pub struct TestContext {
    pub writer: MockSink,
    pub registry: Registry,
    pub rooms: Directory,
    /// Outbound channel for "the connection under test"
    pub tx: OutboundSender,
    pub rx: mpsc::UnboundedReceiver<Outbound>,
    pub peer_addr: SocketAddr,
}

impl TestContext {
    /// Create a HandlerContext from this TestContext
    pub fn handler_context(&mut self) -> HandlerContext<'_, MockSink> {
        HandlerContext {
            writer: &mut self.writer,
            peer_addr: self.peer_addr,
            registry: &self.registry,
            rooms: &self.rooms,
            archive: None,
            tx: &self.tx,
            seq: Some(TEST_SEQ),
            debug: false,
        }
    }
}

/// Create a fresh test context with no archive
pub async fn create_test_context() -> TestContext {
    let (tx, rx) = mpsc::unbounded_channel();
    TestContext {
        writer: MockSink::new(),
        registry: Registry::new(),
        rooms: Directory::new(),
        tx,
        rx,
        peer_addr: "127.0.0.1:12345".parse().expect("valid test address"),
    }
}

/// Attach an identified session with its own outbound channel
///
/// Returns the session id and the receiver to observe what that session
/// was sent.
pub async fn attach_user(
    test_ctx: &mut TestContext,
    user_id: &str,
    nickname: &str,
) -> (u32, mpsc::UnboundedReceiver<Outbound>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let outcome = test_ctx
        .registry
        .attach(NewSessionParams {
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
            address: test_ctx.peer_addr,
            tx,
        })
        .await;
    (outcome.session_id, rx)
}

/// All frames written directly to the connection under test
pub fn sent_events(test_ctx: &TestContext) -> Vec<ServerFrame> {
    test_ctx
        .writer
        .sent
        .iter()
        .map(|message| match message {
            Message::Text(text) => {
                serde_json::from_str(text.as_str()).expect("handler wrote invalid JSON")
            }
            other => panic!("Expected text frame, got {:?}", other),
        })
        .collect()
}

/// The last event written directly to the connection under test
pub fn last_response(test_ctx: &TestContext) -> ServerEvent {
    sent_events(test_ctx)
        .pop()
        .expect("handler wrote no frames")
        .event
}

/// Pop one queued event from a session's channel
///
/// Panics on an unexpected shutdown; returns `None` when the channel is
/// empty.
pub fn try_recv_event(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Option<ServerEvent> {
    match rx.try_recv() {
        Ok(Outbound::Event(event)) => Some(event),
        Ok(Outbound::Shutdown) => panic!("Unexpected shutdown"),
        Err(_) => None,
    }
}

/// Drain every queued event from a session's channel
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Some(event) = try_recv_event(rx) {
        events.push(event);
    }
    events
}
