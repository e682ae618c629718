//! Handler for the userJoin event - attach an identity to the connection
//!
//! The payload carries an `{id, nickname}` pair already resolved by the
//! external account layer. Attaching is idempotent per connection, and a
//! login for a user who is already connected elsewhere force-disconnects
//! the older session.

use std::io;

use futures_util::Sink;
use tokio_tungstenite::tungstenite::protocol::Message;

use parlor_common::protocol::{PresenceStatus, ServerEvent};
use parlor_common::validators;

use super::{HandlerContext, nickname_error_to_message, system};
use crate::connection::ConnectionState;
use crate::users::NewSessionParams;

/// Handle the userJoin event
pub async fn handle_user_join<W>(
    user_id: String,
    nickname: String,
    state: &mut ConnectionState,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    // A second announce on the same connection is a no-op
    if state.session_id.is_some() {
        if ctx.debug {
            eprintln!("Repeated userJoin from {}, ignoring", ctx.peer_addr);
        }
        return Ok(());
    }

    if let Err(e) = validators::validate_nickname(&nickname) {
        return ctx
            .send(ServerEvent::Error {
                message: nickname_error_to_message(e),
            })
            .await;
    }

    let outcome = ctx
        .registry
        .attach(NewSessionParams {
            user_id: user_id.clone(),
            nickname: nickname.clone(),
            address: ctx.peer_addr,
            tx: ctx.tx.clone(),
        })
        .await;

    state.session_id = Some(outcome.session_id);
    state.user_id = Some(user_id.clone());
    state.nickname = Some(nickname.clone());

    // Single-active-connection policy: the superseded session is told why
    // and shut down. Its room membership is unwound by its own disconnect
    // path once the shutdown lands.
    if let Some(evicted) = outcome.evicted {
        if ctx.debug {
            eprintln!(
                "User '{}' signed in again, evicting session {}",
                nickname, evicted.session_id
            );
        }
        evicted.send(system::superseded());
        evicted.shutdown();
    }

    ctx.registry
        .broadcast_except(
            ServerEvent::UserStatus {
                user_id,
                status: PresenceStatus::Online,
            },
            outcome.session_id,
        )
        .await;
    ctx.registry.broadcast_presence().await;

    // The announcing connection gets the directory and a welcome directly
    let rooms = ctx.rooms.list().await;
    ctx.send(ServerEvent::RoomList { rooms }).await?;
    ctx.send(system::welcome(&nickname)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{
        attach_user, create_test_context, sent_events, try_recv_event,
    };
    use crate::users::Outbound;
    use parlor_common::protocol::MessageKind;

    #[tokio::test]
    async fn test_user_join_attaches_identity() {
        let mut test_ctx = create_test_context().await;
        let mut state = ConnectionState::new();

        handle_user_join(
            "u1".to_string(),
            "alice".to_string(),
            &mut state,
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        let session_id = state.session_id.expect("identity should be attached");
        assert_eq!(state.nickname.as_deref(), Some("alice"));

        let session = test_ctx.registry.get(session_id).await.unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.nickname, "alice");
    }

    #[tokio::test]
    async fn test_user_join_sends_room_list_and_welcome() {
        let mut test_ctx = create_test_context().await;
        test_ctx
            .rooms
            .create("Alpha", None, "someone")
            .await
            .unwrap();
        let mut state = ConnectionState::new();

        handle_user_join(
            "u1".to_string(),
            "alice".to_string(),
            &mut state,
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        let events = sent_events(&test_ctx);
        assert!(events.iter().any(|frame| matches!(
            &frame.event,
            ServerEvent::RoomList { rooms } if rooms.len() == 1 && rooms[0].name == "Alpha"
        )));
        assert!(events.iter().any(|frame| matches!(
            &frame.event,
            ServerEvent::Message { message }
                if message.kind == MessageKind::System && message.body.contains("alice")
        )));
    }

    #[tokio::test]
    async fn test_user_join_is_idempotent() {
        let mut test_ctx = create_test_context().await;
        let mut state = ConnectionState::new();

        handle_user_join(
            "u1".to_string(),
            "alice".to_string(),
            &mut state,
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();
        let session_id = state.session_id;

        // Second announce (even with a different identity) changes nothing
        handle_user_join(
            "u2".to_string(),
            "mallory".to_string(),
            &mut state,
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        assert_eq!(state.session_id, session_id);
        assert_eq!(state.nickname.as_deref(), Some("alice"));
        let users = test_ctx.registry.snapshot().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].nickname, "alice");
    }

    #[tokio::test]
    async fn test_user_join_rejects_invalid_nickname() {
        let mut test_ctx = create_test_context().await;
        let mut state = ConnectionState::new();

        handle_user_join(
            "u1".to_string(),
            "a".to_string(),
            &mut state,
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        assert!(state.session_id.is_none());
        assert!(test_ctx.registry.snapshot().await.is_empty());

        let events = sent_events(&test_ctx);
        assert!(
            events
                .iter()
                .any(|frame| matches!(&frame.event, ServerEvent::Error { .. }))
        );
    }

    #[tokio::test]
    async fn test_user_join_broadcasts_presence_to_others() {
        let mut test_ctx = create_test_context().await;
        let (_bob_session, mut bob_rx) = attach_user(&mut test_ctx, "u2", "bob").await;
        let mut state = ConnectionState::new();

        handle_user_join(
            "u1".to_string(),
            "alice".to_string(),
            &mut state,
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        // Bob sees alice come online, then the refreshed snapshot
        match try_recv_event(&mut bob_rx).expect("bob should get userStatus") {
            ServerEvent::UserStatus { user_id, status } => {
                assert_eq!(user_id, "u1");
                assert_eq!(status, PresenceStatus::Online);
            }
            other => panic!("Expected UserStatus, got {:?}", other),
        }
        match try_recv_event(&mut bob_rx).expect("bob should get onlineUsers") {
            ServerEvent::OnlineUsers { users } => {
                assert_eq!(users.len(), 2);
            }
            other => panic!("Expected OnlineUsers, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_user_join_evicts_prior_session() {
        let mut test_ctx = create_test_context().await;
        let (old_session, mut old_rx) = attach_user(&mut test_ctx, "u1", "alice").await;
        let mut state = ConnectionState::new();

        handle_user_join(
            "u1".to_string(),
            "alice".to_string(),
            &mut state,
            &mut test_ctx.handler_context(),
        )
        .await
        .unwrap();

        // The old session got a notice and a shutdown
        match try_recv_event(&mut old_rx).expect("evicted session should be notified") {
            ServerEvent::Message { message } => {
                assert_eq!(message.kind, MessageKind::System);
            }
            other => panic!("Expected system Message, got {:?}", other),
        }
        assert!(matches!(
            old_rx.try_recv().expect("should receive shutdown"),
            Outbound::Shutdown
        ));

        // Registry holds only the new session
        assert!(test_ctx.registry.get(old_session).await.is_none());
        let users = test_ctx.registry.snapshot().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].session_id, state.session_id.unwrap());
    }
}
