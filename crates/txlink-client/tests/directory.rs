//! Session directory and stream remoting client tests.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

mod common;

use std::sync::Arc;

use common::{session_ref, test_config, FakeSession};
use txlink_client::directory::{DirectoryError, DirectoryEvent, MAX_SESSIONS};
use txlink_client::{
    spawn_directory, ClientHandler, EventListener, ProcessorRegistry, RemotingClient,
    RemotingError, Session, SessionDirectory, StreamRemotingClient, TransportError,
};
use txlink_core::SessionKey;
use txlink_protocol::{FrameType, MessageType, RegisterTmRequest, RpcMessage, TypedBody};

// ============================================================================
// Directory Actor
// ============================================================================

#[tokio::test]
async fn test_register_and_get() {
    let directory = spawn_directory();
    let session = FakeSession::new("s1");

    directory.register(session_ref(&session)).await.unwrap();

    let found = directory.get(SessionKey::new("s1")).await.unwrap();
    assert_eq!(found.key(), session.key());
    assert_eq!(directory.len().await, 1);
    assert!(directory.get(SessionKey::new("missing")).await.is_none());
}

#[tokio::test]
async fn test_register_is_idempotent() {
    let directory = spawn_directory();
    let mut events = directory.subscribe();
    let session = FakeSession::new("s1");

    directory.register(session_ref(&session)).await.unwrap();
    directory.register(session_ref(&session)).await.unwrap();

    assert_eq!(directory.len().await, 1);
    assert!(matches!(
        events.try_recv().unwrap(),
        DirectoryEvent::Registered { .. }
    ));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let directory = spawn_directory();
    let session = FakeSession::new("s1");
    directory.register(session_ref(&session)).await.unwrap();

    assert!(directory.release(session.key()).await.unwrap());
    assert!(!directory.release(session.key()).await.unwrap());
    assert!(!directory.release(&SessionKey::new("never")).await.unwrap());
    assert!(directory.is_empty().await);
}

#[tokio::test]
async fn test_sessions_listed_oldest_first() {
    let directory = spawn_directory();
    for name in ["c", "a", "b"] {
        directory
            .register(session_ref(&FakeSession::new(name)))
            .await
            .unwrap();
    }

    let keys: Vec<String> = directory
        .sessions()
        .await
        .iter()
        .map(|s| s.key().to_string())
        .collect();
    assert_eq!(keys, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_directory_full() {
    let directory = spawn_directory();
    for i in 0..MAX_SESSIONS {
        directory
            .register(session_ref(&FakeSession::new(&format!("s{i}"))))
            .await
            .unwrap();
    }

    let overflow = directory
        .register(session_ref(&FakeSession::new("overflow")))
        .await;
    assert_eq!(
        overflow,
        Err(DirectoryError::DirectoryFull { max: MAX_SESSIONS })
    );

    // A known session can still be refreshed
    directory
        .register(session_ref(&FakeSession::new("s0")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_events_follow_changes() {
    let directory = spawn_directory();
    let mut events = directory.subscribe();
    let session = FakeSession::new("s1");

    directory.register(session_ref(&session)).await.unwrap();
    directory.release(session.key()).await.unwrap();
    directory.release(session.key()).await.unwrap();

    let first = events.recv().await.unwrap();
    assert!(matches!(first, DirectoryEvent::Registered { .. }));
    assert_eq!(first.session_key(), session.key());

    let second = events.recv().await.unwrap();
    assert!(matches!(second, DirectoryEvent::Released { .. }));

    // The no-op release publishes nothing
    assert!(events.try_recv().is_err());
}

// ============================================================================
// Stream Remoting Client
// ============================================================================

fn registration_body() -> TypedBody {
    TypedBody::from_message(&RegisterTmRequest::new("1.0", "app", "group")).unwrap()
}

#[tokio::test]
async fn test_request_without_sessions_fails() {
    let client = StreamRemotingClient::new(Arc::new(spawn_directory()));

    let result = client.send_async_request(registration_body()).await;

    assert_eq!(result, Err(RemotingError::NoAvailableSession));
}

#[tokio::test]
async fn test_request_skips_closed_sessions() {
    let directory = Arc::new(spawn_directory());
    let closed = FakeSession::new("closed");
    let open = FakeSession::new("open");
    closed.close();
    directory.register(session_ref(&closed)).await.unwrap();
    directory.register(session_ref(&open)).await.unwrap();
    let client = StreamRemotingClient::new(directory);

    client.send_async_request(registration_body()).await.unwrap();
    client.send_async_request(registration_body()).await.unwrap();

    assert!(closed.written().is_empty());
    let written = open.written();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].frame_type, FrameType::Request);
    assert_eq!(written[0].message_type(), Some(MessageType::RegClt));
    assert_eq!(written[0].id, 1);
    assert_eq!(written[1].id, 2);
}

#[tokio::test]
async fn test_send_to_closed_session_fails() {
    let client = StreamRemotingClient::new(Arc::new(spawn_directory()));
    let session = FakeSession::new("s1");
    session.close();

    let result = client
        .send_async(RpcMessage::heartbeat_request(1), &session_ref(&session))
        .await;

    assert!(matches!(result, Err(RemotingError::SessionClosed(_))));
    assert!(session.written().is_empty());
}

#[tokio::test]
async fn test_send_surfaces_write_failure() {
    let client = StreamRemotingClient::new(Arc::new(spawn_directory()));
    let session = FakeSession::new("s1");
    session.fail_writes();

    let result = client
        .send_async(RpcMessage::heartbeat_request(1), &session_ref(&session))
        .await;

    assert_eq!(
        result,
        Err(RemotingError::Transport(TransportError::io(
            std::io::ErrorKind::BrokenPipe,
            "broken pipe"
        )))
    );
}

// ============================================================================
// Handler Wired To Real Collaborators
// ============================================================================

fn wired_handler(max_retries: u32) -> (ClientHandler, Arc<dyn SessionDirectory>) {
    let directory: Arc<dyn SessionDirectory> = Arc::new(spawn_directory());
    let remoting = Arc::new(StreamRemotingClient::new(Arc::clone(&directory)));
    let handler = ClientHandler::new(
        test_config(max_retries),
        ProcessorRegistry::with_builtins(),
        Arc::clone(&directory),
        remoting,
    );
    (handler, directory)
}

#[tokio::test]
async fn test_handshake_finds_the_opening_session() {
    let (handler, directory) = wired_handler(3);
    let session = FakeSession::new("s1");

    // The request picks its session from the directory, so this only
    // succeeds if registration happened first
    handler
        .open_session(&session_ref(&session))
        .await
        .unwrap()
        .await
        .unwrap()
        .unwrap();

    let written = session.written();
    assert_eq!(written.len(), 1);
    let request: RegisterTmRequest = written[0].body.typed().unwrap().decode().unwrap();
    assert_eq!(request.application_id, "order-service");
    assert_eq!(directory.sessions().await.len(), 1);
}

#[tokio::test]
async fn test_failed_handshake_leaves_directory_empty() {
    let (handler, directory) = wired_handler(3);
    let session = FakeSession::new("s1");
    session.fail_writes();

    let result = handler
        .open_session(&session_ref(&session))
        .await
        .unwrap()
        .await
        .unwrap();

    assert!(result.is_err());
    assert!(directory.sessions().await.is_empty());
    assert!(session.is_closed());
}

#[tokio::test]
async fn test_heartbeat_eviction_releases_from_directory() {
    let (handler, directory) = wired_handler(3);
    let session = FakeSession::new("s1");
    let session_ref = session_ref(&session);
    handler.open_session(&session_ref).await.unwrap().await.unwrap().unwrap();

    session.fail_writes();
    for _ in 0..3 {
        handler.on_cron(&session_ref).await;
    }

    assert!(directory.sessions().await.is_empty());
    assert!(handler.heartbeat().is_evicted(session.key()));
    assert!(session.is_closed());
}
