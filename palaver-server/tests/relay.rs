//! End-to-end relay scenarios over in-memory connections
//!
//! Each test drives `handle_connection_inner` through `tokio::io::duplex`
//! pairs, one spawned connection task per simulated client, against shared
//! registries - the same wiring `main` performs for real sockets.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::time::timeout;

use palaver_common::framing::{MessageReader, MessageWriter};
use palaver_common::protocol::Message;
use palaver_server::connection::{ConnectionParams, handle_connection_inner};
use palaver_server::rooms::RoomRegistry;
use palaver_server::sessions::SessionRegistry;

// ============================================================================
// Helpers
// ============================================================================

struct TestClient {
    reader: MessageReader<BufReader<ReadHalf<DuplexStream>>>,
    writer: MessageWriter<WriteHalf<DuplexStream>>,
}

fn test_addr() -> SocketAddr {
    "127.0.0.1:9999".parse().unwrap()
}

/// Open a simulated connection against the shared registries
fn connect(sessions: &SessionRegistry, rooms: &RoomRegistry) -> TestClient {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);

    let params = ConnectionParams {
        peer_addr: test_addr(),
        sessions: sessions.clone(),
        rooms: rooms.clone(),
        debug: false,
    };
    tokio::spawn(async move {
        let _ = handle_connection_inner(server_io, params).await;
    });

    let (reader, writer) = tokio::io::split(client_io);
    TestClient {
        reader: MessageReader::new(BufReader::new(reader)),
        writer: MessageWriter::new(writer),
    }
}

impl TestClient {
    async fn send(&mut self, message: &Message) {
        self.writer.write_message(message).await.unwrap();
    }

    async fn login(&mut self, user_id: &str) {
        self.send(&Message::Login {
            from_id: user_id.into(),
        })
        .await;
    }

    async fn recv(&mut self) -> Message {
        timeout(Duration::from_secs(2), self.reader.read_message())
            .await
            .expect("timed out waiting for a message")
            .expect("frame error")
            .expect("connection closed unexpectedly")
    }

    /// Assert nothing arrives within a short window
    async fn expect_silence(&mut self) {
        let result = timeout(Duration::from_millis(100), self.reader.read_message()).await;
        assert!(result.is_err(), "expected no message, got {:?}", result);
    }

    /// Assert the server has closed this connection
    async fn expect_closed(&mut self) {
        let result = timeout(Duration::from_secs(2), self.reader.read_message())
            .await
            .expect("timed out waiting for close");
        assert!(matches!(result, Ok(None)), "expected close, got {:?}", result);
    }
}

/// Wait until an identity is registered; login is processed by the
/// connection's own task, so tests that depend on it must synchronize
async fn wait_for_login(sessions: &SessionRegistry, user_id: &str) {
    timeout(Duration::from_secs(2), async {
        while !sessions.contains(user_id).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("login was never registered");
}

async fn wait_for_logout(sessions: &SessionRegistry, user_id: &str) {
    timeout(Duration::from_secs(2), async {
        while sessions.contains(user_id).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session was never removed");
}

fn text(from_id: &str, to_id: &str, content: &str, private: bool) -> Message {
    Message::Text {
        from_id: from_id.into(),
        to_id: to_id.into(),
        content: content.into(),
        private,
    }
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_snapshot_on_connect_is_first_and_may_be_empty() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    assert_eq!(
        a.recv().await,
        Message::UserList {
            from_id: vec![],
            to_id: String::new(),
        }
    );
}

#[tokio::test]
async fn test_snapshot_lists_logged_in_users() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;

    let mut b = connect(&sessions, &rooms);
    match b.recv().await {
        Message::UserList { from_id, .. } => assert_eq!(from_id, vec!["A".to_string()]),
        other => panic!("expected user_list, got {:?}", other),
    }
}

#[tokio::test]
async fn test_login_broadcast_reaches_others_and_is_never_echoed() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;

    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;

    assert_eq!(
        a.recv().await,
        Message::Login {
            from_id: "B".into()
        }
    );
    a.expect_silence().await;
    b.expect_silence().await;
}

#[tokio::test]
async fn test_explicit_logout_broadcasts_without_removing_session() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;

    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await; // B's login broadcast

    b.send(&Message::Logout {
        from_id: "B".into(),
    })
    .await;
    assert_eq!(
        a.recv().await,
        Message::Logout {
            from_id: "B".into()
        }
    );

    // The session survives an explicit logout; only teardown removes it
    assert!(sessions.contains("B").await);
    a.send(&text("A", "B", "still there?", true)).await;
    assert_eq!(b.recv().await, text("A", "B", "still there?", true));
}

// ============================================================================
// Scenario: login, user_list, private text
// ============================================================================

#[tokio::test]
async fn test_two_user_login_and_private_text_scenario() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    // A connects and logs in; the snapshot is empty
    let mut a = connect(&sessions, &rooms);
    assert_eq!(
        a.recv().await,
        Message::UserList {
            from_id: vec![],
            to_id: String::new(),
        }
    );
    a.login("A").await;
    wait_for_login(&sessions, "A").await;

    // B connects: snapshot lists A; B logs in: A is told
    let mut b = connect(&sessions, &rooms);
    assert_eq!(
        b.recv().await,
        Message::UserList {
            from_id: vec!["A".to_string()],
            to_id: String::new(),
        }
    );
    b.login("B").await;
    assert_eq!(
        a.recv().await,
        Message::Login {
            from_id: "B".into()
        }
    );

    // A sends B a private text; B receives it verbatim
    let sent = text("A", "B", "hi", true);
    a.send(&sent).await;
    let received = b.recv().await;
    assert_eq!(received, sent);
    assert_eq!(
        serde_json::to_value(&received).unwrap(),
        serde_json::json!({
            "type": "text",
            "from_id": "A",
            "to_id": "B",
            "content": "hi",
            "private": true,
        })
    );
}

// ============================================================================
// Rooms
// ============================================================================

#[tokio::test]
async fn test_room_create_invite_and_fan_out_scenario() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;

    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await;
    wait_for_login(&sessions, "B").await;

    // A creates "proj" inviting B; B is notified
    a.send(&Message::CreateRoom {
        from_id: "A".into(),
        to_id: vec!["B".into()],
        content: "proj".into(),
    })
    .await;
    assert_eq!(
        b.recv().await,
        Message::JoinRoom {
            from_id: "A".into(),
            content: "proj".into(),
        }
    );

    // A sends a non-private text to the room; B receives it, A does not
    a.send(&text("A", "proj", "kickoff at 3", false)).await;
    assert_eq!(b.recv().await, text("A", "proj", "kickoff at 3", false));
    a.expect_silence().await;

    // And from B, the fan-out reaches A (the creator is a member)
    b.send(&text("B", "proj", "works for me", false)).await;
    assert_eq!(a.recv().await, text("B", "proj", "works for me", false));
    b.expect_silence().await;
}

#[tokio::test]
async fn test_three_member_room_fan_out() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;
    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await;
    wait_for_login(&sessions, "B").await;
    let mut c = connect(&sessions, &rooms);
    let _ = c.recv().await;
    c.login("C").await;
    let _ = a.recv().await;
    let _ = b.recv().await;
    wait_for_login(&sessions, "C").await;

    a.send(&Message::CreateRoom {
        from_id: "A".into(),
        to_id: vec!["B".into(), "C".into()],
        content: "R".into(),
    })
    .await;
    let _ = b.recv().await;
    let _ = c.recv().await;

    // From B, delivery goes to exactly {A, C}
    b.send(&text("B", "R", "ping", false)).await;
    assert_eq!(a.recv().await, text("B", "R", "ping", false));
    assert_eq!(c.recv().await, text("B", "R", "ping", false));
    b.expect_silence().await;
}

// ============================================================================
// Unknown targets
// ============================================================================

#[tokio::test]
async fn test_unknown_targets_are_safe_noops() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;

    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await;
    wait_for_login(&sessions, "B").await;

    // Neither an unknown identity nor an unknown room produces anything
    a.send(&text("A", "ghost", "anyone?", true)).await;
    a.send(&text("A", "nowhere", "anyone?", false)).await;
    b.expect_silence().await;
    a.expect_silence().await;

    // The connection is unaffected: normal routing still works afterwards
    a.send(&text("A", "B", "still alive", true)).await;
    assert_eq!(b.recv().await, text("A", "B", "still alive", true));
}

// ============================================================================
// Disconnect cleanup
// ============================================================================

#[tokio::test]
async fn test_disconnect_synthesizes_exactly_one_logout() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;
    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await;
    wait_for_login(&sessions, "B").await;
    let mut c = connect(&sessions, &rooms);
    let _ = c.recv().await;
    c.login("C").await;
    let _ = a.recv().await;
    let _ = b.recv().await;
    wait_for_login(&sessions, "C").await;

    // A's connection drops without an explicit logout
    drop(a);
    wait_for_logout(&sessions, "A").await;

    assert_eq!(
        b.recv().await,
        Message::Logout {
            from_id: "A".into()
        }
    );
    assert_eq!(
        c.recv().await,
        Message::Logout {
            from_id: "A".into()
        }
    );
    // Exactly one synthesized logout per remaining session
    b.expect_silence().await;
    c.expect_silence().await;

    // Subsequent private sends to A are no-ops
    b.send(&text("B", "A", "hello?", true)).await;
    b.expect_silence().await;
    c.expect_silence().await;
}

#[tokio::test]
async fn test_disconnect_before_login_is_silent() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;

    // A connection that never logged in comes and goes without a trace
    let ghost = connect(&sessions, &rooms);
    drop(ghost);

    a.expect_silence().await;
}

#[tokio::test]
async fn test_room_membership_survives_disconnect() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;
    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await;
    wait_for_login(&sessions, "B").await;

    a.send(&Message::CreateRoom {
        from_id: "A".into(),
        to_id: vec!["B".into()],
        content: "proj".into(),
    })
    .await;
    let _ = b.recv().await;

    drop(b);
    wait_for_logout(&sessions, "B").await;
    let _ = a.recv().await; // synthesized logout for B

    // B is gone but the room still names it; fan-out just skips the dead
    // identity and the room keeps working for everyone else
    let mut members = rooms.members_except("proj", "").await.unwrap();
    members.sort();
    assert_eq!(members, vec!["A".to_string(), "B".to_string()]);

    a.send(&text("A", "proj", "anyone?", false)).await;
    a.expect_silence().await;
}

// ============================================================================
// Framing failures
// ============================================================================

#[tokio::test]
async fn test_malformed_stream_resets_connection() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;
    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await;
    wait_for_login(&sessions, "B").await;

    // Bytes that can never begin a JSON value reset B's connection...
    use tokio::io::AsyncWriteExt;
    b.writer.get_mut().write_all(b"!!!garbage").await.unwrap();
    b.writer.get_mut().flush().await.unwrap();
    b.expect_closed().await;

    // ...which runs the normal teardown path
    wait_for_logout(&sessions, "B").await;
    assert_eq!(
        a.recv().await,
        Message::Logout {
            from_id: "B".into()
        }
    );
}

#[tokio::test]
async fn test_unknown_message_type_is_ignored() {
    let sessions = SessionRegistry::new();
    let rooms = RoomRegistry::new();

    let mut a = connect(&sessions, &rooms);
    let _ = a.recv().await;
    a.login("A").await;
    wait_for_login(&sessions, "A").await;
    let mut b = connect(&sessions, &rooms);
    let _ = b.recv().await;
    b.login("B").await;
    let _ = a.recv().await;
    wait_for_login(&sessions, "B").await;

    // A complete value with an unrecognized type is skipped without error
    use tokio::io::AsyncWriteExt;
    b.writer
        .get_mut()
        .write_all(br#"{"type":"heartbeat","from_id":"B"}"#)
        .await
        .unwrap();
    b.writer.get_mut().flush().await.unwrap();

    b.send(&text("B", "A", "after the junk", true)).await;
    assert_eq!(a.recv().await, text("B", "A", "after the junk", true));
}
