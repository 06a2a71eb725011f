//! Integration tests for the sync server, run in-process on an ephemeral port.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use sajiki_server::{config::ServerConfig, ui::Server, ui::state::AppState};
use sajiki_shared::time::SystemClock;
use serde_json::{Value, json};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel::<()>();

        let state = AppState::in_memory(&config, Arc::new(SystemClock));
        let server = Server::new(state, config.reconcile_interval);
        let handle = tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await;
        });

        TestServer {
            port,
            shutdown: Some(tx),
            handle,
        }
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    /// Create a room through the HTTP API and return its ID
    async fn create_room(&self, host: &str, max_participants: Option<usize>) -> String {
        let response = reqwest::Client::new()
            .post(self.http_url("/api/rooms"))
            .json(&json!({"hostUserId": host, "maxParticipants": max_participants}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

/// Helper struct wrapping a raw WebSocket participant
struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(server: &TestServer) -> Self {
        let (stream, _) = connect_async(server.ws_url()).await.unwrap();
        TestClient { stream }
    }

    /// Connect and join, consuming the roomState snapshot
    async fn join(server: &TestServer, room_id: &str, user_id: &str) -> (Self, Value) {
        let mut client = Self::connect(server).await;
        client
            .send(json!({
                "type": "join",
                "roomId": room_id,
                "userId": user_id,
                "displayName": user_id,
            }))
            .await;
        let state = client.recv_until("roomState").await;
        (client, state)
    }

    async fn send(&mut self, message: Value) {
        self.stream
            .send(Message::text(message.to_string()))
            .await
            .unwrap();
    }

    /// Receive the next JSON frame, or None when the socket closed
    async fn recv(&mut self) -> Option<Value> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a frame")?;
            match frame {
                Ok(Message::Text(text)) => return Some(serde_json::from_str(&text).unwrap()),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Skip frames until one of the given type arrives
    async fn recv_until(&mut self, message_type: &str) -> Value {
        loop {
            let message = self
                .recv()
                .await
                .unwrap_or_else(|| panic!("socket closed before '{}'", message_type));
            if message["type"] == message_type {
                return message;
            }
        }
    }

    /// Wait until the server closes the socket
    async fn expect_closed(&mut self) {
        while self.recv().await.is_some() {}
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await;

    let body: Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_room_lookup_endpoints() {
    let server = TestServer::start().await;
    let response: Value = reqwest::Client::new()
        .post(server.http_url("/api/rooms"))
        .json(&json!({"hostUserId": "host", "withJoinCode": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let room_id = response["id"].as_str().unwrap();
    let join_code = response["joinCode"].as_str().unwrap();
    assert_eq!(join_code.len(), 5);

    let detail: Value = reqwest::get(server.http_url(&format!("/api/rooms/code/{}", join_code)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["id"], room_id);
    assert_eq!(detail["hostUserId"], "host");
    assert_eq!(detail["playback"]["isPlaying"], false);

    let rooms: Value = reqwest::get(server.http_url("/api/rooms"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rooms.as_array().unwrap().len(), 1);

    let missing = reqwest::get(server.http_url("/api/rooms/no-such-room"))
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_room_rejects_zero_capacity() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .post(server.http_url("/api/rooms"))
        .json(&json!({"hostUserId": "host", "maxParticipants": 0}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalidInput");
}

#[tokio::test]
async fn test_join_receives_snapshot_and_others_are_notified() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;

    let (mut host, host_state) = TestClient::join(&server, &room_id, "host").await;
    assert_eq!(host_state["room"]["id"], room_id.as_str());
    assert_eq!(host_state["participants"][0]["isHost"], true);

    let (_alice, alice_state) = TestClient::join(&server, &room_id, "alice").await;
    assert_eq!(alice_state["participants"].as_array().unwrap().len(), 2);

    let joined = host.recv_until("participantJoined").await;
    assert_eq!(joined["userId"], "alice");
    assert_eq!(joined["isHost"], false);
}

#[tokio::test]
async fn test_host_playback_is_broadcast_and_guest_is_denied() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;
    let (mut host, _) = TestClient::join(&server, &room_id, "host").await;
    let (mut alice, _) = TestClient::join(&server, &room_id, "alice").await;

    host.send(json!({
        "type": "changeSource",
        "roomId": room_id,
        "url": "https://cdn.example/movie.mp4",
        "kind": "raw-file",
    }))
    .await;
    host.send(json!({"type": "play", "roomId": room_id})).await;

    let source = alice.recv_until("syncState").await;
    assert_eq!(source["playback"]["sourceUrl"], "https://cdn.example/movie.mp4");
    let playing = alice.recv_until("syncState").await;
    assert_eq!(playing["playback"]["isPlaying"], true);

    alice
        .send(json!({"type": "seek", "roomId": room_id, "positionSeconds": 30.0}))
        .await;
    let error = alice.recv_until("errorSignal").await;
    assert_eq!(error["code"], "permissionDenied");
}

#[tokio::test]
async fn test_malformed_frame_is_reported() {
    let server = TestServer::start().await;
    let mut client = TestClient::connect(&server).await;

    client.stream.send(Message::text("not json")).await.unwrap();

    let error = client.recv_until("errorSignal").await;
    assert_eq!(error["code"], "invalidInput");
}

#[tokio::test]
async fn test_intent_before_join_is_rejected() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;
    let mut client = TestClient::connect(&server).await;

    client
        .send(json!({"type": "chat", "roomId": room_id, "text": "hi"}))
        .await;

    let error = client.recv_until("errorSignal").await;
    assert_eq!(error["code"], "notJoined");
}

#[tokio::test]
async fn test_chat_reaches_everyone_including_sender() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;
    let (mut host, _) = TestClient::join(&server, &room_id, "host").await;
    let (mut alice, _) = TestClient::join(&server, &room_id, "alice").await;

    alice
        .send(json!({
            "type": "chat",
            "roomId": room_id,
            "text": "hello",
            "clientMessageId": "m-1",
        }))
        .await;

    let echoed = alice.recv_until("chatMessage").await;
    assert_eq!(echoed["clientMessageId"], "m-1");
    let received = host.recv_until("chatMessage").await;
    assert_eq!(received["text"], "hello");
    assert_eq!(received["userId"], "alice");
}

#[tokio::test]
async fn test_signaling_is_relayed_to_target_only() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;
    let (mut host, _) = TestClient::join(&server, &room_id, "host").await;
    let (mut alice, _) = TestClient::join(&server, &room_id, "alice").await;
    let (mut bob, _) = TestClient::join(&server, &room_id, "bob").await;

    bob.send(json!({
        "type": "offer",
        "roomId": room_id,
        "payload": {"sdp": "v=0"},
        "targetUserId": "alice",
    }))
    .await;
    // bob からのチャットは全員に届くので、順序の目印に使う
    bob.send(json!({"type": "chat", "roomId": room_id, "text": "marker"}))
        .await;

    let offer = alice.recv_until("offer").await;
    assert_eq!(offer["fromUserId"], "bob");
    assert_eq!(offer["payload"]["sdp"], "v=0");

    loop {
        let message = host.recv().await.unwrap();
        assert_ne!(message["type"], "offer");
        if message["type"] == "chatMessage" {
            break;
        }
    }
}

#[tokio::test]
async fn test_room_full_is_rejected() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", Some(2)).await;
    let (_host, _) = TestClient::join(&server, &room_id, "host").await;
    let (_alice, _) = TestClient::join(&server, &room_id, "alice").await;

    let mut bob = TestClient::connect(&server).await;
    bob.send(json!({
        "type": "join",
        "roomId": room_id,
        "userId": "bob",
        "displayName": "Bob",
    }))
    .await;

    let error = bob.recv_until("errorSignal").await;
    assert_eq!(error["code"], "roomFull");
}

#[tokio::test]
async fn test_host_disconnect_closes_room() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;
    let (host, _) = TestClient::join(&server, &room_id, "host").await;
    let (mut alice, _) = TestClient::join(&server, &room_id, "alice").await;
    let (mut bob, _) = TestClient::join(&server, &room_id, "bob").await;

    drop(host);

    let closed = alice.recv_until("roomClosed").await;
    assert!(closed["reason"].as_str().unwrap().contains("host"));
    bob.recv_until("roomClosed").await;

    alice
        .send(json!({"type": "chat", "roomId": room_id, "text": "still here?"}))
        .await;
    let error = alice.recv_until("errorSignal").await;
    assert_eq!(error["code"], "notFound");

    let missing = reqwest::get(server.http_url(&format!("/api/rooms/{}", room_id)))
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_kicked_participant_is_banned() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;
    let (mut host, _) = TestClient::join(&server, &room_id, "host").await;
    let (mut alice, _) = TestClient::join(&server, &room_id, "alice").await;

    host.send(json!({"type": "kick", "roomId": room_id, "userId": "alice"}))
        .await;

    let kicked = alice.recv_until("kicked").await;
    assert!(kicked["reason"].as_str().is_some());
    alice.expect_closed().await;
    let left = host.recv_until("participantLeft").await;
    assert_eq!(left["userId"], "alice");

    let mut again = TestClient::connect(&server).await;
    again
        .send(json!({
            "type": "join",
            "roomId": room_id,
            "userId": "alice",
            "displayName": "alice",
        }))
        .await;
    let error = again.recv_until("errorSignal").await;
    assert_eq!(error["code"], "temporarilyBanned");
    assert!(error["message"].as_str().unwrap().contains("~30 minutes"));
}

#[tokio::test]
async fn test_reconnect_replaces_old_session() {
    let server = TestServer::start().await;
    let room_id = server.create_room("host", None).await;
    let (_host, _) = TestClient::join(&server, &room_id, "host").await;
    let (mut old, _) = TestClient::join(&server, &room_id, "alice").await;

    let (_new, state) = TestClient::join(&server, &room_id, "alice").await;
    assert_eq!(state["participants"].as_array().unwrap().len(), 2);

    let error = old.recv_until("errorSignal").await;
    assert_eq!(error["code"], "sessionReplaced");
    old.expect_closed().await;
}

#[tokio::test]
async fn test_reconciliation_rebroadcasts_sync_state() {
    let config = ServerConfig {
        reconcile_interval: Duration::from_millis(200),
        ..ServerConfig::default()
    };
    let server = TestServer::start_with(config).await;
    let room_id = server.create_room("host", None).await;
    let (mut host, _) = TestClient::join(&server, &room_id, "host").await;
    let (mut alice, _) = TestClient::join(&server, &room_id, "alice").await;

    host.send(json!({
        "type": "changeSource",
        "roomId": room_id,
        "url": "https://cdn.example/movie.mp4",
        "kind": "raw-file",
    }))
    .await;
    host.send(json!({"type": "play", "roomId": room_id})).await;
    let started = loop {
        let sync = alice.recv_until("syncState").await;
        if sync["playback"]["isPlaying"] == true {
            break sync;
        }
    };

    let next = alice.recv_until("syncState").await;
    assert!(
        next["playback"]["lastUpdatedAtMs"].as_i64().unwrap()
            > started["playback"]["lastUpdatedAtMs"].as_i64().unwrap()
    );
    assert!(
        next["playback"]["version"].as_u64().unwrap()
            > started["playback"]["version"].as_u64().unwrap()
    );
}
