use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use clipshare::{
    room::{registry::InMemoryRoomRegistry, RoomService},
    websockets::{
        ConnectionManager, InMemoryConnectionManager, MessageHandler, MessageType,
        RoomBroadcaster, SessionGateway, WebSocketMessage,
    },
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// One engine instance shared by any number of simulated clients
pub struct TestSetup {
    pub rooms: Arc<RoomService>,
    pub broadcaster: Arc<RoomBroadcaster>,
    pub connections: Arc<InMemoryConnectionManager>,
}

impl TestSetup {
    pub fn new() -> Self {
        let connections = Arc::new(InMemoryConnectionManager::new());
        let rooms = Arc::new(RoomService::new(Arc::new(InMemoryRoomRegistry::new())));
        let broadcaster = Arc::new(RoomBroadcaster::new(
            Arc::clone(&connections) as Arc<dyn ConnectionManager>
        ));
        Self {
            rooms,
            broadcaster,
            connections,
        }
    }

    /// Simulates a freshly connected WebSocket client with its own gateway
    pub async fn connect(&self) -> TestClient {
        let connection_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();

        self.connections
            .add_connection(connection_id, sender.clone())
            .await;

        let gateway = Arc::new(SessionGateway::new(
            connection_id,
            sender,
            Arc::clone(&self.rooms),
            Arc::clone(&self.broadcaster),
        ));

        TestClient {
            connection_id,
            gateway,
            receiver: Mutex::new(receiver),
        }
    }
}

impl Default for TestSetup {
    fn default() -> Self {
        Self::new()
    }
}

/// A simulated client: the gateway end plus the outbound message stream a
/// real socket would drain
pub struct TestClient {
    pub connection_id: Uuid,
    pub gateway: Arc<SessionGateway>,
    receiver: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl TestClient {
    /// Feeds a raw protocol frame into the gateway, as the socket loop would
    pub async fn send_raw(&self, json: &str) {
        self.gateway.handle_message(json.to_string()).await;
    }

    /// Creates a session and returns its pairing code (consumes the ack;
    /// the auto-subscribe snapshot stays queued)
    pub async fn create_session(&self) -> String {
        self.send_raw(r#"{"type":"CREATE_SESSION","payload":{}}"#)
            .await;
        let ack = self.next_message().await.expect("expected creation ack");
        assert_eq!(ack.payload["success"], true, "session creation failed");
        ack.payload["code"].as_str().unwrap().to_string()
    }

    /// Joins a session and returns the ack's success flag
    pub async fn join_session(&self, code: &str) -> bool {
        self.send_raw(&format!(
            r#"{{"type":"JOIN_SESSION","payload":{{"code":"{}"}}}}"#,
            code
        ))
        .await;
        // A prior successful join leaves its auto-subscribe snapshot queued
        // (see create_session), so skip any leading HISTORY_UPDATE frames and
        // read this join's own JOIN_RESULT ack.
        loop {
            let ack = self.next_message().await.expect("expected join ack");
            if ack.message_type == MessageType::JoinResult {
                break ack.payload["success"].as_bool().unwrap();
            }
        }
    }

    pub async fn send_text(&self, code: &str, text: &str) {
        let frame = serde_json::json!({
            "type": "SEND_TEXT",
            "payload": { "code": code, "text": text },
        });
        self.send_raw(&frame.to_string()).await;
    }

    pub async fn clear_text(&self, code: &str) {
        self.send_raw(&format!(
            r#"{{"type":"CLEAR_TEXT","payload":{{"code":"{}"}}}}"#,
            code
        ))
        .await;
    }

    pub async fn close_room(&self, code: &str) {
        self.send_raw(&format!(
            r#"{{"type":"CLOSE_ROOM","payload":{{"code":"{}"}}}}"#,
            code
        ))
        .await;
    }

    pub async fn disconnect(&self) {
        self.gateway.disconnect().await;
    }

    /// Pops the next already-delivered message, if any
    ///
    /// Every gateway call completes its fanout before returning, so
    /// anything this client should have seen is already queued.
    pub async fn next_message(&self) -> Option<WebSocketMessage> {
        let raw = self.receiver.lock().await.try_recv().ok()?;
        Some(serde_json::from_str(&raw).expect("malformed frame from server"))
    }

    /// Discards everything currently queued
    pub async fn drain(&self) {
        while self.next_message().await.is_some() {}
    }
}
