use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::broadcaster::{RoomBroadcaster, RoomSubscription};
use super::messages::{
    ClearTextPayload, CloseRoomPayload, JoinSessionPayload, MessageType, SendTextPayload,
    WebSocketMessage,
};
use super::socket::{Connection, MessageHandler};
use crate::room::{code, AppendOutcome, RoomService};
use crate::shared::AppState;

/// Per-connection request dispatcher
///
/// Stateless beyond the room subscription this connection currently holds.
/// Host-only enforcement of CLOSE_ROOM is the caller's responsibility; the
/// core does not model identity.
pub struct SessionGateway {
    connection_id: Uuid,
    outbound: mpsc::UnboundedSender<String>,
    rooms: Arc<RoomService>,
    broadcaster: Arc<RoomBroadcaster>,
    subscription: Mutex<Option<RoomSubscription>>,
}

impl SessionGateway {
    pub fn new(
        connection_id: Uuid,
        outbound: mpsc::UnboundedSender<String>,
        rooms: Arc<RoomService>,
        broadcaster: Arc<RoomBroadcaster>,
    ) -> Self {
        Self {
            connection_id,
            outbound,
            rooms,
            broadcaster,
            subscription: Mutex::new(None),
        }
    }

    /// Sends a message to this connection only
    fn send_to_self(&self, message: &WebSocketMessage) {
        if let Ok(json) = serde_json::to_string(message) {
            let _ = self.outbound.send(json);
        }
    }

    /// Forgets the current subscription, if any. Must run before a new
    /// subscribe so that rejoining the same room does not drop the
    /// connection from that room's subscriber set.
    async fn clear_subscription(&self) {
        if let Some(old) = self.subscription.lock().await.take() {
            self.broadcaster.unsubscribe(&old).await;
        }
    }

    async fn handle_create_session(&self) {
        match self.rooms.create_room().await {
            Ok(room) => {
                self.send_to_self(&WebSocketMessage::session_created(room.code.clone()));

                self.clear_subscription().await;
                let subscription = self
                    .broadcaster
                    .subscribe(self.connection_id, &room.code, &room.history.snapshot())
                    .await;
                *self.subscription.lock().await = Some(subscription);

                info!(
                    connection_id = %self.connection_id,
                    code = %room.code,
                    "Session created"
                );
            }
            Err(e) => {
                warn!(connection_id = %self.connection_id, error = %e, "Session creation failed");
                self.send_to_self(&WebSocketMessage::session_create_failed());
            }
        }
    }

    async fn handle_join_session(&self, payload: JoinSessionPayload) {
        if !code::is_valid_code(&payload.code) {
            let error = crate::shared::AppError::InvalidCode(payload.code);
            self.send_to_self(&WebSocketMessage::join_result(false, Some(error.to_string())));
            return;
        }

        match self.rooms.get_room(&payload.code).await {
            Ok(Some(room)) if room.is_active() => {
                self.send_to_self(&WebSocketMessage::join_result(true, None));

                // The initial history snapshot is delivered by subscribe
                self.clear_subscription().await;
                let subscription = self
                    .broadcaster
                    .subscribe(self.connection_id, &room.code, &room.history.snapshot())
                    .await;
                *self.subscription.lock().await = Some(subscription);

                info!(
                    connection_id = %self.connection_id,
                    code = %room.code,
                    "Joined session"
                );
            }
            // Unknown and closed codes are reported alike
            Ok(_) => {
                self.send_to_self(&WebSocketMessage::join_result(
                    false,
                    Some("invalid session code".to_string()),
                ));
            }
            Err(e) => {
                warn!(connection_id = %self.connection_id, error = %e, "Join lookup failed");
                self.send_to_self(&WebSocketMessage::error(e.to_string()));
            }
        }
    }

    async fn handle_send_text(&self, payload: SendTextPayload) {
        match self.rooms.append_clip(&payload.code, &payload.text).await {
            Ok(AppendOutcome::Appended(snapshot)) => {
                self.broadcaster
                    .broadcast_history(&payload.code, &snapshot)
                    .await;
            }
            Ok(AppendOutcome::Suppressed) => {
                // Duplicate of the head entry: defined no-op, no fanout
                debug!(
                    connection_id = %self.connection_id,
                    code = %payload.code,
                    "Duplicate clip suppressed"
                );
            }
            Err(e) => self.send_to_self(&WebSocketMessage::error(e.to_string())),
        }
    }

    async fn handle_clear_text(&self, payload: ClearTextPayload) {
        match self.rooms.clear_history(&payload.code).await {
            Ok(snapshot) => {
                self.broadcaster
                    .broadcast_history(&payload.code, &snapshot)
                    .await;
            }
            Err(e) => self.send_to_self(&WebSocketMessage::error(e.to_string())),
        }
    }

    async fn handle_close_room(&self, payload: CloseRoomPayload) {
        match self.rooms.close_room(&payload.code).await {
            Ok(()) => {
                self.broadcaster.broadcast_closed(&payload.code).await;
                info!(
                    connection_id = %self.connection_id,
                    code = %payload.code,
                    "Room closed"
                );
            }
            Err(e) => self.send_to_self(&WebSocketMessage::error(e.to_string())),
        }
    }

    /// Called when the connection goes away: unsubscribe only, never any
    /// room mutation
    pub async fn disconnect(&self) {
        self.clear_subscription().await;
    }
}

#[async_trait]
impl MessageHandler for SessionGateway {
    async fn handle_message(&self, message: String) {
        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    connection_id = %self.connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.send_to_self(&WebSocketMessage::error("malformed message".to_string()));
                return;
            }
        };

        match ws_message.message_type {
            MessageType::CreateSession => self.handle_create_session().await,
            MessageType::JoinSession => {
                match serde_json::from_value::<JoinSessionPayload>(ws_message.payload) {
                    Ok(payload) => self.handle_join_session(payload).await,
                    Err(_) => {
                        self.send_to_self(&WebSocketMessage::error("malformed payload".to_string()))
                    }
                }
            }
            MessageType::SendText => {
                match serde_json::from_value::<SendTextPayload>(ws_message.payload) {
                    Ok(payload) => self.handle_send_text(payload).await,
                    Err(_) => {
                        self.send_to_self(&WebSocketMessage::error("malformed payload".to_string()))
                    }
                }
            }
            MessageType::ClearText => {
                match serde_json::from_value::<ClearTextPayload>(ws_message.payload) {
                    Ok(payload) => self.handle_clear_text(payload).await,
                    Err(_) => {
                        self.send_to_self(&WebSocketMessage::error("malformed payload".to_string()))
                    }
                }
            }
            MessageType::CloseRoom => {
                match serde_json::from_value::<CloseRoomPayload>(ws_message.payload) {
                    Ok(payload) => self.handle_close_room(payload).await,
                    Err(_) => {
                        self.send_to_self(&WebSocketMessage::error("malformed payload".to_string()))
                    }
                }
            }
            _ => {
                debug!(
                    connection_id = %self.connection_id,
                    message_type = ?ws_message.message_type,
                    "Unhandled message type"
                );
            }
        }
    }
}

/// WebSocket endpoint for the session protocol
///
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connections
        .add_connection(connection_id, outbound_sender.clone())
        .await;

    let gateway = Arc::new(SessionGateway::new(
        connection_id,
        outbound_sender,
        Arc::clone(&app_state.rooms),
        Arc::clone(&app_state.broadcaster),
    ));

    let connection = Connection::new(
        connection_id,
        Box::new(socket),
        outbound_receiver,
        Arc::clone(&gateway) as Arc<dyn MessageHandler>,
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: forget the subscription and the outbound sender. Stored room
    // state is untouched by a disconnect.
    gateway.disconnect().await;
    app_state
        .connections
        .remove_connection(connection_id)
        .await;

    info!(connection_id = %connection_id, "WebSocket connection cleaned up");
}
