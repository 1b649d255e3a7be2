use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::connection_manager::ConnectionManager;
use super::messages::WebSocketMessage;
use crate::room::HistorySnapshot;

/// Handle returned by [`RoomBroadcaster::subscribe`]
///
/// Unsubscribing with a stale handle (after the room's subscriber set was
/// discarded on close) is a no-op.
#[derive(Debug, Clone)]
pub struct RoomSubscription {
    pub code: String,
    pub connection_id: Uuid,
}

#[derive(Default)]
struct RoomFanout {
    subscribers: HashSet<Uuid>,
    /// Revision of the newest snapshot fanned out so far; frames at or
    /// below this are stale and dropped, so subscribers always observe
    /// history in registry commit order.
    last_revision: u64,
}

/// Fans room-state changes out to every connection subscribed to a room
///
/// The subscriber sets are private to the broadcaster; delivery goes
/// through the connection manager's outbound senders.
pub struct RoomBroadcaster {
    connections: Arc<dyn ConnectionManager>,
    rooms: RwLock<HashMap<String, RoomFanout>>,
}

impl RoomBroadcaster {
    pub fn new(connections: Arc<dyn ConnectionManager>) -> Self {
        Self {
            connections,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes a connection to a room and immediately pushes the current
    /// history snapshot to that connection only
    pub async fn subscribe(
        &self,
        connection_id: Uuid,
        code: &str,
        snapshot: &HistorySnapshot,
    ) -> RoomSubscription {
        {
            let mut rooms = self.rooms.write().await;
            rooms
                .entry(code.to_string())
                .or_default()
                .subscribers
                .insert(connection_id);
        }

        debug!(code = %code, connection_id = %connection_id, "Connection subscribed");

        let message = WebSocketMessage::history_update(snapshot.entries.clone());
        if let Ok(json) = serde_json::to_string(&message) {
            self.connections
                .send_to_connection(connection_id, &json)
                .await;
        }

        RoomSubscription {
            code: code.to_string(),
            connection_id,
        }
    }

    /// Removes a connection from its room's subscriber set; idempotent
    pub async fn unsubscribe(&self, subscription: &RoomSubscription) {
        let mut rooms = self.rooms.write().await;
        if let Some(fanout) = rooms.get_mut(&subscription.code) {
            fanout.subscribers.remove(&subscription.connection_id);
            debug!(
                code = %subscription.code,
                connection_id = %subscription.connection_id,
                "Connection unsubscribed"
            );
        }
    }

    /// Pushes a committed history snapshot to every subscriber of the room,
    /// the originator included
    ///
    /// Snapshots older than one already fanned out are dropped: the
    /// registry is the single source of ordering truth and late frames
    /// must not roll subscribers back.
    pub async fn broadcast_history(&self, code: &str, snapshot: &HistorySnapshot) {
        let subscribers: Vec<Uuid> = {
            let mut rooms = self.rooms.write().await;
            let fanout = match rooms.get_mut(code) {
                Some(fanout) => fanout,
                None => return,
            };
            if snapshot.revision <= fanout.last_revision {
                debug!(
                    code = %code,
                    revision = snapshot.revision,
                    last_revision = fanout.last_revision,
                    "Dropping stale history frame"
                );
                return;
            }
            fanout.last_revision = snapshot.revision;
            fanout.subscribers.iter().copied().collect()
        };

        debug!(
            code = %code,
            revision = snapshot.revision,
            receivers = subscribers.len(),
            "Broadcasting history update"
        );

        let message = WebSocketMessage::history_update(snapshot.entries.clone());
        if let Ok(json) = serde_json::to_string(&message) {
            self.connections.send_to_connections(&subscribers, &json).await;
        }
    }

    /// Pushes a one-time closed notice to every subscriber, then discards
    /// the room's subscriber set
    pub async fn broadcast_closed(&self, code: &str) {
        let subscribers: Vec<Uuid> = {
            let mut rooms = self.rooms.write().await;
            match rooms.remove(code) {
                Some(fanout) => fanout.subscribers.into_iter().collect(),
                None => return,
            }
        };

        info!(code = %code, receivers = subscribers.len(), "Broadcasting session closed");

        let message = WebSocketMessage::session_closed(code.to_string());
        if let Ok(json) = serde_json::to_string(&message) {
            self.connections.send_to_connections(&subscribers, &json).await;
        }
    }

    /// Number of connections currently subscribed to a room
    pub async fn subscriber_count(&self, code: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(code).map_or(0, |f| f.subscribers.len())
    }
}
