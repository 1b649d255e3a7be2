// Public API - what other modules can use
pub use broadcaster::{RoomBroadcaster, RoomSubscription};
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use gateway::{websocket_handler, SessionGateway};
pub use messages::{MessageType, WebSocketMessage};
pub use socket::MessageHandler;

// Internal modules
pub mod broadcaster;
pub mod connection_manager;
pub mod gateway;
pub mod messages;
pub mod socket;
