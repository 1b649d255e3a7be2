//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use clipshare::websockets::MessageType;

use super::setup::TestClient;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion;

impl MessageAssertion {
    /// Asserts the client's next queued message has the expected type and
    /// returns its payload
    pub async fn expect_type(client: &TestClient, expected: MessageType) -> serde_json::Value {
        let message = client
            .next_message()
            .await
            .unwrap_or_else(|| panic!("expected a {:?} message, queue was empty", expected));
        assert_eq!(
            message.message_type, expected,
            "wrong message type, payload: {}",
            message.payload
        );
        message.payload
    }

    /// Asserts the client's next message is a HISTORY_UPDATE carrying
    /// exactly `entries` (newest first)
    pub async fn expect_history(client: &TestClient, entries: &[&str]) {
        let payload = Self::expect_type(client, MessageType::HistoryUpdate).await;
        let history: Vec<String> =
            serde_json::from_value(payload["history"].clone()).expect("history array");
        assert_eq!(history, entries);
    }

    /// Asserts the client has no queued messages
    pub async fn expect_silence(client: &TestClient) {
        if let Some(message) = client.next_message().await {
            panic!(
                "expected no messages, found {:?} with payload {}",
                message.message_type, message.payload
            );
        }
    }
}
