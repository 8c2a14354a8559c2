//! Helpers for testing code built on this SDK against a `wiremock` server.
//!
//! Available to this crate's tests and, through the `test-support` feature,
//! to sibling crates.

use crate::auth::NetworkCredential;
use crate::client::{NetworkClient, NetworkClientBuilder, RetryPolicy};
use std::time::Duration;
use wiremock::MockServer;

/// Subscription ID used by mock clients.
pub const TEST_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Bearer token used by mock clients (not a real token).
pub const TEST_TOKEN: &str = "test-token";

/// A builder pointed at `server` with fast retries and polling.
pub fn mock_client_builder(server: &MockServer) -> NetworkClientBuilder {
    NetworkClient::builder()
        .endpoint(server.uri())
        .subscription_id(TEST_SUBSCRIPTION_ID)
        .credential(NetworkCredential::access_token(TEST_TOKEN))
        .retry_policy(RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(5),
        })
        .poll_interval(Duration::from_millis(5))
}

/// Create a test client connected to a mock server.
pub async fn setup_mock_client(server: &MockServer) -> NetworkClient {
    mock_client_builder(server)
        .build()
        .expect("should build client")
}

/// `/subscriptions/{TEST_SUBSCRIPTION_ID}/resourceGroups/{resource_group}/providers/Microsoft.Network`.
pub fn network_path(resource_group: &str) -> String {
    format!(
        "/subscriptions/{TEST_SUBSCRIPTION_ID}/resourceGroups/{resource_group}/providers/Microsoft.Network"
    )
}
