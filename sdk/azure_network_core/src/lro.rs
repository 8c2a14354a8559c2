//! Long-running operations.
//!
//! Resource Manager answers slow PUT, DELETE and POST requests with
//! `201 Created` or `202 Accepted` plus a URL to poll:
//!
//! - `Azure-AsyncOperation` points at an operation status document
//!   (`{"status": "InProgress" | "Succeeded" | "Failed" | "Canceled"}`).
//! - `Location` points at a URL that returns `202` until the operation is
//!   done, then `200`/`204`.
//!
//! The functions here issue the request, follow whichever header is present
//! until the operation reaches a terminal state, and return the final result.

use crate::client::NetworkClient;
use crate::error::{NetworkError, NetworkResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the operation status URL.
pub const ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";

/// Header carrying the location polling URL.
pub const LOCATION_HEADER: &str = "Location";

/// Where to poll for the outcome of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTarget {
    /// An `Azure-AsyncOperation` status URL.
    AsyncOperation(String),
    /// A `Location` URL.
    Location(String),
}

/// Status of an `Azure-AsyncOperation` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// An operation status document.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationStatusResponse {
    pub status: OperationStatus,
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Pick the poll target from a response, preferring `Azure-AsyncOperation`.
pub fn poll_target(response: &reqwest::Response) -> Option<PollTarget> {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    header(ASYNC_OPERATION_HEADER)
        .map(PollTarget::AsyncOperation)
        .or_else(|| header(LOCATION_HEADER).map(PollTarget::Location))
}

/// `Retry-After` in seconds, if present and well-formed.
pub fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Poll `target` until the operation completes.
///
/// # Errors
///
/// Returns [`NetworkError::OperationFailed`] when the operation ends in
/// `Failed` or `Canceled`, and [`NetworkError::PollTimeout`] when the
/// client's `max_poll_attempts` is exhausted.
#[tracing::instrument(name = "network::lro::wait", skip(client, target), fields(target = ?target))]
pub async fn wait(
    client: &NetworkClient,
    target: &PollTarget,
    initial_delay: Option<Duration>,
) -> NetworkResult<()> {
    let max_attempts = client.max_poll_attempts();
    let mut delay = initial_delay.unwrap_or(client.poll_interval());

    for attempt in 1..=max_attempts {
        tokio::time::sleep(delay).await;

        match target {
            PollTarget::AsyncOperation(url) => {
                let response = client.get_url(url).await?;
                delay = retry_after(&response).unwrap_or(client.poll_interval());
                let status = response.json::<OperationStatusResponse>().await?;

                match status.status {
                    OperationStatus::Succeeded => {
                        tracing::debug!(attempt, "operation succeeded");
                        return Ok(());
                    }
                    OperationStatus::Failed | OperationStatus::Canceled => {
                        let error = status.error.unwrap_or(OperationError {
                            code: None,
                            message: None,
                        });
                        return Err(NetworkError::OperationFailed {
                            status: format!("{:?}", status.status),
                            code: error.code.unwrap_or_else(|| "Unknown".into()),
                            message: error.message.unwrap_or_default(),
                        });
                    }
                    _ => {
                        tracing::trace!(attempt, status = ?status.status, "operation in progress");
                    }
                }
            }
            PollTarget::Location(url) => {
                let response = client.get_url(url).await?;
                if response.status().as_u16() != 202 {
                    tracing::debug!(attempt, status = response.status().as_u16(), "operation finished");
                    return Ok(());
                }
                delay = retry_after(&response).unwrap_or(client.poll_interval());
                tracing::trace!(attempt, "operation still accepted");
            }
        }
    }

    Err(NetworkError::PollTimeout {
        attempts: max_attempts,
    })
}

/// PUT a resource and wait for provisioning to finish, returning the final resource.
///
/// Updates of an existing resource answer `200` while still provisioning,
/// so any success status carrying a poll header is awaited.
pub async fn put_and_wait<B, T>(client: &NetworkClient, path: &str, body: &B) -> NetworkResult<T>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let response = client.put(path, body).await?;

    match poll_target(&response) {
        Some(target) if matches!(response.status().as_u16(), 200..=202) => {
            let delay = retry_after(&response);
            wait(client, &target, delay).await?;
            let response = client.get(path).await?;
            Ok(response.json::<T>().await?)
        }
        _ => Ok(response.json::<T>().await?),
    }
}

/// DELETE a resource and wait until it is gone.
///
/// A `404` from the initial request counts as success: the resource is already absent.
pub async fn delete_and_wait(client: &NetworkClient, path: &str) -> NetworkResult<()> {
    let response = match client.delete(path).await {
        Ok(response) => response,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    };

    finish(client, response).await
}

/// POST a resource action (e.g. `start`, `stop`) and wait for it to finish.
pub async fn post_and_wait(client: &NetworkClient, path: &str) -> NetworkResult<()> {
    let response = client.post::<()>(path, None).await?;
    finish(client, response).await
}

async fn finish(client: &NetworkClient, response: reqwest::Response) -> NetworkResult<()> {
    if response.status().as_u16() != 202 {
        return Ok(());
    }
    match poll_target(&response) {
        Some(target) => wait(client, &target, retry_after(&response)).await,
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_mock_client;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Thing {
        name: String,
        state: String,
    }

    #[tokio::test]
    async fn put_without_poll_header_returns_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/things/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"name": "a", "state": "Succeeded"})),
            )
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let thing: Thing = put_and_wait(&client, "/things/a", &serde_json::json!({}))
            .await
            .expect("should succeed");

        assert_eq!(thing.name, "a");
        assert_eq!(thing.state, "Succeeded");
    }

    #[tokio::test]
    async fn put_polls_async_operation_then_fetches_resource() {
        let server = MockServer::start().await;
        let op_url = format!("{}/operations/op1", server.uri());
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        Mock::given(method("PUT"))
            .and(path("/things/a"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header(ASYNC_OPERATION_HEADER, op_url.as_str())
                    .insert_header("Retry-After", "0")
                    .set_body_json(serde_json::json!({"name": "a", "state": "Updating"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(move |_req: &wiremock::Request| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let status = if n < 2 { "InProgress" } else { "Succeeded" };
                ResponseTemplate::new(200)
                    .insert_header("Retry-After", "0")
                    .set_body_json(serde_json::json!({"status": status}))
            })
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/things/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"name": "a", "state": "Succeeded"})),
            )
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let thing: Thing = put_and_wait(&client, "/things/a", &serde_json::json!({}))
            .await
            .expect("should succeed");

        assert_eq!(thing.state, "Succeeded");
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn put_update_answered_with_200_is_awaited() {
        let server = MockServer::start().await;
        let op_url = format!("{}/operations/upd", server.uri());

        Mock::given(method("PUT"))
            .and(path("/things/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(ASYNC_OPERATION_HEADER, op_url.as_str())
                    .insert_header("Retry-After", "0")
                    .set_body_json(serde_json::json!({"name": "a", "state": "Updating"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/upd"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "Succeeded"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/things/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"name": "a", "state": "Succeeded"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let thing: Thing = put_and_wait(&client, "/things/a", &serde_json::json!({}))
            .await
            .expect("should succeed");

        assert_eq!(thing.state, "Succeeded");
    }

    #[tokio::test]
    async fn failed_operation_surfaces_error() {
        let server = MockServer::start().await;
        let op_url = format!("{}/operations/op2", server.uri());

        Mock::given(method("PUT"))
            .and(path("/things/b"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header(ASYNC_OPERATION_HEADER, op_url.as_str())
                    .set_body_json(serde_json::json!({"name": "b", "state": "Updating"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/op2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "Failed",
                "error": {"code": "AddressSpaceOverlap", "message": "overlaps with vnet2"}
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let err = put_and_wait::<_, Thing>(&client, "/things/b", &serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            NetworkError::OperationFailed {
                status,
                code,
                message,
            } => {
                assert_eq!(status, "Failed");
                assert_eq!(code, "AddressSpaceOverlap");
                assert_eq!(message, "overlaps with vnet2");
            }
            other => panic!("Expected OperationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_polls_location_until_done() {
        let server = MockServer::start().await;
        let location = format!("{}/locations/op3", server.uri());
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        Mock::given(method("DELETE"))
            .and(path("/things/c"))
            .respond_with(ResponseTemplate::new(202).insert_header(LOCATION_HEADER, location.as_str()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/locations/op3"))
            .respond_with(move |_req: &wiremock::Request| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(202)
                } else {
                    ResponseTemplate::new(204)
                }
            })
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        delete_and_wait(&client, "/things/c").await.expect("should succeed");

        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn delete_of_missing_resource_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/things/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": "ResourceNotFound", "message": "not found"}
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        assert!(delete_and_wait(&client, "/things/gone").await.is_ok());
    }

    #[tokio::test]
    async fn poll_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        let op_url = format!("{}/operations/stuck", server.uri());

        Mock::given(method("POST"))
            .and(path("/things/d/start"))
            .respond_with(ResponseTemplate::new(202).insert_header(ASYNC_OPERATION_HEADER, op_url.as_str()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/stuck"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "InProgress"})),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = crate::test_support::mock_client_builder(&server)
            .max_poll_attempts(3)
            .build()
            .expect("should build");

        let err = post_and_wait(&client, "/things/d/start").await.unwrap_err();
        assert!(matches!(err, NetworkError::PollTimeout { attempts: 3 }));
    }

    #[tokio::test]
    async fn poll_refuses_foreign_host() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/things/e"))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header(LOCATION_HEADER, "https://elsewhere.example.com/op"),
            )
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let err = delete_and_wait(&client, "/things/e").await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidEndpoint { .. }));
    }

    #[test]
    fn operation_status_parsing() {
        let status: OperationStatusResponse =
            serde_json::from_value(serde_json::json!({"status": "Canceled"})).unwrap();
        assert_eq!(status.status, OperationStatus::Canceled);
        assert!(status.status.is_terminal());

        let status: OperationStatusResponse =
            serde_json::from_value(serde_json::json!({"status": "Deleting"})).unwrap();
        assert_eq!(status.status, OperationStatus::Unknown);
        assert!(!status.status.is_terminal());
    }
}
