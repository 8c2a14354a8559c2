//! HTTP client for Azure Network Management.
//!
//! This module provides [`NetworkClient`], the entry point for every
//! operation in the SDK. The client holds the subscription ID, API version,
//! credential, and base URL, and performs the REST calls with
//! authentication and retry on transient failures.
//!
//! # Examples
//!
//! ## Using a pre-acquired token
//! ```rust,no_run
//! use azure_network_core::client::NetworkClient;
//! use azure_network_core::auth::NetworkCredential;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetworkClient::builder()
//!     .subscription_id("00000000-0000-0000-0000-000000000000")
//!     .credential(NetworkCredential::access_token("eyJ0eXAi..."))
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the Azure CLI
//! ```rust,no_run
//! use azure_network_core::client::NetworkClient;
//! use azure_network_core::auth::NetworkCredential;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetworkClient::builder()
//!     .subscription_id("00000000-0000-0000-0000-000000000000")
//!     .credential(NetworkCredential::azure_cli()?)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::auth::NetworkCredential;
use crate::error::{NetworkError, NetworkResult};
use crate::models::{ResourceId, NETWORK_PROVIDER};
use crate::validate::require_arg;
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde::Serialize;
use url::Url;

use std::time::Duration;

/// Default Azure Resource Manager endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Default API version of the Microsoft.Network resource provider.
pub const DEFAULT_API_VERSION: &str = "2015-06-15";

/// Default connection timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read/response timeout (60 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default delay between long-running operation polls when the service
/// does not send `Retry-After`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default maximum number of long-running operation polls (one hour at the default interval).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 360;

/// Environment variable consulted when no subscription ID is given to the builder.
pub const SUBSCRIPTION_ID_ENV: &str = "AZURE_SUBSCRIPTION_ID";

/// Environment variable consulted when no endpoint is given to the builder.
pub const ENDPOINT_ENV: &str = "AZURE_RESOURCE_MANAGER_ENDPOINT";

/// Determines if an HTTP status code represents a retriable error.
///
/// Retriable errors are transient server-side issues that may succeed on retry:
/// - 429 Too Many Requests (throttling)
/// - 500 Internal Server Error
/// - 502 Bad Gateway
/// - 503 Service Unavailable
/// - 504 Gateway Timeout
#[inline]
pub fn is_retriable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Configuration for automatic retry behavior on transient errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Initial backoff duration before the first retry.
    /// Subsequent retries use exponential backoff (2^attempt * initial_backoff).
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (zero-based), with ±25% jitter.
    pub(crate) fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff * 2_u32.saturating_pow(attempt);
        base.mul_f64(0.75 + fastrand::f64() * 0.5)
    }
}

/// The service client for the Azure Network Management API.
///
/// Every resource module (`virtual_network`, `load_balancer`, ...) takes a
/// `&NetworkClient`. The client is cheaply cloneable and can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    pub(crate) http: HttpClient,
    pub(crate) endpoint: Url,
    pub(crate) credential: NetworkCredential,
    pub(crate) subscription_id: String,
    pub(crate) api_version: String,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) poll_interval: Duration,
    pub(crate) max_poll_attempts: u32,
}

/// Builder for constructing a [`NetworkClient`].
///
/// Use [`NetworkClient::builder()`] to create a new builder.
#[derive(Debug, Default)]
pub struct NetworkClientBuilder {
    subscription_id: Option<String>,
    endpoint: Option<String>,
    credential: Option<NetworkCredential>,
    api_version: Option<String>,
    http_client: Option<HttpClient>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    poll_interval: Option<Duration>,
    max_poll_attempts: Option<u32>,
}

impl NetworkClient {
    /// Create a new builder for configuring a `NetworkClient`.
    pub fn builder() -> NetworkClientBuilder {
        NetworkClientBuilder::default()
    }

    /// Get the Resource Manager endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the subscription ID all requests are scoped to.
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Get the API version being used.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the retry policy configuration.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Default delay between long-running operation polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Maximum number of polls before a long-running operation gives up.
    pub fn max_poll_attempts(&self) -> u32 {
        self.max_poll_attempts
    }

    /// `/subscriptions/{subscription_id}`.
    pub fn subscription_path(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }

    /// `/subscriptions/{subscription_id}/resourceGroups/{resource_group}`.
    pub fn resource_group_path(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, resource_group
        )
    }

    /// Path of a named `Microsoft.Network` resource, rejecting blank or nested names.
    pub fn resource_path(
        &self,
        resource_group: &str,
        collection: &str,
        name: &str,
    ) -> NetworkResult<String> {
        require_arg("name", name)?;
        Ok(format!(
            "{}/{name}",
            self.resource_collection_path(resource_group, collection)?
        ))
    }

    /// Path of a `Microsoft.Network` collection in a resource group.
    pub fn resource_collection_path(
        &self,
        resource_group: &str,
        collection: &str,
    ) -> NetworkResult<String> {
        require_arg("resource_group", resource_group)?;
        Ok(format!(
            "{}/providers/{NETWORK_PROVIDER}/{collection}",
            self.resource_group_path(resource_group)
        ))
    }

    /// Path of a `Microsoft.Network` collection across the subscription.
    pub fn subscription_collection_path(&self, collection: &str) -> String {
        format!(
            "{}/providers/{NETWORK_PROVIDER}/{collection}",
            self.subscription_path()
        )
    }

    /// Reject a resource ID that belongs to another subscription.
    pub fn ensure_subscription(&self, id: &ResourceId) -> NetworkResult<()> {
        if id.subscription_id.eq_ignore_ascii_case(&self.subscription_id) {
            Ok(())
        } else {
            Err(NetworkError::InvalidArgument(format!(
                "resource ID '{id}' is in subscription {}, but the client is scoped to {}",
                id.subscription_id, self.subscription_id
            )))
        }
    }

    /// The OAuth scope requested for this endpoint.
    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.endpoint.as_str().trim_end_matches('/'))
    }

    /// Build a full URL for an API path.
    ///
    /// The client's `api-version` is appended as a query parameter unless the
    /// path already carries one.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined to the endpoint URL.
    pub fn url(&self, path: &str) -> NetworkResult<Url> {
        let mut url = self
            .endpoint
            .join(path)
            .map_err(|e| NetworkError::invalid_endpoint_with_source("failed to construct URL", e))?;

        if !url.query_pairs().any(|(k, _)| k == "api-version") {
            url.query_pairs_mut()
                .append_pair("api-version", &self.api_version);
        }
        Ok(url)
    }

    /// Resolve an absolute URL handed out by the service (`nextLink`,
    /// `Azure-AsyncOperation`, `Location`).
    ///
    /// The URL must point at the same host as the configured endpoint so
    /// credentials are never sent elsewhere.
    pub fn absolute_url(&self, url: &str) -> NetworkResult<Url> {
        let parsed = Url::parse(url)
            .map_err(|e| NetworkError::invalid_endpoint_with_source("invalid service URL", e))?;

        if parsed.host_str() != self.endpoint.host_str() || parsed.port() != self.endpoint.port() {
            return Err(NetworkError::invalid_endpoint(format!(
                "refusing to follow URL on a different host: {}",
                parsed.host_str().unwrap_or_default()
            )));
        }
        Ok(parsed)
    }

    /// Send a GET request with automatic retry on transient errors.
    pub async fn get(&self, path: &str) -> NetworkResult<reqwest::Response> {
        let url = self.url(path)?;
        self.send(Method::GET, url, None::<&()>).await
    }

    /// Send a GET request to an absolute service URL (paging and polling).
    pub async fn get_url(&self, url: &str) -> NetworkResult<reqwest::Response> {
        let url = self.absolute_url(url)?;
        self.send(Method::GET, url, None::<&()>).await
    }

    /// Send a PUT request with a JSON body (create or replace a resource).
    pub async fn put<T: Serialize>(&self, path: &str, body: &T) -> NetworkResult<reqwest::Response> {
        let url = self.url(path)?;
        self.send(Method::PUT, url, Some(body)).await
    }

    /// Send a PATCH request with a JSON body (partial update).
    pub async fn patch<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> NetworkResult<reqwest::Response> {
        let url = self.url(path)?;
        self.send(Method::PATCH, url, Some(body)).await
    }

    /// Send a POST request, with an optional JSON body (resource actions).
    pub async fn post<T: Serialize>(
        &self,
        path: &str,
        body: Option<&T>,
    ) -> NetworkResult<reqwest::Response> {
        let url = self.url(path)?;
        self.send(Method::POST, url, body).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> NetworkResult<reqwest::Response> {
        let url = self.url(path)?;
        self.send(Method::DELETE, url, None::<&()>).await
    }

    /// Send a request with authentication, retrying retriable HTTP errors
    /// (429, 500, 502, 503, 504) with exponential backoff and jitter.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, serialization fails,
    /// the request fails after all retries, or the server returns a
    /// non-retriable error response.
    async fn send<T: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&T>,
    ) -> NetworkResult<reqwest::Response> {
        let auth = self.credential.resolve(&self.token_scope()).await?;

        for attempt in 0..=self.retry_policy.max_retries {
            let mut request: RequestBuilder = self
                .http
                .request(method.clone(), url.clone())
                .header("Authorization", &auth);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();

            if response.status().is_success() {
                return Ok(response);
            }

            if !is_retriable_status(status) || attempt == self.retry_policy.max_retries {
                return Self::check_response(response).await;
            }

            let backoff = self.retry_policy.backoff(attempt);
            tracing::debug!(
                %method,
                status,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "retrying transient failure"
            );
            tokio::time::sleep(backoff).await;
        }

        unreachable!("retry loop should return before reaching here")
    }

    /// Maximum length for error messages to prevent sensitive data leaks.
    const MAX_ERROR_MESSAGE_LEN: usize = 1000;

    /// Replace bearer tokens in service error text with `[REDACTED]`.
    pub(crate) fn sanitize_error_message(msg: &str) -> String {
        const BEARER: &str = "Bearer ";
        const REDACTED: &str = "[REDACTED]";

        let mut result = String::with_capacity(msg.len());
        let mut rest = msg;
        while let Some(pos) = rest.find(BEARER) {
            let token_start = pos + BEARER.len();
            result.push_str(&rest[..token_start]);
            let token_len = rest[token_start..]
                .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == ',')
                .unwrap_or(rest.len() - token_start);
            if token_len > 0 {
                result.push_str(REDACTED);
            }
            rest = &rest[token_start + token_len..];
        }
        result.push_str(rest);
        result
    }

    /// Sanitize, then truncate a message to [`Self::MAX_ERROR_MESSAGE_LEN`] bytes.
    pub(crate) fn truncate_message(msg: &str) -> String {
        let sanitized = Self::sanitize_error_message(msg);

        if sanitized.len() > Self::MAX_ERROR_MESSAGE_LEN {
            let mut cut = Self::MAX_ERROR_MESSAGE_LEN;
            while !sanitized.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated)", &sanitized[..cut])
        } else {
            sanitized
        }
    }

    /// Turn a failed response into a [`NetworkError`].
    ///
    /// Cloud errors arrive either wrapped (`{"error": {"code", "message"}}`)
    /// or bare (`{"code", "message"}`); anything else becomes
    /// [`NetworkError::Http`].
    async fn check_response(response: reqwest::Response) -> NetworkResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            let envelope = value.get("error").unwrap_or(&value);
            if let Some(code) = envelope.get("code").and_then(|c| c.as_str()) {
                let message = envelope
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or(&body);
                return Err(NetworkError::Api {
                    status,
                    code: code.to_string(),
                    message: Self::truncate_message(message),
                });
            }
        }

        Err(NetworkError::http(status, Self::truncate_message(&body)))
    }
}

impl NetworkClientBuilder {
    /// Set the subscription all requests are scoped to.
    ///
    /// If not set, the builder will check the `AZURE_SUBSCRIPTION_ID`
    /// environment variable.
    pub fn subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = Some(subscription_id.into());
        self
    }

    /// Set the Resource Manager endpoint URL.
    ///
    /// Defaults to `AZURE_RESOURCE_MANAGER_ENDPOINT`, then
    /// [`DEFAULT_ENDPOINT`]. Sovereign clouds use their own endpoint, e.g.
    /// `https://management.chinacloudapi.cn`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credential to use for authentication.
    ///
    /// If not set, the builder will use [`NetworkCredential::from_env()`].
    pub fn credential(mut self, credential: NetworkCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the API version.
    ///
    /// Defaults to [`DEFAULT_API_VERSION`] (`2015-06-15`).
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set a custom HTTP client.
    ///
    /// **Note:** If you provide a custom HTTP client, any timeout configuration
    /// via [`connect_timeout`](Self::connect_timeout) or
    /// [`read_timeout`](Self::read_timeout) will be ignored.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout, covering the whole request/response cycle.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the retry policy for transient errors.
    ///
    /// Defaults to 3 retries with 500ms initial backoff.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Set the delay between long-running operation polls.
    ///
    /// A `Retry-After` header from the service takes precedence.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the maximum number of long-running operation polls.
    pub fn max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = Some(attempts);
        self
    }

    /// Build the `NetworkClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No subscription ID is provided and `AZURE_SUBSCRIPTION_ID` is not set
    /// - The subscription ID is empty
    /// - The endpoint URL is invalid
    /// - The HTTP client cannot be created
    /// - Credential creation fails (when using environment-based credentials)
    pub fn build(self) -> NetworkResult<NetworkClient> {
        let subscription_id = self
            .subscription_id
            .or_else(|| std::env::var(SUBSCRIPTION_ID_ENV).ok())
            .ok_or_else(|| {
                NetworkError::MissingConfig(
                    "subscription_id is required. Set it via builder or AZURE_SUBSCRIPTION_ID env var."
                        .into(),
                )
            })?;
        if subscription_id.trim().is_empty() {
            return Err(NetworkError::MissingConfig(
                "subscription_id cannot be empty".into(),
            ));
        }

        let endpoint_str = self
            .endpoint
            .or_else(|| std::env::var(ENDPOINT_ENV).ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let endpoint = Url::parse(&endpoint_str)
            .map_err(|e| NetworkError::invalid_endpoint_with_source("invalid endpoint URL", e))?;
        if endpoint.cannot_be_a_base() {
            return Err(NetworkError::invalid_endpoint(format!(
                "endpoint '{endpoint_str}' cannot be used as a base URL"
            )));
        }

        let http = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .connect_timeout(self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
                .timeout(self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT))
                .build()?,
        };

        let credential = match self.credential {
            Some(credential) => credential,
            None => NetworkCredential::from_env()?,
        };

        Ok(NetworkClient {
            http,
            endpoint,
            credential,
            subscription_id,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            retry_policy: self.retry_policy.unwrap_or_default(),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            max_poll_attempts: self.max_poll_attempts.unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS),
        })
    }
}
