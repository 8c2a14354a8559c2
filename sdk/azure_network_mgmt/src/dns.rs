//! DNS name availability.
//!
//! Public IP addresses get a DNS name of the form
//! `{label}.{location}.cloudapp.azure.com`. Use [`check_dns_name_availability`]
//! to find out whether a label is still free in a region before creating one.
//!
//! ```rust,no_run
//! # use azure_network_core::client::NetworkClient;
//! use azure_network_mgmt::dns;
//!
//! # async fn example(client: &NetworkClient) -> azure_network_core::error::NetworkResult<()> {
//! let result = dns::check_dns_name_availability(client, "westus", "myapp").await?;
//! if result.is_available() {
//!     println!("myapp.westus.cloudapp.azure.com is free");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Callers without an async runtime can use
//! [`check_dns_name_availability_blocking`], which runs the same request on a
//! private single-threaded runtime.

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::NETWORK_PROVIDER;
use azure_network_core::validate::require_arg;
use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

/// Response of a DNS name availability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsNameAvailabilityResult {
    /// Whether the label is free. Absent when the service did not say.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl DnsNameAvailabilityResult {
    /// `true` only when the service explicitly reported the label as free.
    pub fn is_available(&self) -> bool {
        self.available == Some(true)
    }
}

fn check_path(client: &NetworkClient, location: &str, domain_name_label: &str) -> NetworkResult<String> {
    require_arg("location", location)?;
    if domain_name_label.trim().is_empty() {
        return Err(NetworkError::InvalidArgument(
            "domain_name_label cannot be empty".into(),
        ));
    }

    let label: String = byte_serialize(domain_name_label.as_bytes()).collect();
    Ok(format!(
        "{}/providers/{}/locations/{}/CheckDnsNameAvailability?domainNameLabel={}&api-version={}",
        client.subscription_path(),
        NETWORK_PROVIDER,
        location,
        label,
        client.api_version()
    ))
}

/// Check whether a domain name label is available in a location.
///
/// # Arguments
///
/// * `location` - Region to check, e.g. `westus`.
/// * `domain_name_label` - The label to check.
///
/// # Errors
///
/// Returns [`NetworkError::InvalidArgument`] for an empty location or
/// label, before any request is sent. Service failures are returned as
/// [`NetworkError::Api`] carrying the cloud error code and message.
///
/// # Tracing
///
/// Emits a span named `network::dns::check_dns_name_availability`.
#[tracing::instrument(
    name = "network::dns::check_dns_name_availability",
    skip(client),
    fields(location = %location, label = %domain_name_label)
)]
pub async fn check_dns_name_availability(
    client: &NetworkClient,
    location: &str,
    domain_name_label: &str,
) -> NetworkResult<DnsNameAvailabilityResult> {
    let path = check_path(client, location, domain_name_label)?;

    tracing::debug!("checking DNS name availability");
    let response = client.get(&path).await?;
    let result = response.json::<DnsNameAvailabilityResult>().await?;

    tracing::debug!(available = ?result.available, "DNS name availability checked");
    Ok(result)
}

/// Blocking form of [`check_dns_name_availability`].
///
/// Arguments are validated before the runtime is created.
///
/// # Errors
///
/// Besides the errors of the async form, returns [`NetworkError::Runtime`]
/// when called from inside an async runtime or when the runtime cannot be
/// started.
pub fn check_dns_name_availability_blocking(
    client: &NetworkClient,
    location: &str,
    domain_name_label: &str,
) -> NetworkResult<DnsNameAvailabilityResult> {
    check_path(client, location, domain_name_label)?;

    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(NetworkError::Runtime(
            "check_dns_name_availability_blocking cannot be called from an async context; \
             use check_dns_name_availability instead"
                .into(),
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| NetworkError::Runtime(format!("failed to start runtime: {e}")))?;

    runtime.block_on(check_dns_name_availability(client, location, domain_name_label))
}
