//! Public IP addresses.

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::{
    ProvisioningState, Resource, ResourceId, SubResource, Tags, TagsUpdate,
};
use azure_network_core::{lro, pager, validate};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::models::IpAllocationMethod;

const COLLECTION: &str = "publicIPAddresses";

/// Allowed idle timeout for TCP connections, in minutes.
pub const IDLE_TIMEOUT_RANGE: RangeInclusive<u32> = 4..=30;

/// A public IP address.
pub type PublicIpAddress = Resource<PublicIpAddressProperties>;

/// Properties of a public IP address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    #[serde(rename = "publicIPAllocationMethod", skip_serializing_if = "Option::is_none")]
    pub public_ip_allocation_method: Option<IpAllocationMethod>,

    /// The IP configuration using this address (read-only).
    #[serde(rename = "ipConfiguration", skip_serializing_if = "Option::is_none")]
    pub ip_configuration: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_settings: Option<PublicIpAddressDnsSettings>,

    /// The assigned address (read-only; absent until a dynamic address is in use).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// DNS settings of a public IP address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressDnsSettings {
    /// `{label}.{region}.cloudapp.azure.com` is created for this label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_fqdn: Option<String>,
}

/// A request to create or replace a public IP address.
#[derive(Debug, Clone, Serialize)]
pub struct PublicIpAddressCreateRequest {
    pub location: String,

    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,

    pub properties: PublicIpAddressProperties,
}

/// Builder for [`PublicIpAddressCreateRequest`].
#[derive(Debug, Default)]
pub struct PublicIpAddressCreateRequestBuilder {
    location: Option<String>,
    tags: Tags,
    allocation_method: Option<IpAllocationMethod>,
    idle_timeout_minutes: Option<u32>,
    domain_name_label: Option<String>,
    reverse_fqdn: Option<String>,
}

impl PublicIpAddressCreateRequest {
    pub fn builder() -> PublicIpAddressCreateRequestBuilder {
        PublicIpAddressCreateRequestBuilder::default()
    }
}

impl PublicIpAddressCreateRequestBuilder {
    /// Set the Azure region. **Required.**
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Defaults to [`IpAllocationMethod::Dynamic`].
    pub fn allocation_method(mut self, method: IpAllocationMethod) -> Self {
        self.allocation_method = Some(method);
        self
    }

    /// Idle timeout in minutes, within [`IDLE_TIMEOUT_RANGE`].
    pub fn idle_timeout_minutes(mut self, minutes: u32) -> Self {
        self.idle_timeout_minutes = Some(minutes);
        self
    }

    pub fn domain_name_label(mut self, label: impl Into<String>) -> Self {
        self.domain_name_label = Some(label.into());
        self
    }

    /// Reverse DNS name; requires a domain name label.
    pub fn reverse_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.reverse_fqdn = Some(fqdn.into());
        self
    }

    pub fn build(self) -> NetworkResult<PublicIpAddressCreateRequest> {
        let location = validate::required("location", self.location)?;

        if let Some(minutes) = self.idle_timeout_minutes {
            if !IDLE_TIMEOUT_RANGE.contains(&minutes) {
                return Err(NetworkError::Builder(format!(
                    "idle_timeout_minutes must be between {} and {}, got {minutes}",
                    IDLE_TIMEOUT_RANGE.start(),
                    IDLE_TIMEOUT_RANGE.end()
                )));
            }
        }
        if let Some(label) = &self.domain_name_label {
            validate::dns_label(label)?;
        }
        if self.reverse_fqdn.is_some() && self.domain_name_label.is_none() {
            return Err(NetworkError::Builder(
                "reverse_fqdn requires domain_name_label".into(),
            ));
        }

        let dns_settings = self
            .domain_name_label
            .map(|label| PublicIpAddressDnsSettings {
                domain_name_label: Some(label),
                fqdn: None,
                reverse_fqdn: self.reverse_fqdn,
            });

        Ok(PublicIpAddressCreateRequest {
            location,
            tags: self.tags,
            properties: PublicIpAddressProperties {
                public_ip_allocation_method: Some(
                    self.allocation_method.unwrap_or(IpAllocationMethod::Dynamic),
                ),
                idle_timeout_in_minutes: self.idle_timeout_minutes,
                dns_settings,
                ..Default::default()
            },
        })
    }
}

/// Create or replace a public IP address and wait for provisioning to finish.
#[tracing::instrument(
    name = "network::public_ip_addresses::create_or_update",
    skip(client, request),
    fields(resource_group = %resource_group, name = %name, location = %request.location)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    request: &PublicIpAddressCreateRequest,
) -> NetworkResult<PublicIpAddress> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let pip: PublicIpAddress = lro::put_and_wait(client, &path, request).await?;

    tracing::debug!(ip_address = ?pip.properties.ip_address, "public IP address provisioned");
    Ok(pip)
}

/// Send back a modified copy of a fetched public IP address.
#[tracing::instrument(
    name = "network::public_ip_addresses::update",
    skip(client, pip),
    fields(resource_group = %resource_group, name = %pip.name)
)]
pub async fn update(
    client: &NetworkClient,
    resource_group: &str,
    pip: &PublicIpAddress,
) -> NetworkResult<PublicIpAddress> {
    let path = client.resource_path(resource_group, COLLECTION, &pip.name)?;
    lro::put_and_wait(client, &path, pip).await
}

#[tracing::instrument(
    name = "network::public_ip_addresses::update_tags",
    skip(client, tags),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn update_tags(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    tags: &TagsUpdate,
) -> NetworkResult<PublicIpAddress> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.patch(&path, tags).await?;
    Ok(response.json::<PublicIpAddress>().await?)
}

#[tracing::instrument(
    name = "network::public_ip_addresses::get",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn get(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
) -> NetworkResult<PublicIpAddress> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<PublicIpAddress>().await?)
}

pub async fn get_by_id(client: &NetworkClient, id: &str) -> NetworkResult<PublicIpAddress> {
    let id: ResourceId = id.parse()?;
    id.expect_type(COLLECTION)?;
    client.ensure_subscription(&id)?;
    get(client, &id.resource_group, &id.name).await
}

#[tracing::instrument(
    name = "network::public_ip_addresses::list",
    skip(client),
    fields(resource_group = %resource_group)
)]
pub async fn list(client: &NetworkClient, resource_group: &str) -> NetworkResult<Vec<PublicIpAddress>> {
    let path = client.resource_collection_path(resource_group, COLLECTION)?;
    pager::collect_all(client, path).await
}

#[tracing::instrument(name = "network::public_ip_addresses::list_all", skip(client))]
pub async fn list_all(client: &NetworkClient) -> NetworkResult<Vec<PublicIpAddress>> {
    pager::collect_all(client, client.subscription_collection_path(COLLECTION)).await
}

#[tracing::instrument(
    name = "network::public_ip_addresses::delete",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn delete(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::delete_and_wait(client, &path).await
}
