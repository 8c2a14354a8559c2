//! Virtual network peerings.
//!
//! Peerings are only known to API version [`PEERING_API_VERSION`] and later,
//! so every request in this module pins that version regardless of the
//! client's default.
//!
//! ```rust,no_run
//! # use azure_network_core::client::NetworkClient;
//! use azure_network_mgmt::peering::{self, VirtualNetworkPeeringProperties};
//!
//! # async fn example(client: &NetworkClient) -> Result<(), Box<dyn std::error::Error>> {
//! let properties = VirtualNetworkPeeringProperties::builder()
//!     .remote_virtual_network(
//!         "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg2/providers/Microsoft.Network/virtualNetworks/hub",
//!     )
//!     .allow_virtual_network_access(true)
//!     .use_remote_gateways(true)
//!     .build()?;
//!
//! let peering = peering::create_or_update(client, "rg1", "spoke", "spoke-to-hub", &properties).await?;
//! println!("{:?}", peering.properties.peering_state);
//! # Ok(())
//! # }
//! ```

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::{ChildResource, ProvisioningState, ResourceId, SubResource};
use azure_network_core::validate::{self, require_arg};
use azure_network_core::{lro, pager};
use serde::{Deserialize, Serialize};

use crate::models::PEERING_API_VERSION;
use crate::virtual_network;

const CHILD_COLLECTION: &str = "virtualNetworkPeerings";

/// A virtual network peering.
pub type VirtualNetworkPeering = ChildResource<VirtualNetworkPeeringProperties>;

/// Connection state of a peering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeeringState {
    /// Created on this side only.
    Initiated,
    Connected,
    /// The remote side was deleted; this peering must be recreated.
    Disconnected,
    #[serde(other)]
    Unknown,
}

/// Properties of a virtual network peering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkPeeringProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_virtual_network: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_virtual_network_access: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_forwarded_traffic: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_gateway_transit: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_remote_gateways: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub peering_state: Option<PeeringState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Builder for [`VirtualNetworkPeeringProperties`].
#[derive(Debug, Default)]
pub struct VirtualNetworkPeeringBuilder {
    remote_virtual_network: Option<String>,
    allow_virtual_network_access: Option<bool>,
    allow_forwarded_traffic: Option<bool>,
    allow_gateway_transit: Option<bool>,
    use_remote_gateways: Option<bool>,
}

impl VirtualNetworkPeeringProperties {
    pub fn builder() -> VirtualNetworkPeeringBuilder {
        VirtualNetworkPeeringBuilder::default()
    }
}

impl VirtualNetworkPeeringBuilder {
    /// Resource ID of the virtual network to peer with. **Required.**
    pub fn remote_virtual_network(mut self, id: impl Into<String>) -> Self {
        self.remote_virtual_network = Some(id.into());
        self
    }

    pub fn allow_virtual_network_access(mut self, allow: bool) -> Self {
        self.allow_virtual_network_access = Some(allow);
        self
    }

    pub fn allow_forwarded_traffic(mut self, allow: bool) -> Self {
        self.allow_forwarded_traffic = Some(allow);
        self
    }

    /// Let the remote network use this network's gateway.
    pub fn allow_gateway_transit(mut self, allow: bool) -> Self {
        self.allow_gateway_transit = Some(allow);
        self
    }

    /// Use the remote network's gateway. Requires gateway transit on the remote side.
    pub fn use_remote_gateways(mut self, use_remote: bool) -> Self {
        self.use_remote_gateways = Some(use_remote);
        self
    }

    /// Build the properties.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Builder`] if the remote network is missing or
    /// both `allow_gateway_transit` and `use_remote_gateways` are set, and
    /// [`NetworkError::InvalidResourceId`] if the remote ID is not a virtual network.
    pub fn build(self) -> NetworkResult<VirtualNetworkPeeringProperties> {
        let remote = validate::required("remote_virtual_network", self.remote_virtual_network)?;
        let remote: ResourceId = remote.parse()?;
        remote.expect_type(virtual_network::COLLECTION)?;

        if self.allow_gateway_transit == Some(true) && self.use_remote_gateways == Some(true) {
            return Err(NetworkError::Builder(
                "allow_gateway_transit and use_remote_gateways cannot both be enabled".into(),
            ));
        }

        Ok(VirtualNetworkPeeringProperties {
            remote_virtual_network: Some(SubResource::from(&remote)),
            allow_virtual_network_access: self.allow_virtual_network_access,
            allow_forwarded_traffic: self.allow_forwarded_traffic,
            allow_gateway_transit: self.allow_gateway_transit,
            use_remote_gateways: self.use_remote_gateways,
            ..Default::default()
        })
    }
}

fn collection_path(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
) -> NetworkResult<String> {
    Ok(format!(
        "{}/{CHILD_COLLECTION}",
        client.resource_path(resource_group, virtual_network::COLLECTION, virtual_network)?
    ))
}

fn peering_path(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> NetworkResult<String> {
    require_arg("peering name", name)?;
    Ok(format!(
        "{}/{name}?api-version={PEERING_API_VERSION}",
        collection_path(client, resource_group, virtual_network)?
    ))
}

/// Create or replace a peering and wait for provisioning to finish.
#[tracing::instrument(
    name = "network::virtual_network_peerings::create_or_update",
    skip(client, properties),
    fields(resource_group = %resource_group, virtual_network = %virtual_network, name = %name)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
    properties: &VirtualNetworkPeeringProperties,
) -> NetworkResult<VirtualNetworkPeering> {
    tracing::debug!("creating peering");

    let path = peering_path(client, resource_group, virtual_network, name)?;
    let peering: VirtualNetworkPeering =
        lro::put_and_wait(client, &path, &ChildResource::new(name, properties)).await?;

    tracing::debug!(state = ?peering.properties.peering_state, "peering provisioned");
    Ok(peering)
}

/// Get a peering.
#[tracing::instrument(
    name = "network::virtual_network_peerings::get",
    skip(client),
    fields(resource_group = %resource_group, virtual_network = %virtual_network, name = %name)
)]
pub async fn get(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> NetworkResult<VirtualNetworkPeering> {
    let path = peering_path(client, resource_group, virtual_network, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<VirtualNetworkPeering>().await?)
}

/// List the peerings of a virtual network.
#[tracing::instrument(
    name = "network::virtual_network_peerings::list",
    skip(client),
    fields(resource_group = %resource_group, virtual_network = %virtual_network)
)]
pub async fn list(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
) -> NetworkResult<Vec<VirtualNetworkPeering>> {
    let path = format!(
        "{}?api-version={PEERING_API_VERSION}",
        collection_path(client, resource_group, virtual_network)?
    );
    pager::collect_all(client, path).await
}

/// Delete a peering and wait until it is gone.
#[tracing::instrument(
    name = "network::virtual_network_peerings::delete",
    skip(client),
    fields(resource_group = %resource_group, virtual_network = %virtual_network, name = %name)
)]
pub async fn delete(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> NetworkResult<()> {
    let path = peering_path(client, resource_group, virtual_network, name)?;
    lro::delete_and_wait(client, &path).await
}
