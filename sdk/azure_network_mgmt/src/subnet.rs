//! Subnets of a virtual network.

use azure_network_core::client::NetworkClient;
use azure_network_core::error::NetworkResult;
use azure_network_core::models::{ChildResource, ProvisioningState, ResourceId, SubResource};
use azure_network_core::validate::{self, require_arg};
use azure_network_core::{lro, pager};
use serde::{Deserialize, Serialize};

use crate::virtual_network;

const CHILD_COLLECTION: &str = "subnets";

/// A subnet.
pub type Subnet = ChildResource<SubnetProperties>;

/// Properties of a subnet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_table: Option<SubResource>,

    /// NIC IP configurations placed in this subnet (read-only).
    #[serde(rename = "ipConfigurations", default, skip_serializing_if = "Vec::is_empty")]
    pub ip_configurations: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Builder for a subnet definition.
#[derive(Debug, Default)]
pub struct SubnetBuilder {
    address_prefix: Option<String>,
    network_security_group: Option<String>,
    route_table: Option<String>,
}

impl SubnetProperties {
    pub fn builder() -> SubnetBuilder {
        SubnetBuilder::default()
    }
}

impl SubnetBuilder {
    /// Set the address prefix in CIDR notation. **Required.**
    pub fn address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.address_prefix = Some(prefix.into());
        self
    }

    /// Associate a network security group by resource ID.
    pub fn network_security_group(mut self, id: impl Into<String>) -> Self {
        self.network_security_group = Some(id.into());
        self
    }

    /// Associate a route table by resource ID.
    pub fn route_table(mut self, id: impl Into<String>) -> Self {
        self.route_table = Some(id.into());
        self
    }

    pub fn build(self) -> NetworkResult<SubnetProperties> {
        let address_prefix = validate::required("address_prefix", self.address_prefix)?;
        validate::cidr("address_prefix", &address_prefix)?;

        let nsg = self.network_security_group.map(reference).transpose()?;
        let route_table = self.route_table.map(reference).transpose()?;

        Ok(SubnetProperties {
            address_prefix: Some(address_prefix),
            network_security_group: nsg,
            route_table,
            ..Default::default()
        })
    }
}

fn reference(id: String) -> NetworkResult<SubResource> {
    let parsed: ResourceId = id.parse()?;
    Ok(SubResource::from(&parsed))
}

fn subnet_path(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> NetworkResult<String> {
    require_arg("subnet name", name)?;
    Ok(format!(
        "{}/{CHILD_COLLECTION}/{name}",
        client.resource_path(resource_group, virtual_network::COLLECTION, virtual_network)?
    ))
}

/// Create or replace a subnet and wait for provisioning to finish.
#[tracing::instrument(
    name = "network::subnets::create_or_update",
    skip(client, properties),
    fields(resource_group = %resource_group, virtual_network = %virtual_network, name = %name)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
    properties: &SubnetProperties,
) -> NetworkResult<Subnet> {
    tracing::debug!("creating subnet");

    let path = subnet_path(client, resource_group, virtual_network, name)?;
    let body = ChildResource::new(name, properties);
    lro::put_and_wait(client, &path, &body).await
}

/// Get a subnet.
#[tracing::instrument(
    name = "network::subnets::get",
    skip(client),
    fields(resource_group = %resource_group, virtual_network = %virtual_network, name = %name)
)]
pub async fn get(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> NetworkResult<Subnet> {
    let path = subnet_path(client, resource_group, virtual_network, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<Subnet>().await?)
}

/// List the subnets of a virtual network.
#[tracing::instrument(
    name = "network::subnets::list",
    skip(client),
    fields(resource_group = %resource_group, virtual_network = %virtual_network)
)]
pub async fn list(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
) -> NetworkResult<Vec<Subnet>> {
    let path = format!(
        "{}/{CHILD_COLLECTION}",
        client.resource_path(resource_group, virtual_network::COLLECTION, virtual_network)?
    );
    pager::collect_all(client, path).await
}

/// Delete a subnet and wait until it is gone.
#[tracing::instrument(
    name = "network::subnets::delete",
    skip(client),
    fields(resource_group = %resource_group, virtual_network = %virtual_network, name = %name)
)]
pub async fn delete(
    client: &NetworkClient,
    resource_group: &str,
    virtual_network: &str,
    name: &str,
) -> NetworkResult<()> {
    let path = subnet_path(client, resource_group, virtual_network, name)?;
    lro::delete_and_wait(client, &path).await
}
