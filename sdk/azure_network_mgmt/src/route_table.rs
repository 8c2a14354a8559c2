//! Route tables and their routes.

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::{
    ChildResource, ProvisioningState, Resource, ResourceId, SubResource, Tags, TagsUpdate,
};
use azure_network_core::validate::{self, require_arg};
use azure_network_core::{lro, pager};
use serde::{Deserialize, Serialize};

const COLLECTION: &str = "routeTables";
const ROUTES: &str = "routes";

/// A route table.
pub type RouteTable = Resource<RouteTableProperties>;

/// A route.
pub type Route = ChildResource<RouteProperties>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,

    /// Subnets associated with this table (read-only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Where matching packets are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextHopType {
    VirtualNetworkGateway,
    VnetLocal,
    Internet,
    /// A VM at `next_hop_ip_address`.
    VirtualAppliance,
    /// Drop the traffic.
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop_type: Option<NextHopType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop_ip_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Builder for [`RouteProperties`].
#[derive(Debug, Default)]
pub struct RouteBuilder {
    address_prefix: Option<String>,
    next_hop_type: Option<NextHopType>,
    next_hop_ip_address: Option<String>,
}

impl RouteProperties {
    pub fn builder() -> RouteBuilder {
        RouteBuilder::default()
    }
}

impl RouteBuilder {
    /// Destination prefix in CIDR notation. **Required.**
    pub fn address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.address_prefix = Some(prefix.into());
        self
    }

    /// **Required.**
    pub fn next_hop_type(mut self, next_hop: NextHopType) -> Self {
        self.next_hop_type = Some(next_hop);
        self
    }

    /// Only allowed, and then required, for [`NextHopType::VirtualAppliance`].
    pub fn next_hop_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.next_hop_ip_address = Some(ip.into());
        self
    }

    pub fn build(self) -> NetworkResult<RouteProperties> {
        let address_prefix = validate::required("address_prefix", self.address_prefix)?;
        validate::cidr("address_prefix", &address_prefix)?;

        let next_hop_type = self
            .next_hop_type
            .ok_or_else(|| NetworkError::Builder("next_hop_type is required".into()))?;

        match (next_hop_type, &self.next_hop_ip_address) {
            (NextHopType::VirtualAppliance, Some(ip)) => {
                validate::ip_address("next_hop_ip_address", ip)?;
            }
            (NextHopType::VirtualAppliance, None) => {
                return Err(NetworkError::Builder(
                    "next_hop_ip_address is required for VirtualAppliance".into(),
                ));
            }
            (other, Some(_)) => {
                return Err(NetworkError::Builder(format!(
                    "next_hop_ip_address is only allowed for VirtualAppliance, not {other:?}"
                )));
            }
            (_, None) => {}
        }

        Ok(RouteProperties {
            address_prefix: Some(address_prefix),
            next_hop_type: Some(next_hop_type),
            next_hop_ip_address: self.next_hop_ip_address,
            provisioning_state: None,
        })
    }
}

/// A request to create or replace a route table.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTableCreateRequest {
    pub location: String,

    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,

    pub properties: RouteTableProperties,
}

#[derive(Debug, Default)]
pub struct RouteTableCreateRequestBuilder {
    location: Option<String>,
    tags: Tags,
    routes: Vec<Route>,
}

impl RouteTableCreateRequest {
    pub fn builder() -> RouteTableCreateRequestBuilder {
        RouteTableCreateRequestBuilder::default()
    }
}

impl RouteTableCreateRequestBuilder {
    /// Set the Azure region. **Required.**
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn route(mut self, name: impl Into<String>, route: RouteProperties) -> Self {
        self.routes.push(ChildResource::new(name, route));
        self
    }

    pub fn build(self) -> NetworkResult<RouteTableCreateRequest> {
        let location = validate::required("location", self.location)?;

        for (i, route) in self.routes.iter().enumerate() {
            if self.routes[..i].iter().any(|r| r.name == route.name) {
                return Err(NetworkError::Builder(format!(
                    "route '{}' is defined more than once",
                    route.name
                )));
            }
        }

        Ok(RouteTableCreateRequest {
            location,
            tags: self.tags,
            properties: RouteTableProperties {
                routes: self.routes,
                ..Default::default()
            },
        })
    }
}

#[tracing::instrument(
    name = "network::route_tables::create_or_update",
    skip(client, request),
    fields(resource_group = %resource_group, name = %name, location = %request.location)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    request: &RouteTableCreateRequest,
) -> NetworkResult<RouteTable> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::put_and_wait(client, &path, request).await
}

#[tracing::instrument(
    name = "network::route_tables::update",
    skip(client, table),
    fields(resource_group = %resource_group, name = %table.name)
)]
pub async fn update(
    client: &NetworkClient,
    resource_group: &str,
    table: &RouteTable,
) -> NetworkResult<RouteTable> {
    let path = client.resource_path(resource_group, COLLECTION, &table.name)?;
    lro::put_and_wait(client, &path, table).await
}

#[tracing::instrument(
    name = "network::route_tables::update_tags",
    skip(client, tags),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn update_tags(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    tags: &TagsUpdate,
) -> NetworkResult<RouteTable> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.patch(&path, tags).await?;
    Ok(response.json::<RouteTable>().await?)
}

#[tracing::instrument(
    name = "network::route_tables::get",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn get(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<RouteTable> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<RouteTable>().await?)
}

pub async fn get_by_id(client: &NetworkClient, id: &str) -> NetworkResult<RouteTable> {
    let id: ResourceId = id.parse()?;
    id.expect_type(COLLECTION)?;
    client.ensure_subscription(&id)?;
    get(client, &id.resource_group, &id.name).await
}

#[tracing::instrument(
    name = "network::route_tables::list",
    skip(client),
    fields(resource_group = %resource_group)
)]
pub async fn list(client: &NetworkClient, resource_group: &str) -> NetworkResult<Vec<RouteTable>> {
    let path = client.resource_collection_path(resource_group, COLLECTION)?;
    pager::collect_all(client, path).await
}

#[tracing::instrument(name = "network::route_tables::list_all", skip(client))]
pub async fn list_all(client: &NetworkClient) -> NetworkResult<Vec<RouteTable>> {
    pager::collect_all(client, client.subscription_collection_path(COLLECTION)).await
}

#[tracing::instrument(
    name = "network::route_tables::delete",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn delete(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::delete_and_wait(client, &path).await
}

fn route_path(
    client: &NetworkClient,
    resource_group: &str,
    route_table: &str,
    name: &str,
) -> NetworkResult<String> {
    require_arg("route name", name)?;
    Ok(format!(
        "{}/{ROUTES}/{name}",
        client.resource_path(resource_group, COLLECTION, route_table)?
    ))
}

#[tracing::instrument(
    name = "network::route_tables::create_or_update_route",
    skip(client, route),
    fields(resource_group = %resource_group, route_table = %route_table, name = %name)
)]
pub async fn create_or_update_route(
    client: &NetworkClient,
    resource_group: &str,
    route_table: &str,
    name: &str,
    route: &RouteProperties,
) -> NetworkResult<Route> {
    let path = route_path(client, resource_group, route_table, name)?;
    lro::put_and_wait(client, &path, &ChildResource::new(name, route)).await
}

#[tracing::instrument(
    name = "network::route_tables::get_route",
    skip(client),
    fields(resource_group = %resource_group, route_table = %route_table, name = %name)
)]
pub async fn get_route(
    client: &NetworkClient,
    resource_group: &str,
    route_table: &str,
    name: &str,
) -> NetworkResult<Route> {
    let path = route_path(client, resource_group, route_table, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<Route>().await?)
}

#[tracing::instrument(
    name = "network::route_tables::list_routes",
    skip(client),
    fields(resource_group = %resource_group, route_table = %route_table)
)]
pub async fn list_routes(
    client: &NetworkClient,
    resource_group: &str,
    route_table: &str,
) -> NetworkResult<Vec<Route>> {
    let path = format!(
        "{}/{ROUTES}",
        client.resource_path(resource_group, COLLECTION, route_table)?
    );
    pager::collect_all(client, path).await
}

#[tracing::instrument(
    name = "network::route_tables::delete_route",
    skip(client),
    fields(resource_group = %resource_group, route_table = %route_table, name = %name)
)]
pub async fn delete_route(
    client: &NetworkClient,
    resource_group: &str,
    route_table: &str,
    name: &str,
) -> NetworkResult<()> {
    let path = route_path(client, resource_group, route_table, name)?;
    lro::delete_and_wait(client, &path).await
}
