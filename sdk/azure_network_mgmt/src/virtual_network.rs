//! Virtual network management.
//!
//! A virtual network owns one or more address prefixes and the subnets
//! carved out of them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use azure_network_core::client::NetworkClient;
//! use azure_network_mgmt::virtual_network::{self, VirtualNetworkCreateRequest};
//!
//! # async fn example(client: &NetworkClient) -> Result<(), Box<dyn std::error::Error>> {
//! let request = VirtualNetworkCreateRequest::builder()
//!     .location("westus")
//!     .address_prefix("10.0.0.0/16")
//!     .subnet("frontend", "10.0.1.0/24")
//!     .subnet("backend", "10.0.2.0/24")
//!     .dns_server("10.0.0.4")
//!     .tag("env", "dev")
//!     .build()?;
//!
//! let vnet = virtual_network::create_or_update(client, "rg1", "vnet1", &request).await?;
//!
//! for vnet in virtual_network::list(client, "rg1").await? {
//!     println!("{}: {:?}", vnet.name, vnet.properties.address_space);
//! }
//!
//! virtual_network::delete(client, "rg1", &vnet.name).await?;
//! # Ok(())
//! # }
//! ```

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::{
    ChildResource, ProvisioningState, Resource, ResourceId, SubResource, Tags, TagsUpdate,
};
use azure_network_core::{lro, pager, validate};
use serde::{Deserialize, Serialize};

use crate::peering::VirtualNetworkPeeringProperties;
use crate::subnet::SubnetProperties;

pub(crate) const COLLECTION: &str = "virtualNetworks";

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// A virtual network.
pub type VirtualNetwork = Resource<VirtualNetworkProperties>;

/// Properties of a virtual network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_space: Option<AddressSpace>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_options: Option<DhcpOptions>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<ChildResource<SubnetProperties>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub virtual_network_peerings: Vec<ChildResource<VirtualNetworkPeeringProperties>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Address prefixes owned by a virtual network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

/// DNS servers handed out to VMs in the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOptions {
    #[serde(default)]
    pub dns_servers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A request to create or replace a virtual network.
#[derive(Debug, Clone, Serialize)]
pub struct VirtualNetworkCreateRequest {
    pub location: String,

    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,

    pub properties: VirtualNetworkProperties,
}

/// Builder for [`VirtualNetworkCreateRequest`].
#[derive(Debug, Default)]
pub struct VirtualNetworkCreateRequestBuilder {
    location: Option<String>,
    tags: Tags,
    address_prefixes: Vec<String>,
    dns_servers: Vec<String>,
    subnets: Vec<(String, String, Option<String>)>,
}

impl VirtualNetworkCreateRequest {
    /// Create a new builder for `VirtualNetworkCreateRequest`.
    pub fn builder() -> VirtualNetworkCreateRequestBuilder {
        VirtualNetworkCreateRequestBuilder::default()
    }
}

impl VirtualNetworkCreateRequestBuilder {
    /// Set the Azure region. **Required.**
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add an address prefix in CIDR notation. At least one is required.
    pub fn address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.address_prefixes.push(prefix.into());
        self
    }

    /// Add a custom DNS server. Without any, Azure-provided DNS is used.
    pub fn dns_server(mut self, ip: impl Into<String>) -> Self {
        self.dns_servers.push(ip.into());
        self
    }

    /// Add a subnet.
    pub fn subnet(mut self, name: impl Into<String>, address_prefix: impl Into<String>) -> Self {
        self.subnets.push((name.into(), address_prefix.into(), None));
        self
    }

    /// Add a subnet associated with a network security group.
    pub fn subnet_with_security_group(
        mut self,
        name: impl Into<String>,
        address_prefix: impl Into<String>,
        network_security_group_id: impl Into<String>,
    ) -> Self {
        self.subnets.push((
            name.into(),
            address_prefix.into(),
            Some(network_security_group_id.into()),
        ));
        self
    }

    /// Build the request, validating prefixes, DNS servers and subnet names.
    pub fn build(self) -> NetworkResult<VirtualNetworkCreateRequest> {
        let location = validate::required("location", self.location)?;

        if self.address_prefixes.is_empty() {
            return Err(NetworkError::Builder(
                "at least one address prefix is required".into(),
            ));
        }
        for prefix in &self.address_prefixes {
            validate::cidr("address_prefix", prefix)?;
        }
        for server in &self.dns_servers {
            validate::ip_address("dns_server", server)?;
        }

        let mut subnets = Vec::with_capacity(self.subnets.len());
        for (name, prefix, nsg) in self.subnets {
            validate::cidr("subnet address_prefix", &prefix)?;
            if subnets
                .iter()
                .any(|s: &ChildResource<SubnetProperties>| s.name == name)
            {
                return Err(NetworkError::Builder(format!(
                    "subnet '{name}' is defined more than once"
                )));
            }
            subnets.push(ChildResource::new(
                name,
                SubnetProperties {
                    address_prefix: Some(prefix),
                    network_security_group: nsg.map(SubResource::new),
                    ..Default::default()
                },
            ));
        }

        Ok(VirtualNetworkCreateRequest {
            location,
            tags: self.tags,
            properties: VirtualNetworkProperties {
                address_space: Some(AddressSpace {
                    address_prefixes: self.address_prefixes,
                }),
                dhcp_options: (!self.dns_servers.is_empty()).then(|| DhcpOptions {
                    dns_servers: self.dns_servers,
                }),
                subnets,
                ..Default::default()
            },
        })
    }
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Create or replace a virtual network and wait for provisioning to finish.
///
/// # Tracing
///
/// Emits a span named `network::virtual_networks::create_or_update`.
#[tracing::instrument(
    name = "network::virtual_networks::create_or_update",
    skip(client, request),
    fields(resource_group = %resource_group, name = %name, location = %request.location)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    request: &VirtualNetworkCreateRequest,
) -> NetworkResult<VirtualNetwork> {
    tracing::debug!("creating virtual network");

    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let vnet: VirtualNetwork = lro::put_and_wait(client, &path, request).await?;

    tracing::debug!(id = %vnet.id, "virtual network provisioned");
    Ok(vnet)
}

/// Send back a modified copy of a fetched virtual network.
///
/// ```rust,no_run
/// # use azure_network_core::client::NetworkClient;
/// # use azure_network_mgmt::virtual_network;
/// # async fn example(client: &NetworkClient) -> azure_network_core::error::NetworkResult<()> {
/// let mut vnet = virtual_network::get(client, "rg1", "vnet1").await?;
/// if let Some(space) = vnet.properties.address_space.as_mut() {
///     space.address_prefixes.push("10.1.0.0/16".into());
/// }
/// let vnet = virtual_network::update(client, "rg1", &vnet).await?;
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(
    name = "network::virtual_networks::update",
    skip(client, vnet),
    fields(resource_group = %resource_group, name = %vnet.name)
)]
pub async fn update(
    client: &NetworkClient,
    resource_group: &str,
    vnet: &VirtualNetwork,
) -> NetworkResult<VirtualNetwork> {
    let path = client.resource_path(resource_group, COLLECTION, &vnet.name)?;
    lro::put_and_wait(client, &path, vnet).await
}

/// Replace the tags of a virtual network.
#[tracing::instrument(
    name = "network::virtual_networks::update_tags",
    skip(client, tags),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn update_tags(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    tags: &TagsUpdate,
) -> NetworkResult<VirtualNetwork> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.patch(&path, tags).await?;
    Ok(response.json::<VirtualNetwork>().await?)
}

/// Get a virtual network by name.
#[tracing::instrument(
    name = "network::virtual_networks::get",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn get(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
) -> NetworkResult<VirtualNetwork> {
    tracing::debug!("getting virtual network");

    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<VirtualNetwork>().await?)
}

/// Get a virtual network by its full resource ID.
pub async fn get_by_id(client: &NetworkClient, id: &str) -> NetworkResult<VirtualNetwork> {
    let id: ResourceId = id.parse()?;
    id.expect_type(COLLECTION)?;
    client.ensure_subscription(&id)?;
    get(client, &id.resource_group, &id.name).await
}

/// List the virtual networks in a resource group.
#[tracing::instrument(
    name = "network::virtual_networks::list",
    skip(client),
    fields(resource_group = %resource_group)
)]
pub async fn list(client: &NetworkClient, resource_group: &str) -> NetworkResult<Vec<VirtualNetwork>> {
    let path = client.resource_collection_path(resource_group, COLLECTION)?;
    let vnets = pager::collect_all(client, path).await?;

    tracing::debug!(count = vnets.len(), "virtual networks listed");
    Ok(vnets)
}

/// List the virtual networks in the subscription.
#[tracing::instrument(name = "network::virtual_networks::list_all", skip(client))]
pub async fn list_all(client: &NetworkClient) -> NetworkResult<Vec<VirtualNetwork>> {
    let vnets = pager::collect_all(client, client.subscription_collection_path(COLLECTION)).await?;

    tracing::debug!(count = vnets.len(), "virtual networks listed");
    Ok(vnets)
}

/// Delete a virtual network and wait until it is gone.
#[tracing::instrument(
    name = "network::virtual_networks::delete",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn delete(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    tracing::debug!("deleting virtual network");

    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::delete_and_wait(client, &path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vnet_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": network_id(TEST_RESOURCE_GROUP, &format!("virtualNetworks/{name}")),
            "name": name,
            "type": "Microsoft.Network/virtualNetworks",
            "location": TEST_LOCATION,
            "etag": "W/\"00000000-0000-0000-0000-000000000000\"",
            "properties": {
                "addressSpace": {"addressPrefixes": ["10.0.0.0/16"]},
                "subnets": [{
                    "id": network_id(TEST_RESOURCE_GROUP, &format!("virtualNetworks/{name}/subnets/frontend")),
                    "name": "frontend",
                    "properties": {"addressPrefix": "10.0.1.0/24", "provisioningState": "Succeeded"}
                }],
                "resourceGuid": "5a2ab2bc-b7f3-4ba5-b52c-df3e2d46e4c5",
                "provisioningState": "Succeeded"
            }
        })
    }

    // --- Builder ---

    #[test]
    fn builder_minimal_request() {
        let request = VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .address_prefix("10.0.0.0/16")
            .build()
            .expect("valid request");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "location": "westus",
                "properties": {"addressSpace": {"addressPrefixes": ["10.0.0.0/16"]}}
            })
        );
    }

    #[test]
    fn builder_full_request() {
        let nsg_id = network_id(TEST_RESOURCE_GROUP, "networkSecurityGroups/nsg1");
        let request = VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .address_prefix("10.0.0.0/16")
            .dns_server("10.0.0.4")
            .subnet("frontend", "10.0.1.0/24")
            .subnet_with_security_group("backend", "10.0.2.0/24", nsg_id.clone())
            .tag("env", "dev")
            .build()
            .expect("valid request");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tags"]["env"], "dev");
        assert_eq!(json["properties"]["dhcpOptions"]["dnsServers"][0], "10.0.0.4");
        let subnets = json["properties"]["subnets"].as_array().unwrap();
        assert_eq!(subnets.len(), 2);
        assert_eq!(subnets[0]["name"], "frontend");
        assert_eq!(subnets[0]["properties"]["addressPrefix"], "10.0.1.0/24");
        assert!(subnets[0]["properties"].get("networkSecurityGroup").is_none());
        assert_eq!(subnets[1]["properties"]["networkSecurityGroup"]["id"], nsg_id);
    }

    #[test]
    fn builder_requires_location() {
        let err = VirtualNetworkCreateRequest::builder()
            .address_prefix("10.0.0.0/16")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("location is required"));
    }

    #[test]
    fn builder_requires_address_prefix() {
        let err = VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("address prefix"));
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .address_prefix("10.0.0.0/40")
            .build()
            .is_err());

        assert!(VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .address_prefix("10.0.0.0/16")
            .dns_server("dns.example.com")
            .build()
            .is_err());

        let err = VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .address_prefix("10.0.0.0/16")
            .subnet("a", "10.0.1.0/24")
            .subnet("a", "10.0.2.0/24")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    // --- Response ---

    #[test]
    fn vnet_deserialization() {
        let vnet: VirtualNetwork = serde_json::from_value(vnet_json("vnet1")).unwrap();

        assert_eq!(vnet.name, "vnet1");
        assert_eq!(vnet.location.as_deref(), Some(TEST_LOCATION));
        assert_eq!(
            vnet.properties.address_space.as_ref().unwrap().address_prefixes,
            vec!["10.0.0.0/16".to_string()]
        );
        assert_eq!(vnet.properties.subnets.len(), 1);
        assert_eq!(vnet.properties.subnets[0].name, "frontend");
        assert_eq!(
            vnet.properties.provisioning_state,
            Some(ProvisioningState::Succeeded)
        );
    }

    // --- API ---

    #[tokio::test]
    async fn create_or_update_puts_request() {
        let server = MockServer::start().await;
        let vnet_path = format!("{}/virtualNetworks/vnet1", network_path(TEST_RESOURCE_GROUP));

        Mock::given(method("PUT"))
            .and(path(vnet_path.as_str()))
            .and(header("Authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .and(query_param("api-version", "2015-06-15"))
            .and(body_json(serde_json::json!({
                "location": TEST_LOCATION,
                "properties": {"addressSpace": {"addressPrefixes": ["10.0.0.0/16"]}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(vnet_json("vnet1")))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let request = VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .address_prefix("10.0.0.0/16")
            .build()
            .unwrap();

        let vnet = create_or_update(&client, TEST_RESOURCE_GROUP, "vnet1", &request)
            .await
            .expect("should succeed");
        assert_eq!(vnet.name, "vnet1");
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn create_emits_span() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vnet_json("vnet1")))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let request = VirtualNetworkCreateRequest::builder()
            .location(TEST_LOCATION)
            .address_prefix("10.0.0.0/16")
            .build()
            .unwrap();

        let _ = create_or_update(&client, TEST_RESOURCE_GROUP, "vnet1", &request).await;
        assert!(logs_contain("network::virtual_networks::create_or_update"));
    }

    #[tokio::test]
    async fn get_by_id_uses_parsed_names() {
        let server = MockServer::start().await;
        let vnet_path = format!("{}/virtualNetworks/vnet1", network_path("other-rg"));

        Mock::given(method("GET"))
            .and(path(vnet_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(vnet_json("vnet1")))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let vnet = get_by_id(&client, &vnet_path).await.expect("should succeed");
        assert_eq!(vnet.name, "vnet1");
    }

    #[tokio::test]
    async fn get_by_id_rejects_other_subscriptions() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "vnet1"})))
            .expect(0)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let foreign = "/subscriptions/11111111-1111-1111-1111-111111111111/resourceGroups/rg1/providers/Microsoft.Network/virtualNetworks/vnet1";
        let err = get_by_id(&client, foreign).await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidArgument(_)));
        assert!(err.to_string().contains("11111111-1111-1111-1111-111111111111"));
    }

    #[tokio::test]
    async fn get_by_id_rejects_wrong_type() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        let id = network_id(TEST_RESOURCE_GROUP, "loadBalancers/lb1");
        let err = get_by_id(&client, &id).await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidResourceId { .. }));
    }

    #[tokio::test]
    async fn get_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {
                    "code": "ResourceNotFound",
                    "message": "The Resource 'Microsoft.Network/virtualNetworks/missing' was not found."
                }
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let err = get(&client, TEST_RESOURCE_GROUP, "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_and_list_all() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/virtualNetworks", network_path(TEST_RESOURCE_GROUP)).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [vnet_json("vnet1"), vnet_json("vnet2")]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{TEST_SUBSCRIPTION_ID}/providers/Microsoft.Network/virtualNetworks"
            ).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [vnet_json("vnet1"), vnet_json("vnet2"), vnet_json("vnet3")]
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;

        let in_group = list(&client, TEST_RESOURCE_GROUP).await.expect("should succeed");
        assert_eq!(in_group.len(), 2);

        let everywhere = list_all(&client).await.expect("should succeed");
        assert_eq!(everywhere.len(), 3);
        assert_eq!(everywhere[2].name, "vnet3");
    }

    #[tokio::test]
    async fn update_tags_patches() {
        let server = MockServer::start().await;
        let mut tagged = vnet_json("vnet1");
        tagged["tags"] = serde_json::json!({"env": "prod"});

        Mock::given(method("PATCH"))
            .and(path(format!("{}/virtualNetworks/vnet1", network_path(TEST_RESOURCE_GROUP)).as_str()))
            .and(body_json(serde_json::json!({"tags": {"env": "prod"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&tagged))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let vnet = update_tags(
            &client,
            TEST_RESOURCE_GROUP,
            "vnet1",
            &TagsUpdate::new([("env", "prod")]),
        )
        .await
        .expect("should succeed");
        assert_eq!(vnet.tags["env"], "prod");
    }

    #[tokio::test]
    async fn delete_waits_for_completion() {
        let server = MockServer::start().await;
        let op = format!("{}/operations/del1", server.uri());

        Mock::given(method("DELETE"))
            .and(path(format!("{}/virtualNetworks/vnet1", network_path(TEST_RESOURCE_GROUP)).as_str()))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Azure-AsyncOperation", op.as_str())
                    .insert_header("Retry-After", "0"),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/del1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "Succeeded"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        delete(&client, TEST_RESOURCE_GROUP, "vnet1")
            .await
            .expect("should succeed");
    }

    #[tokio::test]
    async fn empty_names_fail_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let err = get(&client, "", "vnet1").await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidArgument(_)));
    }
}
