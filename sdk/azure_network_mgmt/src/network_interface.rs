//! Network interfaces.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use azure_network_core::client::NetworkClient;
//! use azure_network_mgmt::network_interface::{self, IpConfigurationSpec, NetworkInterfaceCreateRequest};
//!
//! # async fn example(client: &NetworkClient) -> Result<(), Box<dyn std::error::Error>> {
//! let subnet = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/frontend";
//!
//! let request = NetworkInterfaceCreateRequest::builder()
//!     .location("westus")
//!     .ip_configuration(IpConfigurationSpec::new("ipconfig1", subnet).static_private_ip("10.0.1.10"))
//!     .enable_ip_forwarding(false)
//!     .build()?;
//!
//! let nic = network_interface::create_or_update(client, "rg1", "nic1", &request).await?;
//! println!("{:?}", nic.properties.mac_address);
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

use crate::models::IpAllocationMethod;

const COLLECTION: &str = "networkInterfaces";

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// A network interface.
pub type NetworkInterface = Resource<NetworkInterfaceProperties>;

/// An IP configuration of a network interface.
pub type NetworkInterfaceIpConfiguration = ChildResource<IpConfigurationProperties>;

/// Properties of a network interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    /// The VM this NIC is attached to (read-only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_machine: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_configurations: Vec<NetworkInterfaceIpConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_settings: Option<NetworkInterfaceDnsSettings>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,

    #[serde(rename = "enableIPForwarding", skip_serializing_if = "Option::is_none")]
    pub enable_ip_forwarding: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Properties of an IP configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    #[serde(rename = "privateIPAddress", skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,

    #[serde(rename = "privateIPAllocationMethod", skip_serializing_if = "Option::is_none")]
    pub private_ip_allocation_method: Option<IpAllocationMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,

    #[serde(rename = "publicIPAddress", skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<SubResource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_backend_address_pools: Vec<SubResource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_inbound_nat_rules: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// DNS settings of a network interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceDnsSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_servers: Vec<String>,

    /// Servers in effect after merging with the virtual network (read-only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_dns_servers: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_dns_name_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_fqdn: Option<String>,
}

/// The primary IP configuration of `nic`, or its only one.
pub fn primary_ip_configuration(nic: &NetworkInterface) -> Option<&NetworkInterfaceIpConfiguration> {
    let configs = &nic.properties.ip_configurations;
    configs
        .iter()
        .find(|c| c.properties.primary == Some(true))
        .or_else(|| configs.first().filter(|_| configs.len() == 1))
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Definition of one IP configuration for [`NetworkInterfaceCreateRequestBuilder::ip_configuration`].
#[derive(Debug, Clone)]
pub struct IpConfigurationSpec {
    name: String,
    subnet_id: String,
    private_ip_address: Option<String>,
    public_ip_address_id: Option<String>,
    backend_pool_ids: Vec<String>,
    inbound_nat_rule_ids: Vec<String>,
    primary: bool,
}

impl IpConfigurationSpec {
    /// A dynamically addressed configuration in `subnet_id`.
    pub fn new(name: impl Into<String>, subnet_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subnet_id: subnet_id.into(),
            private_ip_address: None,
            public_ip_address_id: None,
            backend_pool_ids: Vec::new(),
            inbound_nat_rule_ids: Vec::new(),
            primary: false,
        }
    }

    /// Use a static private address instead of a dynamic one.
    pub fn static_private_ip(mut self, address: impl Into<String>) -> Self {
        self.private_ip_address = Some(address.into());
        self
    }

    pub fn public_ip_address(mut self, id: impl Into<String>) -> Self {
        self.public_ip_address_id = Some(id.into());
        self
    }

    /// Join a load balancer backend address pool.
    pub fn backend_pool(mut self, id: impl Into<String>) -> Self {
        self.backend_pool_ids.push(id.into());
        self
    }

    /// Attach a load balancer inbound NAT rule.
    pub fn inbound_nat_rule(mut self, id: impl Into<String>) -> Self {
        self.inbound_nat_rule_ids.push(id.into());
        self
    }

    /// Mark this configuration as the NIC's primary one.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    fn into_child(self, primary: bool) -> NetworkResult<NetworkInterfaceIpConfiguration> {
        let subnet: ResourceId = self.subnet_id.parse()?;
        if !subnet.full_type().eq_ignore_ascii_case("Microsoft.Network/virtualNetworks/subnets") {
            return Err(NetworkError::InvalidResourceId {
                id: self.subnet_id,
                reason: "expected a subnet".into(),
            });
        }

        let allocation = match &self.private_ip_address {
            Some(address) => {
                validate::ip_address("private_ip_address", address)?;
                IpAllocationMethod::Static
            }
            None => IpAllocationMethod::Dynamic,
        };

        let sub_resources = |ids: Vec<String>| -> NetworkResult<Vec<SubResource>> {
            ids.into_iter()
                .map(|id| id.parse::<ResourceId>().map(|id| SubResource::from(&id)))
                .collect()
        };

        Ok(ChildResource::new(
            self.name,
            IpConfigurationProperties {
                private_ip_address: self.private_ip_address,
                private_ip_allocation_method: Some(allocation),
                subnet: Some(SubResource::from(&subnet)),
                public_ip_address: self
                    .public_ip_address_id
                    .map(|id| id.parse::<ResourceId>().map(|id| SubResource::from(&id)))
                    .transpose()?,
                load_balancer_backend_address_pools: sub_resources(self.backend_pool_ids)?,
                load_balancer_inbound_nat_rules: sub_resources(self.inbound_nat_rule_ids)?,
                primary: Some(primary),
                provisioning_state: None,
            },
        ))
    }
}

/// A request to create or replace a network interface.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkInterfaceCreateRequest {
    pub location: String,

    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,

    pub properties: NetworkInterfaceProperties,
}

/// Builder for [`NetworkInterfaceCreateRequest`].
#[derive(Debug, Default)]
pub struct NetworkInterfaceCreateRequestBuilder {
    location: Option<String>,
    tags: Tags,
    ip_configurations: Vec<IpConfigurationSpec>,
    network_security_group: Option<String>,
    dns_servers: Vec<String>,
    internal_dns_name_label: Option<String>,
    enable_ip_forwarding: Option<bool>,
}

impl NetworkInterfaceCreateRequest {
    pub fn builder() -> NetworkInterfaceCreateRequestBuilder {
        NetworkInterfaceCreateRequestBuilder::default()
    }
}

impl NetworkInterfaceCreateRequestBuilder {
    /// Set the Azure region. **Required.**
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add an IP configuration. At least one is required.
    pub fn ip_configuration(mut self, config: IpConfigurationSpec) -> Self {
        self.ip_configurations.push(config);
        self
    }

    pub fn network_security_group(mut self, id: impl Into<String>) -> Self {
        self.network_security_group = Some(id.into());
        self
    }

    pub fn dns_server(mut self, ip: impl Into<String>) -> Self {
        self.dns_servers.push(ip.into());
        self
    }

    pub fn internal_dns_name_label(mut self, label: impl Into<String>) -> Self {
        self.internal_dns_name_label = Some(label.into());
        self
    }

    pub fn enable_ip_forwarding(mut self, enable: bool) -> Self {
        self.enable_ip_forwarding = Some(enable);
        self
    }

    /// Build the request.
    ///
    /// A single IP configuration is made primary automatically; with more
    /// than one, exactly one must be marked with [`IpConfigurationSpec::primary`].
    pub fn build(self) -> NetworkResult<NetworkInterfaceCreateRequest> {
        let location = validate::required("location", self.location)?;

        if self.ip_configurations.is_empty() {
            return Err(NetworkError::Builder(
                "at least one IP configuration is required".into(),
            ));
        }

        let single = self.ip_configurations.len() == 1;
        let primaries = self.ip_configurations.iter().filter(|c| c.primary).count();
        if !single && primaries != 1 {
            return Err(NetworkError::Builder(format!(
                "exactly one IP configuration must be primary, found {primaries}"
            )));
        }

        let mut ip_configurations = Vec::with_capacity(self.ip_configurations.len());
        for config in self.ip_configurations {
            if ip_configurations
                .iter()
                .any(|c: &NetworkInterfaceIpConfiguration| c.name == config.name)
            {
                return Err(NetworkError::Builder(format!(
                    "IP configuration '{}' is defined more than once",
                    config.name
                )));
            }
            let primary = single || config.primary;
            ip_configurations.push(config.into_child(primary)?);
        }

        for server in &self.dns_servers {
            validate::ip_address("dns_server", server)?;
        }
        let dns_settings = (!self.dns_servers.is_empty() || self.internal_dns_name_label.is_some())
            .then(|| NetworkInterfaceDnsSettings {
                dns_servers: self.dns_servers,
                internal_dns_name_label: self.internal_dns_name_label,
                ..Default::default()
            });

        let network_security_group = self
            .network_security_group
            .map(|id| id.parse::<ResourceId>().map(|id| SubResource::from(&id)))
            .transpose()?;

        Ok(NetworkInterfaceCreateRequest {
            location,
            tags: self.tags,
            properties: NetworkInterfaceProperties {
                network_security_group,
                ip_configurations,
                dns_settings,
                enable_ip_forwarding: self.enable_ip_forwarding,
                ..Default::default()
            },
        })
    }
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Create or replace a network interface and wait for provisioning to finish.
#[tracing::instrument(
    name = "network::network_interfaces::create_or_update",
    skip(client, request),
    fields(resource_group = %resource_group, name = %name, location = %request.location)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    request: &NetworkInterfaceCreateRequest,
) -> NetworkResult<NetworkInterface> {
    tracing::debug!(
        ip_configurations = request.properties.ip_configurations.len(),
        "creating network interface"
    );

    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::put_and_wait(client, &path, request).await
}

/// Send back a modified copy of a fetched network interface.
#[tracing::instrument(
    name = "network::network_interfaces::update",
    skip(client, nic),
    fields(resource_group = %resource_group, name = %nic.name)
)]
pub async fn update(
    client: &NetworkClient,
    resource_group: &str,
    nic: &NetworkInterface,
) -> NetworkResult<NetworkInterface> {
    let path = client.resource_path(resource_group, COLLECTION, &nic.name)?;
    lro::put_and_wait(client, &path, nic).await
}

/// Replace the tags of a network interface.
#[tracing::instrument(
    name = "network::network_interfaces::update_tags",
    skip(client, tags),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn update_tags(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    tags: &TagsUpdate,
) -> NetworkResult<NetworkInterface> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.patch(&path, tags).await?;
    Ok(response.json::<NetworkInterface>().await?)
}

/// Get a network interface by name.
#[tracing::instrument(
    name = "network::network_interfaces::get",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn get(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
) -> NetworkResult<NetworkInterface> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<NetworkInterface>().await?)
}

/// Get a network interface by its full resource ID.
pub async fn get_by_id(client: &NetworkClient, id: &str) -> NetworkResult<NetworkInterface> {
    let id: ResourceId = id.parse()?;
    id.expect_type(COLLECTION)?;
    client.ensure_subscription(&id)?;
    get(client, &id.resource_group, &id.name).await
}

/// List the network interfaces in a resource group.
#[tracing::instrument(
    name = "network::network_interfaces::list",
    skip(client),
    fields(resource_group = %resource_group)
)]
pub async fn list(
    client: &NetworkClient,
    resource_group: &str,
) -> NetworkResult<Vec<NetworkInterface>> {
    let path = client.resource_collection_path(resource_group, COLLECTION)?;
    pager::collect_all(client, path).await
}

/// List the network interfaces in the subscription.
#[tracing::instrument(name = "network::network_interfaces::list_all", skip(client))]
pub async fn list_all(client: &NetworkClient) -> NetworkResult<Vec<NetworkInterface>> {
    pager::collect_all(client, client.subscription_collection_path(COLLECTION)).await
}

/// Delete a network interface and wait until it is gone.
#[tracing::instrument(
    name = "network::network_interfaces::delete",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn delete(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::delete_and_wait(client, &path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn subnet_id() -> String {
        network_id(TEST_RESOURCE_GROUP, "virtualNetworks/vnet1/subnets/frontend")
    }

    fn nic_json() -> serde_json::Value {
        serde_json::json!({
            "id": network_id(TEST_RESOURCE_GROUP, "networkInterfaces/nic1"),
            "name": "nic1",
            "type": "Microsoft.Network/networkInterfaces",
            "location": TEST_LOCATION,
            "properties": {
                "ipConfigurations": [
                    {
                        "id": network_id(TEST_RESOURCE_GROUP, "networkInterfaces/nic1/ipConfigurations/ipconfig1"),
                        "name": "ipconfig1",
                        "properties": {
                            "privateIPAddress": "10.0.1.4",
                            "privateIPAllocationMethod": "Dynamic",
                            "subnet": {"id": subnet_id()},
                            "primary": true,
                            "provisioningState": "Succeeded"
                        }
                    }
                ],
                "dnsSettings": {"dnsServers": [], "appliedDnsServers": ["10.0.0.4"]},
                "macAddress": "00-0D-3A-1B-2C-3D",
                "enableIPForwarding": false,
                "provisioningState": "Succeeded"
            }
        })
    }

    #[test]
    fn builder_single_config_becomes_primary() {
        let request = NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .ip_configuration(IpConfigurationSpec::new("ipconfig1", subnet_id()))
            .build()
            .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        let config = &json["properties"]["ipConfigurations"][0];
        assert_eq!(config["name"], "ipconfig1");
        assert_eq!(config["properties"]["primary"], true);
        assert_eq!(config["properties"]["privateIPAllocationMethod"], "Dynamic");
        assert_eq!(config["properties"]["subnet"]["id"], subnet_id());
        assert!(config["properties"].get("privateIPAddress").is_none());
    }

    #[test]
    fn builder_static_ip_and_extras() {
        let pip = network_id(TEST_RESOURCE_GROUP, "publicIPAddresses/pip1");
        let pool = network_id(TEST_RESOURCE_GROUP, "loadBalancers/lb1/backendAddressPools/pool1");
        let request = NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .ip_configuration(
                IpConfigurationSpec::new("ipconfig1", subnet_id())
                    .static_private_ip("10.0.1.10")
                    .public_ip_address(pip.clone())
                    .backend_pool(pool.clone()),
            )
            .dns_server("10.0.0.4")
            .internal_dns_name_label("web1")
            .enable_ip_forwarding(true)
            .build()
            .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        let props = &json["properties"];
        assert_eq!(props["enableIPForwarding"], true);
        assert_eq!(props["dnsSettings"]["dnsServers"][0], "10.0.0.4");
        assert_eq!(props["dnsSettings"]["internalDnsNameLabel"], "web1");

        let config = &props["ipConfigurations"][0]["properties"];
        assert_eq!(config["privateIPAddress"], "10.0.1.10");
        assert_eq!(config["privateIPAllocationMethod"], "Static");
        assert_eq!(config["publicIPAddress"]["id"], pip);
        assert_eq!(config["loadBalancerBackendAddressPools"][0]["id"], pool);
    }

    #[test]
    fn builder_requires_one_primary_among_many() {
        let base = || {
            NetworkInterfaceCreateRequest::builder()
                .location(TEST_LOCATION)
                .ip_configuration(IpConfigurationSpec::new("a", subnet_id()))
        };

        let err = base()
            .ip_configuration(IpConfigurationSpec::new("b", subnet_id()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("found 0"));

        let err = NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .ip_configuration(IpConfigurationSpec::new("a", subnet_id()).primary())
            .ip_configuration(IpConfigurationSpec::new("b", subnet_id()).primary())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("found 2"));

        let request = base()
            .ip_configuration(IpConfigurationSpec::new("b", subnet_id()).primary())
            .build()
            .unwrap();
        let configs = &request.properties.ip_configurations;
        assert_eq!(configs[0].properties.primary, Some(false));
        assert_eq!(configs[1].properties.primary, Some(true));
    }

    #[test]
    fn builder_rejects_bad_input() {
        assert!(NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .build()
            .is_err());

        let vnet_id = network_id(TEST_RESOURCE_GROUP, "virtualNetworks/vnet1");
        let err = NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .ip_configuration(IpConfigurationSpec::new("a", vnet_id))
            .build()
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidResourceId { .. }));

        assert!(NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .ip_configuration(IpConfigurationSpec::new("a", subnet_id()).static_private_ip("10.0.1"))
            .build()
            .is_err());
    }

    #[test]
    fn primary_ip_configuration_lookup() {
        let nic: NetworkInterface = serde_json::from_value(nic_json()).unwrap();
        let primary = primary_ip_configuration(&nic).expect("has primary");
        assert_eq!(primary.name, "ipconfig1");
        assert_eq!(primary.properties.private_ip_address.as_deref(), Some("10.0.1.4"));
        assert_eq!(
            nic.properties.dns_settings.unwrap().applied_dns_servers,
            vec!["10.0.0.4".to_string()]
        );
    }

    #[tokio::test]
    async fn create_with_async_operation() {
        let server = MockServer::start().await;
        let nic_path = format!("{}/networkInterfaces/nic1", network_path(TEST_RESOURCE_GROUP));
        let op = format!("{}/operations/op1", server.uri());

        Mock::given(method("PUT"))
            .and(path(nic_path.as_str()))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Azure-AsyncOperation", op.as_str())
                    .set_body_json(nic_json()),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "Succeeded"})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(nic_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(nic_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let request = NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .ip_configuration(IpConfigurationSpec::new("ipconfig1", subnet_id()))
            .build()
            .unwrap();

        let nic = create_or_update(&client, TEST_RESOURCE_GROUP, "nic1", &request)
            .await
            .expect("should succeed");
        assert_eq!(nic.properties.mac_address.as_deref(), Some("00-0D-3A-1B-2C-3D"));
    }

    #[tokio::test]
    async fn failed_provisioning_is_reported() {
        let server = MockServer::start().await;
        let op = format!("{}/operations/op2", server.uri());

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201).insert_header("Azure-AsyncOperation", op.as_str()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/op2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "Failed",
                "error": {"code": "SubnetIsFull", "message": "Subnet frontend has no free addresses."}
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let request = NetworkInterfaceCreateRequest::builder()
            .location(TEST_LOCATION)
            .ip_configuration(IpConfigurationSpec::new("ipconfig1", subnet_id()))
            .build()
            .unwrap();

        let err = create_or_update(&client, TEST_RESOURCE_GROUP, "nic1", &request)
            .await
            .unwrap_err();
        match err {
            NetworkError::OperationFailed { code, .. } => assert_eq!(code, "SubnetIsFull"),
            other => panic!("expected OperationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_all_and_delete() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!(
                "/subscriptions/{TEST_SUBSCRIPTION_ID}/providers/Microsoft.Network/networkInterfaces"
            ).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": [nic_json()]})))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(format!("{}/networkInterfaces/nic1", network_path(TEST_RESOURCE_GROUP)).as_str()))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let nics = list_all(&client).await.expect("should succeed");
        assert_eq!(nics.len(), 1);

        delete(&client, TEST_RESOURCE_GROUP, "nic1").await.expect("should succeed");
    }
}
