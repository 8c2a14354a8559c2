//! Network security groups and their security rules.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use azure_network_core::client::NetworkClient;
//! use azure_network_mgmt::network_security_group::{
//!     self, Access, Direction, NetworkSecurityGroupCreateRequest, SecurityRuleProperties,
//!     SecurityRuleProtocol,
//! };
//!
//! # async fn example(client: &NetworkClient) -> Result<(), Box<dyn std::error::Error>> {
//! let allow_https = SecurityRuleProperties::builder()
//!     .protocol(SecurityRuleProtocol::Tcp)
//!     .source_address_prefix("Internet")
//!     .destination_port_range("443")
//!     .access(Access::Allow)
//!     .direction(Direction::Inbound)
//!     .priority(100)
//!     .build()?;
//!
//! let request = NetworkSecurityGroupCreateRequest::builder()
//!     .location("westus")
//!     .security_rule("allow-https", allow_https)
//!     .build()?;
//!
//! network_security_group::create_or_update(client, "rg1", "web-nsg", &request).await?;
//! # Ok(())
//! # }
//! ```

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::{
    ChildResource, ProvisioningState, Resource, ResourceId, SubResource, Tags, TagsUpdate,
};
use azure_network_core::validate::{self, require_arg};
use azure_network_core::{lro, pager};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

const COLLECTION: &str = "networkSecurityGroups";
const RULES: &str = "securityRules";

/// Allowed security rule priorities. Lower numbers are evaluated first.
pub const PRIORITY_RANGE: RangeInclusive<u32> = 100..=4096;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// A network security group.
pub type NetworkSecurityGroup = Resource<NetworkSecurityGroupProperties>;

/// A security rule.
pub type SecurityRule = ChildResource<SecurityRuleProperties>;

/// Properties of a network security group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSecurityGroupProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_rules: Vec<SecurityRule>,

    /// Built-in rules applied after the custom ones (read-only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_security_rules: Vec<SecurityRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<SubResource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// Protocol matched by a security rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityRuleProtocol {
    Tcp,
    Udp,
    #[serde(rename = "*")]
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Properties of a security rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<SecurityRuleProtocol>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port_range: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port_range: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_address_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_address_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Builder for [`SecurityRuleProperties`].
///
/// Ports and address prefixes default to `*`; protocol defaults to
/// [`SecurityRuleProtocol::Any`].
#[derive(Debug, Default)]
pub struct SecurityRuleBuilder {
    description: Option<String>,
    protocol: Option<SecurityRuleProtocol>,
    source_port_range: Option<String>,
    destination_port_range: Option<String>,
    source_address_prefix: Option<String>,
    destination_address_prefix: Option<String>,
    access: Option<Access>,
    priority: Option<u32>,
    direction: Option<Direction>,
}

impl SecurityRuleProperties {
    pub fn builder() -> SecurityRuleBuilder {
        SecurityRuleBuilder::default()
    }
}

impl SecurityRuleBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn protocol(mut self, protocol: SecurityRuleProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// `*`, a port, or a `low-high` range.
    pub fn source_port_range(mut self, range: impl Into<String>) -> Self {
        self.source_port_range = Some(range.into());
        self
    }

    /// `*`, a port, or a `low-high` range.
    pub fn destination_port_range(mut self, range: impl Into<String>) -> Self {
        self.destination_port_range = Some(range.into());
        self
    }

    /// A CIDR prefix, an IP, `*`, or a service tag such as `Internet`.
    pub fn source_address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.source_address_prefix = Some(prefix.into());
        self
    }

    pub fn destination_address_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.destination_address_prefix = Some(prefix.into());
        self
    }

    /// **Required.**
    pub fn access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    /// **Required.** Must be within [`PRIORITY_RANGE`].
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// **Required.**
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn build(self) -> NetworkResult<SecurityRuleProperties> {
        let access = self
            .access
            .ok_or_else(|| NetworkError::Builder("access is required".into()))?;
        let direction = self
            .direction
            .ok_or_else(|| NetworkError::Builder("direction is required".into()))?;
        let priority = self
            .priority
            .ok_or_else(|| NetworkError::Builder("priority is required".into()))?;
        if !PRIORITY_RANGE.contains(&priority) {
            return Err(NetworkError::Builder(format!(
                "priority must be between {} and {}, got {priority}",
                PRIORITY_RANGE.start(),
                PRIORITY_RANGE.end()
            )));
        }

        let any = || "*".to_string();
        let source_port_range = self.source_port_range.unwrap_or_else(any);
        let destination_port_range = self.destination_port_range.unwrap_or_else(any);
        validate::port_range("source_port_range", &source_port_range)?;
        validate::port_range("destination_port_range", &destination_port_range)?;

        let source_address_prefix =
            validate::required("source_address_prefix", Some(self.source_address_prefix.unwrap_or_else(any)))?;
        let destination_address_prefix = validate::required(
            "destination_address_prefix",
            Some(self.destination_address_prefix.unwrap_or_else(any)),
        )?;

        Ok(SecurityRuleProperties {
            description: self.description,
            protocol: Some(self.protocol.unwrap_or(SecurityRuleProtocol::Any)),
            source_port_range: Some(source_port_range),
            destination_port_range: Some(destination_port_range),
            source_address_prefix: Some(source_address_prefix),
            destination_address_prefix: Some(destination_address_prefix),
            access: Some(access),
            priority: Some(priority),
            direction: Some(direction),
            provisioning_state: None,
        })
    }
}

/// A request to create or replace a network security group.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSecurityGroupCreateRequest {
    pub location: String,

    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,

    pub properties: NetworkSecurityGroupProperties,
}

/// Builder for [`NetworkSecurityGroupCreateRequest`].
#[derive(Debug, Default)]
pub struct NetworkSecurityGroupCreateRequestBuilder {
    location: Option<String>,
    tags: Tags,
    rules: Vec<SecurityRule>,
}

impl NetworkSecurityGroupCreateRequest {
    pub fn builder() -> NetworkSecurityGroupCreateRequestBuilder {
        NetworkSecurityGroupCreateRequestBuilder::default()
    }
}

impl NetworkSecurityGroupCreateRequestBuilder {
    /// Set the Azure region. **Required.**
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn security_rule(mut self, name: impl Into<String>, rule: SecurityRuleProperties) -> Self {
        self.rules.push(ChildResource::new(name, rule));
        self
    }

    /// Build the request. Rule names must be unique, and no two rules in the
    /// same direction may share a priority.
    pub fn build(self) -> NetworkResult<NetworkSecurityGroupCreateRequest> {
        let location = validate::required("location", self.location)?;

        for (i, rule) in self.rules.iter().enumerate() {
            for other in &self.rules[..i] {
                if other.name == rule.name {
                    return Err(NetworkError::Builder(format!(
                        "security rule '{}' is defined more than once",
                        rule.name
                    )));
                }
                if other.properties.direction == rule.properties.direction
                    && other.properties.priority == rule.properties.priority
                {
                    return Err(NetworkError::Builder(format!(
                        "security rules '{}' and '{}' share priority {}",
                        other.name,
                        rule.name,
                        rule.properties.priority.unwrap_or_default()
                    )));
                }
            }
        }

        Ok(NetworkSecurityGroupCreateRequest {
            location,
            tags: self.tags,
            properties: NetworkSecurityGroupProperties {
                security_rules: self.rules,
                ..Default::default()
            },
        })
    }
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

#[tracing::instrument(
    name = "network::network_security_groups::create_or_update",
    skip(client, request),
    fields(resource_group = %resource_group, name = %name, location = %request.location)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    request: &NetworkSecurityGroupCreateRequest,
) -> NetworkResult<NetworkSecurityGroup> {
    tracing::debug!(
        rules = request.properties.security_rules.len(),
        "creating network security group"
    );

    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::put_and_wait(client, &path, request).await
}

/// Send back a modified copy of a fetched network security group.
#[tracing::instrument(
    name = "network::network_security_groups::update",
    skip(client, nsg),
    fields(resource_group = %resource_group, name = %nsg.name)
)]
pub async fn update(
    client: &NetworkClient,
    resource_group: &str,
    nsg: &NetworkSecurityGroup,
) -> NetworkResult<NetworkSecurityGroup> {
    let path = client.resource_path(resource_group, COLLECTION, &nsg.name)?;
    lro::put_and_wait(client, &path, nsg).await
}

#[tracing::instrument(
    name = "network::network_security_groups::update_tags",
    skip(client, tags),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn update_tags(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    tags: &TagsUpdate,
) -> NetworkResult<NetworkSecurityGroup> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.patch(&path, tags).await?;
    Ok(response.json::<NetworkSecurityGroup>().await?)
}

#[tracing::instrument(
    name = "network::network_security_groups::get",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn get(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
) -> NetworkResult<NetworkSecurityGroup> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<NetworkSecurityGroup>().await?)
}

pub async fn get_by_id(client: &NetworkClient, id: &str) -> NetworkResult<NetworkSecurityGroup> {
    let id: ResourceId = id.parse()?;
    id.expect_type(COLLECTION)?;
    client.ensure_subscription(&id)?;
    get(client, &id.resource_group, &id.name).await
}

#[tracing::instrument(
    name = "network::network_security_groups::list",
    skip(client),
    fields(resource_group = %resource_group)
)]
pub async fn list(
    client: &NetworkClient,
    resource_group: &str,
) -> NetworkResult<Vec<NetworkSecurityGroup>> {
    let path = client.resource_collection_path(resource_group, COLLECTION)?;
    pager::collect_all(client, path).await
}

#[tracing::instrument(name = "network::network_security_groups::list_all", skip(client))]
pub async fn list_all(client: &NetworkClient) -> NetworkResult<Vec<NetworkSecurityGroup>> {
    pager::collect_all(client, client.subscription_collection_path(COLLECTION)).await
}

#[tracing::instrument(
    name = "network::network_security_groups::delete",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn delete(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::delete_and_wait(client, &path).await
}

fn rule_path(
    client: &NetworkClient,
    resource_group: &str,
    nsg: &str,
    rule: &str,
) -> NetworkResult<String> {
    require_arg("rule name", rule)?;
    Ok(format!(
        "{}/{RULES}/{rule}",
        client.resource_path(resource_group, COLLECTION, nsg)?
    ))
}

/// Create or replace a single security rule.
#[tracing::instrument(
    name = "network::network_security_groups::create_or_update_rule",
    skip(client, rule),
    fields(resource_group = %resource_group, nsg = %nsg, name = %name, priority = ?rule.priority)
)]
pub async fn create_or_update_rule(
    client: &NetworkClient,
    resource_group: &str,
    nsg: &str,
    name: &str,
    rule: &SecurityRuleProperties,
) -> NetworkResult<SecurityRule> {
    let path = rule_path(client, resource_group, nsg, name)?;
    lro::put_and_wait(client, &path, &ChildResource::new(name, rule)).await
}

#[tracing::instrument(
    name = "network::network_security_groups::get_rule",
    skip(client),
    fields(resource_group = %resource_group, nsg = %nsg, name = %name)
)]
pub async fn get_rule(
    client: &NetworkClient,
    resource_group: &str,
    nsg: &str,
    name: &str,
) -> NetworkResult<SecurityRule> {
    let path = rule_path(client, resource_group, nsg, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<SecurityRule>().await?)
}

#[tracing::instrument(
    name = "network::network_security_groups::list_rules",
    skip(client),
    fields(resource_group = %resource_group, nsg = %nsg)
)]
pub async fn list_rules(
    client: &NetworkClient,
    resource_group: &str,
    nsg: &str,
) -> NetworkResult<Vec<SecurityRule>> {
    let path = format!("{}/{RULES}", client.resource_path(resource_group, COLLECTION, nsg)?);
    pager::collect_all(client, path).await
}

#[tracing::instrument(
    name = "network::network_security_groups::delete_rule",
    skip(client),
    fields(resource_group = %resource_group, nsg = %nsg, name = %name)
)]
pub async fn delete_rule(
    client: &NetworkClient,
    resource_group: &str,
    nsg: &str,
    name: &str,
) -> NetworkResult<()> {
    let path = rule_path(client, resource_group, nsg, name)?;
    lro::delete_and_wait(client, &path).await
}
