//! Load balancers.
//!
//! A load balancer is defined by named child resources:
//!
//! - **Frontend IP configurations** receive traffic, on a public IP address
//!   or a private address in a subnet.
//! - **Backend address pools** are joined by network interfaces.
//! - **Probes** decide which backends are healthy.
//! - **Load balancing rules** map a frontend port to a backend pool port.
//! - **Inbound NAT rules** forward one frontend port to a single backend.
//!
//! Rules refer to frontends, pools and probes by name. [`create_or_update`]
//! expands those names to child resource IDs under the load balancer being
//! created.

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::{
    ChildResource, IpAllocationMethod, ProvisioningState, Resource, ResourceId, SubResource, Tags,
    TagsUpdate, TransportProtocol,
};
use azure_network_core::{lro, pager, validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;

const COLLECTION: &str = "loadBalancers";

/// Allowed idle timeout for rules, in minutes.
pub const IDLE_TIMEOUT_RANGE: RangeInclusive<u32> = 4..=30;

/// Shortest allowed probe interval, in seconds.
pub const MIN_PROBE_INTERVAL_SECS: u32 = 5;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// A load balancer.
pub type LoadBalancer = Resource<LoadBalancerProperties>;

pub type FrontendIpConfiguration = ChildResource<FrontendIpConfigurationProperties>;
pub type BackendAddressPool = ChildResource<BackendAddressPoolProperties>;
pub type Probe = ChildResource<ProbeProperties>;
pub type LoadBalancingRule = ChildResource<LoadBalancingRuleProperties>;
pub type InboundNatRule = ChildResource<InboundNatRuleProperties>;

/// Properties of a load balancer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerProperties {
    #[serde(rename = "frontendIPConfigurations", default, skip_serializing_if = "Vec::is_empty")]
    pub frontend_ip_configurations: Vec<FrontendIpConfiguration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backend_address_pools: Vec<BackendAddressPool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancing_rules: Vec<LoadBalancingRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub probes: Vec<Probe>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbound_nat_rules: Vec<InboundNatRule>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendIpConfigurationProperties {
    #[serde(rename = "privateIPAddress", skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,

    #[serde(rename = "privateIPAllocationMethod", skip_serializing_if = "Option::is_none")]
    pub private_ip_allocation_method: Option<IpAllocationMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,

    #[serde(rename = "publicIPAddress", skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<SubResource>,

    /// Read-only back references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbound_nat_rules: Vec<SubResource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancing_rules: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddressPoolProperties {
    /// NIC IP configurations in this pool (read-only).
    #[serde(rename = "backendIPConfigurations", default, skip_serializing_if = "Vec::is_empty")]
    pub backend_ip_configurations: Vec<SubResource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancing_rules: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeProtocol {
    Tcp,
    Http,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancing_rules: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ProbeProtocol>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_in_seconds: Option<u32>,

    /// Consecutive failures before a backend is taken out of rotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_probes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// How flows are spread across the backend pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadDistribution {
    /// 5-tuple hash.
    Default,
    /// Client IP affinity.
    #[serde(rename = "SourceIP")]
    SourceIp,
    /// Client IP and protocol affinity.
    #[serde(rename = "SourceIPProtocol")]
    SourceIpProtocol,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancingRuleProperties {
    #[serde(rename = "frontendIPConfiguration", skip_serializing_if = "Option::is_none")]
    pub frontend_ip_configuration: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_address_pool: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<TransportProtocol>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_distribution: Option<LoadDistribution>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<u32>,

    #[serde(rename = "enableFloatingIP", skip_serializing_if = "Option::is_none")]
    pub enable_floating_ip: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundNatRuleProperties {
    #[serde(rename = "frontendIPConfiguration", skip_serializing_if = "Option::is_none")]
    pub frontend_ip_configuration: Option<SubResource>,

    /// The NIC IP configuration receiving the traffic (read-only).
    #[serde(rename = "backendIPConfiguration", skip_serializing_if = "Option::is_none")]
    pub backend_ip_configuration: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<TransportProtocol>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<u32>,

    #[serde(rename = "enableFloatingIP", skip_serializing_if = "Option::is_none")]
    pub enable_floating_ip: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A frontend IP configuration definition.
#[derive(Debug, Clone)]
pub struct FrontendSpec {
    name: String,
    public_ip_address_id: Option<String>,
    subnet_id: Option<String>,
    private_ip_address: Option<String>,
}

impl FrontendSpec {
    /// An internet-facing frontend on a public IP address.
    pub fn public(name: impl Into<String>, public_ip_address_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_ip_address_id: Some(public_ip_address_id.into()),
            subnet_id: None,
            private_ip_address: None,
        }
    }

    /// An internal frontend with a dynamic address in a subnet.
    pub fn private(name: impl Into<String>, subnet_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_ip_address_id: None,
            subnet_id: Some(subnet_id.into()),
            private_ip_address: None,
        }
    }

    /// Use a static private address. Only valid for internal frontends.
    pub fn static_ip(mut self, address: impl Into<String>) -> Self {
        self.private_ip_address = Some(address.into());
        self
    }

    fn validate(&self) -> NetworkResult<()> {
        if let Some(id) = &self.public_ip_address_id {
            id.parse::<ResourceId>()?.expect_type("publicIPAddresses")?;
            if self.private_ip_address.is_some() {
                return Err(NetworkError::Builder(format!(
                    "frontend '{}' is public and cannot have a static private IP",
                    self.name
                )));
            }
        }
        if let Some(id) = &self.subnet_id {
            id.parse::<ResourceId>()?;
        }
        if let Some(ip) = &self.private_ip_address {
            validate::ip_address("static_ip", ip)?;
        }
        Ok(())
    }

    fn to_child(&self) -> FrontendIpConfiguration {
        let allocation = self.subnet_id.as_ref().map(|_| {
            if self.private_ip_address.is_some() {
                IpAllocationMethod::Static
            } else {
                IpAllocationMethod::Dynamic
            }
        });
        ChildResource::new(
            self.name.clone(),
            FrontendIpConfigurationProperties {
                private_ip_address: self.private_ip_address.clone(),
                private_ip_allocation_method: allocation,
                subnet: self.subnet_id.clone().map(SubResource::new),
                public_ip_address: self.public_ip_address_id.clone().map(SubResource::new),
                ..Default::default()
            },
        )
    }
}

/// A health probe definition.
#[derive(Debug, Clone)]
pub struct ProbeSpec {
    name: String,
    protocol: ProbeProtocol,
    port: u16,
    request_path: Option<String>,
    interval_in_seconds: Option<u32>,
    number_of_probes: Option<u32>,
}

impl ProbeSpec {
    /// A probe that succeeds when a TCP connection is accepted.
    pub fn tcp(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            protocol: ProbeProtocol::Tcp,
            port,
            request_path: None,
            interval_in_seconds: None,
            number_of_probes: None,
        }
    }

    /// A probe that succeeds when `GET request_path` answers 200.
    pub fn http(name: impl Into<String>, port: u16, request_path: impl Into<String>) -> Self {
        Self {
            protocol: ProbeProtocol::Http,
            request_path: Some(request_path.into()),
            ..Self::tcp(name, port)
        }
    }

    pub fn interval_in_seconds(mut self, seconds: u32) -> Self {
        self.interval_in_seconds = Some(seconds);
        self
    }

    pub fn number_of_probes(mut self, count: u32) -> Self {
        self.number_of_probes = Some(count);
        self
    }

    fn validate(&self) -> NetworkResult<()> {
        validate::port("probe port", self.port)?;
        if self.protocol == ProbeProtocol::Http {
            let path = self.request_path.as_deref().unwrap_or_default();
            if !path.starts_with('/') {
                return Err(NetworkError::Builder(format!(
                    "HTTP probe '{}' needs a request path starting with '/'",
                    self.name
                )));
            }
        }
        if let Some(seconds) = self.interval_in_seconds {
            if seconds < MIN_PROBE_INTERVAL_SECS {
                return Err(NetworkError::Builder(format!(
                    "probe '{}' interval must be at least {MIN_PROBE_INTERVAL_SECS} seconds",
                    self.name
                )));
            }
        }
        if self.number_of_probes == Some(0) {
            return Err(NetworkError::Builder(format!(
                "probe '{}' number_of_probes must be at least 1",
                self.name
            )));
        }
        Ok(())
    }

    fn to_child(&self) -> Probe {
        ChildResource::new(
            self.name.clone(),
            ProbeProperties {
                protocol: Some(self.protocol),
                port: Some(self.port),
                interval_in_seconds: self.interval_in_seconds,
                number_of_probes: self.number_of_probes,
                request_path: self.request_path.clone(),
                ..Default::default()
            },
        )
    }
}

/// A load balancing rule definition.
#[derive(Debug, Clone)]
pub struct LoadBalancingRuleSpec {
    name: String,
    frontend: String,
    backend_pool: String,
    protocol: TransportProtocol,
    frontend_port: u16,
    backend_port: u16,
    probe: Option<String>,
    load_distribution: Option<LoadDistribution>,
    idle_timeout_in_minutes: Option<u32>,
    enable_floating_ip: Option<bool>,
}

impl LoadBalancingRuleSpec {
    /// Send `protocol` traffic on `frontend:frontend_port` to `backend_pool:backend_port`.
    pub fn new(
        name: impl Into<String>,
        frontend: impl Into<String>,
        backend_pool: impl Into<String>,
        protocol: TransportProtocol,
        frontend_port: u16,
        backend_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            frontend: frontend.into(),
            backend_pool: backend_pool.into(),
            protocol,
            frontend_port,
            backend_port,
            probe: None,
            load_distribution: None,
            idle_timeout_in_minutes: None,
            enable_floating_ip: None,
        }
    }

    /// Only route to backends the named probe reports healthy.
    pub fn probe(mut self, probe: impl Into<String>) -> Self {
        self.probe = Some(probe.into());
        self
    }

    pub fn load_distribution(mut self, distribution: LoadDistribution) -> Self {
        self.load_distribution = Some(distribution);
        self
    }

    pub fn idle_timeout_in_minutes(mut self, minutes: u32) -> Self {
        self.idle_timeout_in_minutes = Some(minutes);
        self
    }

    pub fn enable_floating_ip(mut self, enable: bool) -> Self {
        self.enable_floating_ip = Some(enable);
        self
    }
}

/// An inbound NAT rule definition.
#[derive(Debug, Clone)]
pub struct InboundNatRuleSpec {
    name: String,
    frontend: String,
    protocol: TransportProtocol,
    frontend_port: u16,
    backend_port: u16,
    idle_timeout_in_minutes: Option<u32>,
    enable_floating_ip: Option<bool>,
}

impl InboundNatRuleSpec {
    pub fn new(
        name: impl Into<String>,
        frontend: impl Into<String>,
        protocol: TransportProtocol,
        frontend_port: u16,
        backend_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            frontend: frontend.into(),
            protocol,
            frontend_port,
            backend_port,
            idle_timeout_in_minutes: None,
            enable_floating_ip: None,
        }
    }

    pub fn idle_timeout_in_minutes(mut self, minutes: u32) -> Self {
        self.idle_timeout_in_minutes = Some(minutes);
        self
    }

    pub fn enable_floating_ip(mut self, enable: bool) -> Self {
        self.enable_floating_ip = Some(enable);
        self
    }
}

/// A validated request to create or replace a load balancer.
#[derive(Debug, Clone)]
pub struct LoadBalancerCreateRequest {
    location: String,
    tags: Tags,
    frontends: Vec<FrontendSpec>,
    backend_pools: Vec<String>,
    probes: Vec<ProbeSpec>,
    rules: Vec<LoadBalancingRuleSpec>,
    inbound_nat_rules: Vec<InboundNatRuleSpec>,
}

/// Builder for [`LoadBalancerCreateRequest`].
#[derive(Debug, Default)]
pub struct LoadBalancerCreateRequestBuilder {
    location: Option<String>,
    tags: Tags,
    frontends: Vec<FrontendSpec>,
    backend_pools: Vec<String>,
    probes: Vec<ProbeSpec>,
    rules: Vec<LoadBalancingRuleSpec>,
    inbound_nat_rules: Vec<InboundNatRuleSpec>,
}

#[derive(Serialize)]
struct LoadBalancerBody<'a> {
    location: &'a str,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    tags: Tags,
    properties: LoadBalancerProperties,
}

impl LoadBalancerCreateRequest {
    pub fn builder() -> LoadBalancerCreateRequestBuilder {
        LoadBalancerCreateRequestBuilder::default()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// The properties to send for the load balancer `id`, with every name
    /// reference expanded to a child resource ID.
    pub fn properties(&self, id: &ResourceId) -> LoadBalancerProperties {
        let child = |collection: &str, name: &str| SubResource::from(&id.child(collection, name));

        LoadBalancerProperties {
            frontend_ip_configurations: self.frontends.iter().map(FrontendSpec::to_child).collect(),
            backend_address_pools: self
                .backend_pools
                .iter()
                .map(|name| ChildResource::new(name.clone(), BackendAddressPoolProperties::default()))
                .collect(),
            probes: self.probes.iter().map(ProbeSpec::to_child).collect(),
            load_balancing_rules: self
                .rules
                .iter()
                .map(|rule| {
                    ChildResource::new(
                        rule.name.clone(),
                        LoadBalancingRuleProperties {
                            frontend_ip_configuration: Some(child(
                                "frontendIPConfigurations",
                                &rule.frontend,
                            )),
                            backend_address_pool: Some(child(
                                "backendAddressPools",
                                &rule.backend_pool,
                            )),
                            probe: rule.probe.as_deref().map(|p| child("probes", p)),
                            protocol: Some(rule.protocol),
                            load_distribution: rule.load_distribution,
                            frontend_port: Some(rule.frontend_port),
                            backend_port: Some(rule.backend_port),
                            idle_timeout_in_minutes: rule.idle_timeout_in_minutes,
                            enable_floating_ip: rule.enable_floating_ip,
                            provisioning_state: None,
                        },
                    )
                })
                .collect(),
            inbound_nat_rules: self
                .inbound_nat_rules
                .iter()
                .map(|nat| {
                    ChildResource::new(
                        nat.name.clone(),
                        InboundNatRuleProperties {
                            frontend_ip_configuration: Some(child(
                                "frontendIPConfigurations",
                                &nat.frontend,
                            )),
                            protocol: Some(nat.protocol),
                            frontend_port: Some(nat.frontend_port),
                            backend_port: Some(nat.backend_port),
                            idle_timeout_in_minutes: nat.idle_timeout_in_minutes,
                            enable_floating_ip: nat.enable_floating_ip,
                            ..Default::default()
                        },
                    )
                })
                .collect(),
            ..Default::default()
        }
    }
}

fn unique_names<'a>(what: &str, names: impl IntoIterator<Item = &'a str>) -> NetworkResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        validate::required(what, Some(name.to_string()))?;
        if !seen.insert(name) {
            return Err(NetworkError::Builder(format!(
                "{what} '{name}' is defined more than once"
            )));
        }
    }
    Ok(())
}

fn idle_timeout(rule: &str, minutes: Option<u32>) -> NetworkResult<()> {
    match minutes {
        Some(m) if !IDLE_TIMEOUT_RANGE.contains(&m) => Err(NetworkError::Builder(format!(
            "rule '{rule}' idle timeout must be between {} and {} minutes",
            IDLE_TIMEOUT_RANGE.start(),
            IDLE_TIMEOUT_RANGE.end()
        ))),
        _ => Ok(()),
    }
}

impl LoadBalancerCreateRequestBuilder {
    /// Set the Azure region. **Required.**
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a frontend IP configuration. At least one is required.
    pub fn frontend(mut self, frontend: FrontendSpec) -> Self {
        self.frontends.push(frontend);
        self
    }

    /// Add an empty backend address pool for NICs to join.
    pub fn backend_pool(mut self, name: impl Into<String>) -> Self {
        self.backend_pools.push(name.into());
        self
    }

    pub fn probe(mut self, probe: ProbeSpec) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn rule(mut self, rule: LoadBalancingRuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn inbound_nat_rule(mut self, rule: InboundNatRuleSpec) -> Self {
        self.inbound_nat_rules.push(rule);
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Builder`] when a required value is missing, a
    /// name is duplicated, a rule refers to an undefined frontend, pool or
    /// probe, a port or timeout is out of range, or two rules claim the same
    /// frontend port for the same protocol.
    pub fn build(self) -> NetworkResult<LoadBalancerCreateRequest> {
        let location = validate::required("location", self.location)?;

        if self.frontends.is_empty() {
            return Err(NetworkError::Builder(
                "at least one frontend IP configuration is required".into(),
            ));
        }

        unique_names("frontend", self.frontends.iter().map(|f| f.name.as_str()))?;
        unique_names("backend pool", self.backend_pools.iter().map(String::as_str))?;
        unique_names("probe", self.probes.iter().map(|p| p.name.as_str()))?;
        unique_names(
            "rule",
            self.rules
                .iter()
                .map(|r| r.name.as_str())
                .chain(self.inbound_nat_rules.iter().map(|r| r.name.as_str())),
        )?;

        for frontend in &self.frontends {
            frontend.validate()?;
        }
        for probe in &self.probes {
            probe.validate()?;
        }

        let frontends = || self.frontends.iter().map(|f| f.name.as_str());
        let pools = || self.backend_pools.iter().map(String::as_str);
        let probes = || self.probes.iter().map(|p| p.name.as_str());

        validate::references("frontend", frontends(), self.rules.iter().map(|r| r.frontend.as_str()))?;
        validate::references(
            "frontend",
            frontends(),
            self.inbound_nat_rules.iter().map(|r| r.frontend.as_str()),
        )?;
        validate::references("backend pool", pools(), self.rules.iter().map(|r| r.backend_pool.as_str()))?;
        validate::references("probe", probes(), self.rules.iter().filter_map(|r| r.probe.as_deref()))?;

        let mut claimed = HashSet::new();
        let ports = self
            .rules
            .iter()
            .map(|r| (&r.name, &r.frontend, r.protocol, r.frontend_port, r.backend_port, r.idle_timeout_in_minutes))
            .chain(self.inbound_nat_rules.iter().map(|r| {
                (&r.name, &r.frontend, r.protocol, r.frontend_port, r.backend_port, r.idle_timeout_in_minutes)
            }));
        for (name, frontend, protocol, frontend_port, backend_port, timeout) in ports {
            validate::port("frontend_port", frontend_port)?;
            validate::port("backend_port", backend_port)?;
            idle_timeout(name, timeout)?;
            if !claimed.insert((frontend.as_str(), protocol, frontend_port)) {
                return Err(NetworkError::Builder(format!(
                    "rule '{name}' reuses {protocol:?} port {frontend_port} on frontend '{frontend}'"
                )));
            }
        }

        Ok(LoadBalancerCreateRequest {
            location,
            tags: self.tags,
            frontends: self.frontends,
            backend_pools: self.backend_pools,
            probes: self.probes,
            rules: self.rules,
            inbound_nat_rules: self.inbound_nat_rules,
        })
    }
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Create or replace a load balancer and wait for provisioning to finish.
///
/// # Tracing
///
/// Emits a span named `network::load_balancers::create_or_update`.
#[tracing::instrument(
    name = "network::load_balancers::create_or_update",
    skip(client, request),
    fields(resource_group = %resource_group, name = %name, location = %request.location)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    request: &LoadBalancerCreateRequest,
) -> NetworkResult<LoadBalancer> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let id = ResourceId::network(client.subscription_id(), resource_group, COLLECTION, name);

    let body = LoadBalancerBody {
        location: &request.location,
        tags: request.tags.clone(),
        properties: request.properties(&id),
    };
    tracing::debug!(
        frontends = body.properties.frontend_ip_configurations.len(),
        rules = body.properties.load_balancing_rules.len(),
        "creating load balancer"
    );

    lro::put_and_wait(client, &path, &body).await
}

/// Send back a modified copy of a fetched load balancer.
#[tracing::instrument(
    name = "network::load_balancers::update",
    skip(client, lb),
    fields(resource_group = %resource_group, name = %lb.name)
)]
pub async fn update(
    client: &NetworkClient,
    resource_group: &str,
    lb: &LoadBalancer,
) -> NetworkResult<LoadBalancer> {
    let path = client.resource_path(resource_group, COLLECTION, &lb.name)?;
    lro::put_and_wait(client, &path, lb).await
}

#[tracing::instrument(
    name = "network::load_balancers::update_tags",
    skip(client, tags),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn update_tags(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    tags: &TagsUpdate,
) -> NetworkResult<LoadBalancer> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.patch(&path, tags).await?;
    Ok(response.json::<LoadBalancer>().await?)
}

#[tracing::instrument(
    name = "network::load_balancers::get",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn get(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<LoadBalancer> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<LoadBalancer>().await?)
}

pub async fn get_by_id(client: &NetworkClient, id: &str) -> NetworkResult<LoadBalancer> {
    let id: ResourceId = id.parse()?;
    id.expect_type(COLLECTION)?;
    client.ensure_subscription(&id)?;
    get(client, &id.resource_group, &id.name).await
}

#[tracing::instrument(
    name = "network::load_balancers::list",
    skip(client),
    fields(resource_group = %resource_group)
)]
pub async fn list(client: &NetworkClient, resource_group: &str) -> NetworkResult<Vec<LoadBalancer>> {
    let path = client.resource_collection_path(resource_group, COLLECTION)?;
    pager::collect_all(client, path).await
}

#[tracing::instrument(name = "network::load_balancers::list_all", skip(client))]
pub async fn list_all(client: &NetworkClient) -> NetworkResult<Vec<LoadBalancer>> {
    pager::collect_all(client, client.subscription_collection_path(COLLECTION)).await
}

#[tracing::instrument(
    name = "network::load_balancers::delete",
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
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pip_id() -> String {
        network_id(TEST_RESOURCE_GROUP, "publicIPAddresses/lb-pip")
    }

    fn lb_id() -> ResourceId {
        ResourceId::network(TEST_SUBSCRIPTION_ID, TEST_RESOURCE_GROUP, COLLECTION, "lb1")
    }

    fn web_request() -> LoadBalancerCreateRequestBuilder {
        LoadBalancerCreateRequest::builder()
            .location(TEST_LOCATION)
            .frontend(FrontendSpec::public("fe", pip_id()))
            .backend_pool("pool")
            .probe(ProbeSpec::http("health", 80, "/healthz").interval_in_seconds(15).number_of_probes(2))
            .rule(
                LoadBalancingRuleSpec::new("http", "fe", "pool", TransportProtocol::Tcp, 80, 8080)
                    .probe("health")
                    .load_distribution(LoadDistribution::SourceIp),
            )
            .inbound_nat_rule(InboundNatRuleSpec::new("ssh-vm1", "fe", TransportProtocol::Tcp, 50001, 22))
    }

    #[test]
    fn properties_expand_references() {
        let request = web_request().build().expect("valid request");
        let props = serde_json::to_value(request.properties(&lb_id())).unwrap();
        let base = lb_id().to_string();

        assert_eq!(props["frontendIPConfigurations"][0]["name"], "fe");
        assert_eq!(
            props["frontendIPConfigurations"][0]["properties"]["publicIPAddress"]["id"],
            pip_id()
        );
        assert_eq!(props["backendAddressPools"][0], serde_json::json!({"name": "pool", "properties": {}}));

        let probe = &props["probes"][0]["properties"];
        assert_eq!(probe["protocol"], "Http");
        assert_eq!(probe["requestPath"], "/healthz");
        assert_eq!(probe["intervalInSeconds"], 15);

        let rule = &props["loadBalancingRules"][0]["properties"];
        assert_eq!(
            rule["frontendIPConfiguration"]["id"],
            format!("{base}/frontendIPConfigurations/fe")
        );
        assert_eq!(rule["backendAddressPool"]["id"], format!("{base}/backendAddressPools/pool"));
        assert_eq!(rule["probe"]["id"], format!("{base}/probes/health"));
        assert_eq!(rule["loadDistribution"], "SourceIP");
        assert_eq!(rule["frontendPort"], 80);
        assert_eq!(rule["backendPort"], 8080);

        let nat = &props["inboundNatRules"][0]["properties"];
        assert_eq!(nat["frontendPort"], 50001);
        assert_eq!(nat["backendPort"], 22);
    }

    #[test]
    fn private_frontend_with_static_ip() {
        let subnet = network_id(TEST_RESOURCE_GROUP, "virtualNetworks/vnet1/subnets/backend");
        let request = LoadBalancerCreateRequest::builder()
            .location(TEST_LOCATION)
            .frontend(FrontendSpec::private("ilb", subnet.clone()).static_ip("10.0.2.10"))
            .build()
            .unwrap();

        let props = request.properties(&lb_id());
        let fe = &props.frontend_ip_configurations[0].properties;
        assert_eq!(fe.subnet.as_ref().unwrap().id, subnet);
        assert_eq!(fe.private_ip_address.as_deref(), Some("10.0.2.10"));
        assert_eq!(fe.private_ip_allocation_method, Some(IpAllocationMethod::Static));
        assert!(fe.public_ip_address.is_none());
    }

    #[test]
    fn builder_rejects_undefined_references() {
        let err = web_request()
            .rule(LoadBalancingRuleSpec::new("https", "fe", "missing-pool", TransportProtocol::Tcp, 443, 443))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("backend pool 'missing-pool'"));

        let err = web_request()
            .rule(
                LoadBalancingRuleSpec::new("https", "fe", "pool", TransportProtocol::Tcp, 443, 443)
                    .probe("nope"),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("probe 'nope'"));

        let err = web_request()
            .inbound_nat_rule(InboundNatRuleSpec::new("rdp", "other-fe", TransportProtocol::Tcp, 3389, 3389))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("frontend 'other-fe'"));
    }

    #[test]
    fn builder_validates_probes() {
        let err = web_request()
            .probe(ProbeSpec::http("bad-path", 80, "healthz"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("starting with '/'"));

        assert!(web_request().probe(ProbeSpec::tcp("zero", 0)).build().is_err());
        assert!(web_request()
            .probe(ProbeSpec::tcp("fast", 22).interval_in_seconds(1))
            .build()
            .is_err());
        assert!(web_request()
            .probe(ProbeSpec::tcp("never", 22).number_of_probes(0))
            .build()
            .is_err());
        assert!(web_request().probe(ProbeSpec::tcp("ssh", 22)).build().is_ok());
    }

    #[test]
    fn builder_rejects_port_conflicts_and_duplicates() {
        let err = web_request()
            .inbound_nat_rule(InboundNatRuleSpec::new("clash", "fe", TransportProtocol::Tcp, 80, 22))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("reuses Tcp port 80"));

        // Same port over UDP is a different listener.
        assert!(web_request()
            .rule(LoadBalancingRuleSpec::new("dns", "fe", "pool", TransportProtocol::Udp, 80, 80))
            .build()
            .is_ok());

        let err = web_request().backend_pool("pool").build().unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let err = web_request()
            .rule(
                LoadBalancingRuleSpec::new("slow", "fe", "pool", TransportProtocol::Tcp, 81, 81)
                    .idle_timeout_in_minutes(31),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("idle timeout"));
    }

    #[test]
    fn builder_requires_frontend_and_valid_ids() {
        let err = LoadBalancerCreateRequest::builder()
            .location(TEST_LOCATION)
            .backend_pool("pool")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("frontend IP configuration"));

        let vnet = network_id(TEST_RESOURCE_GROUP, "virtualNetworks/vnet1");
        let err = LoadBalancerCreateRequest::builder()
            .location(TEST_LOCATION)
            .frontend(FrontendSpec::public("fe", vnet))
            .build()
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidResourceId { .. }));

        let err = LoadBalancerCreateRequest::builder()
            .location(TEST_LOCATION)
            .frontend(FrontendSpec::public("fe", pip_id()).static_ip("10.0.0.5"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("cannot have a static private IP"));
    }

    #[tokio::test]
    async fn create_sends_expanded_body() {
        let server = MockServer::start().await;
        let lb_path = format!("{}/loadBalancers/lb1", network_path(TEST_RESOURCE_GROUP));
        let base = lb_id().to_string();

        Mock::given(method("PUT"))
            .and(path(lb_path.as_str()))
            .and(body_partial_json(serde_json::json!({
                "location": TEST_LOCATION,
                "properties": {
                    "loadBalancingRules": [{
                        "name": "http",
                        "properties": {"probe": {"id": format!("{base}/probes/health")}}
                    }]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": base,
                "name": "lb1",
                "location": TEST_LOCATION,
                "properties": {
                    "frontendIPConfigurations": [{
                        "id": format!("{base}/frontendIPConfigurations/fe"),
                        "name": "fe",
                        "properties": {
                            "publicIPAddress": {"id": pip_id()},
                            "loadBalancingRules": [{"id": format!("{base}/loadBalancingRules/http")}]
                        }
                    }],
                    "provisioningState": "Succeeded"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let request = web_request().build().unwrap();

        let lb = create_or_update(&client, TEST_RESOURCE_GROUP, "lb1", &request)
            .await
            .expect("should succeed");
        assert_eq!(lb.properties.frontend_ip_configurations[0].properties.load_balancing_rules.len(), 1);
        assert_eq!(lb.properties.provisioning_state, Some(ProvisioningState::Succeeded));
    }

    #[tokio::test]
    async fn get_by_id_rejects_other_subscriptions() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let foreign = ResourceId::network(
            "11111111-1111-1111-1111-111111111111",
            TEST_RESOURCE_GROUP,
            COLLECTION,
            "lb1",
        );
        let err = get_by_id(&client, &foreign.to_string()).await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn get_list_and_delete() {
        let server = MockServer::start().await;
        let collection = format!("{}/loadBalancers", network_path(TEST_RESOURCE_GROUP));
        let lb = serde_json::json!({"id": lb_id().to_string(), "name": "lb1", "properties": {}});

        Mock::given(method("GET"))
            .and(path(format!("{collection}/lb1").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(&lb))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(collection.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": [lb]})))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(format!("{collection}/lb1").as_str()))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Location", format!("{}/operations/lbdel", server.uri()).as_str())
                    .insert_header("Retry-After", "0"),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/lbdel"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;

        let fetched = get_by_id(&client, &lb_id().to_string()).await.expect("should succeed");
        assert_eq!(fetched.name, "lb1");

        assert_eq!(list(&client, TEST_RESOURCE_GROUP).await.expect("should succeed").len(), 1);

        delete(&client, TEST_RESOURCE_GROUP, "lb1").await.expect("should succeed");
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn create_emits_span() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "lb1"})))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let request = web_request().build().unwrap();
        let _ = create_or_update(&client, TEST_RESOURCE_GROUP, "lb1", &request).await;

        assert!(logs_contain("network::load_balancers::create_or_update"));
    }
}
