//! Application gateways.
//!
//! An application gateway is a layer-7 load balancer deployed into its own
//! subnet. Requests arrive at an HTTP listener (a frontend IP plus a
//! frontend port, optionally a host name and an SSL certificate) and a
//! request routing rule sends them to a backend address pool using a set of
//! backend HTTP settings.
//!
//! As with load balancers, the request builder takes child references by
//! name. A running gateway can be stopped and started again with [`stop`]
//! and [`start`].

use azure_network_core::client::NetworkClient;
use azure_network_core::error::{NetworkError, NetworkResult};
use azure_network_core::models::{
    ChildResource, IpAllocationMethod, ProvisioningState, Resource, ResourceId, SubResource, Tags,
};
use azure_network_core::{lro, pager, validate};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::ops::RangeInclusive;

const COLLECTION: &str = "applicationGateways";

/// Allowed number of gateway instances.
pub const CAPACITY_RANGE: RangeInclusive<u32> = 1..=10;

/// Allowed backend request timeout, in seconds.
pub const REQUEST_TIMEOUT_RANGE: RangeInclusive<u32> = 1..=86400;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// An application gateway.
pub type ApplicationGateway = Resource<ApplicationGatewayProperties>;

pub type GatewayIpConfiguration = ChildResource<GatewayIpConfigurationProperties>;
pub type SslCertificate = ChildResource<SslCertificateProperties>;
pub type FrontendIpConfiguration = ChildResource<FrontendIpConfigurationProperties>;
pub type FrontendPort = ChildResource<FrontendPortProperties>;
pub type BackendAddressPool = ChildResource<BackendAddressPoolProperties>;
pub type BackendHttpSettings = ChildResource<BackendHttpSettingsProperties>;
pub type HttpListener = ChildResource<HttpListenerProperties>;
pub type RequestRoutingRule = ChildResource<RequestRoutingRuleProperties>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationGatewayProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<ApplicationGatewaySku>,

    /// Read-only; changed through [`start`] and [`stop`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operational_state: Option<OperationalState>,

    #[serde(rename = "gatewayIPConfigurations", default, skip_serializing_if = "Vec::is_empty")]
    pub gateway_ip_configurations: Vec<GatewayIpConfiguration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssl_certificates: Vec<SslCertificate>,

    #[serde(rename = "frontendIPConfigurations", default, skip_serializing_if = "Vec::is_empty")]
    pub frontend_ip_configurations: Vec<FrontendIpConfiguration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frontend_ports: Vec<FrontendPort>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backend_address_pools: Vec<BackendAddressPool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backend_http_settings_collection: Vec<BackendHttpSettings>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_listeners: Vec<HttpListener>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub request_routing_rules: Vec<RequestRoutingRule>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationGatewaySku {
    pub name: SkuName,
    pub tier: SkuTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// Instance size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuName {
    #[serde(rename = "Standard_Small")]
    StandardSmall,
    #[serde(rename = "Standard_Medium")]
    StandardMedium,
    #[serde(rename = "Standard_Large")]
    StandardLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuTier {
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalState {
    Stopped,
    Starting,
    Running,
    Stopping,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationGatewayProtocol {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookieBasedAffinity {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestRoutingRuleType {
    Basic,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayIpConfigurationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// SSL certificate for HTTPS listeners.
///
/// `data` and `password` are write-only: the service returns only
/// `public_cert_data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslCertificateProperties {
    /// Base64-encoded PFX.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(
        skip_deserializing,
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_password"
    )]
    pub password: Option<SecretString>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_cert_data: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

fn expose_password<S: Serializer>(
    password: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match password {
        Some(password) => serializer.serialize_some(password.expose_secret()),
        None => serializer.serialize_none(),
    }
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

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendPortProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// A backend server, by host name or IP address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddressPoolProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backend_addresses: Vec<BackendAddress>,

    /// NIC IP configurations in this pool (read-only).
    #[serde(rename = "backendIPConfigurations", default, skip_serializing_if = "Vec::is_empty")]
    pub backend_ip_configurations: Vec<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHttpSettingsProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ApplicationGatewayProtocol>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_based_affinity: Option<CookieBasedAffinity>,

    /// Seconds to wait for a backend response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpListenerProperties {
    #[serde(rename = "frontendIPConfiguration", skip_serializing_if = "Option::is_none")]
    pub frontend_ip_configuration: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_port: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ApplicationGatewayProtocol>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_certificate: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRoutingRuleProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<RequestRoutingRuleType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_address_pool: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_http_settings: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_listener: Option<SubResource>,

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
    pub fn public(name: impl Into<String>, public_ip_address_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_ip_address_id: Some(public_ip_address_id.into()),
            subnet_id: None,
            private_ip_address: None,
        }
    }

    pub fn private(name: impl Into<String>, subnet_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_ip_address_id: None,
            subnet_id: Some(subnet_id.into()),
            private_ip_address: None,
        }
    }

    /// Use a static private address. Only valid for private frontends.
    pub fn static_ip(mut self, address: impl Into<String>) -> Self {
        self.private_ip_address = Some(address.into());
        self
    }
}

/// A backend address pool definition.
#[derive(Debug, Clone)]
pub struct BackendPoolSpec {
    name: String,
    addresses: Vec<BackendAddress>,
}

impl BackendPoolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addresses: Vec::new(),
        }
    }

    pub fn ip_address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(BackendAddress {
            fqdn: None,
            ip_address: Some(address.into()),
        });
        self
    }

    pub fn fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.addresses.push(BackendAddress {
            fqdn: Some(fqdn.into()),
            ip_address: None,
        });
        self
    }
}

/// Backend HTTP settings: how the gateway talks to backend servers.
#[derive(Debug, Clone)]
pub struct HttpSettingsSpec {
    name: String,
    port: u16,
    protocol: ApplicationGatewayProtocol,
    cookie_based_affinity: bool,
    request_timeout: Option<u32>,
}

impl HttpSettingsSpec {
    pub fn new(name: impl Into<String>, port: u16, protocol: ApplicationGatewayProtocol) -> Self {
        Self {
            name: name.into(),
            port,
            protocol,
            cookie_based_affinity: false,
            request_timeout: None,
        }
    }

    /// Pin each client to one backend with a gateway-managed cookie.
    pub fn cookie_based_affinity(mut self, enabled: bool) -> Self {
        self.cookie_based_affinity = enabled;
        self
    }

    pub fn request_timeout(mut self, seconds: u32) -> Self {
        self.request_timeout = Some(seconds);
        self
    }
}

/// An SSL certificate definition.
#[derive(Debug, Clone)]
pub struct SslCertificateSpec {
    name: String,
    data: String,
    password: SecretString,
}

impl SslCertificateSpec {
    /// `pfx_base64` is the base64-encoded PFX file protected by `password`.
    pub fn new(name: impl Into<String>, pfx_base64: impl Into<String>, password: SecretString) -> Self {
        Self {
            name: name.into(),
            data: pfx_base64.into(),
            password,
        }
    }
}

/// An HTTP listener definition.
#[derive(Debug, Clone)]
pub struct ListenerSpec {
    name: String,
    frontend: String,
    frontend_port: String,
    protocol: ApplicationGatewayProtocol,
    ssl_certificate: Option<String>,
    host_name: Option<String>,
}

impl ListenerSpec {
    pub fn http(
        name: impl Into<String>,
        frontend: impl Into<String>,
        frontend_port: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            frontend: frontend.into(),
            frontend_port: frontend_port.into(),
            protocol: ApplicationGatewayProtocol::Http,
            ssl_certificate: None,
            host_name: None,
        }
    }

    /// An HTTPS listener terminating TLS with the named certificate.
    pub fn https(
        name: impl Into<String>,
        frontend: impl Into<String>,
        frontend_port: impl Into<String>,
        ssl_certificate: impl Into<String>,
    ) -> Self {
        Self {
            protocol: ApplicationGatewayProtocol::Https,
            ssl_certificate: Some(ssl_certificate.into()),
            ..Self::http(name, frontend, frontend_port)
        }
    }

    /// Only accept requests for this host name (multi-site hosting).
    pub fn host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }
}

/// A basic request routing rule: everything a listener receives goes to one pool.
#[derive(Debug, Clone)]
pub struct RoutingRuleSpec {
    name: String,
    listener: String,
    backend_pool: String,
    http_settings: String,
}

impl RoutingRuleSpec {
    pub fn basic(
        name: impl Into<String>,
        listener: impl Into<String>,
        backend_pool: impl Into<String>,
        http_settings: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            listener: listener.into(),
            backend_pool: backend_pool.into(),
            http_settings: http_settings.into(),
        }
    }
}

/// A validated request to create or replace an application gateway.
#[derive(Debug, Clone)]
pub struct ApplicationGatewayCreateRequest {
    location: String,
    tags: Tags,
    sku: ApplicationGatewaySku,
    gateway_ip_configuration: (String, String),
    frontends: Vec<FrontendSpec>,
    frontend_ports: Vec<(String, u16)>,
    backend_pools: Vec<BackendPoolSpec>,
    http_settings: Vec<HttpSettingsSpec>,
    ssl_certificates: Vec<SslCertificateSpec>,
    listeners: Vec<ListenerSpec>,
    rules: Vec<RoutingRuleSpec>,
}

/// Builder for [`ApplicationGatewayCreateRequest`].
#[derive(Debug, Default)]
pub struct ApplicationGatewayCreateRequestBuilder {
    location: Option<String>,
    tags: Tags,
    sku: Option<(SkuName, u32)>,
    gateway_ip_configuration: Option<(String, String)>,
    frontends: Vec<FrontendSpec>,
    frontend_ports: Vec<(String, u16)>,
    backend_pools: Vec<BackendPoolSpec>,
    http_settings: Vec<HttpSettingsSpec>,
    ssl_certificates: Vec<SslCertificateSpec>,
    listeners: Vec<ListenerSpec>,
    rules: Vec<RoutingRuleSpec>,
}

#[derive(Serialize)]
struct ApplicationGatewayBody<'a> {
    location: &'a str,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    tags: Tags,
    properties: ApplicationGatewayProperties,
}

impl ApplicationGatewayCreateRequest {
    pub fn builder() -> ApplicationGatewayCreateRequestBuilder {
        ApplicationGatewayCreateRequestBuilder::default()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn sku(&self) -> ApplicationGatewaySku {
        self.sku
    }

    /// The properties to send for the gateway `id`, with every name
    /// reference expanded to a child resource ID.
    pub fn properties(&self, id: &ResourceId) -> ApplicationGatewayProperties {
        let child = |collection: &str, name: &str| SubResource::from(&id.child(collection, name));
        let (gateway_config, gateway_subnet) = &self.gateway_ip_configuration;

        ApplicationGatewayProperties {
            sku: Some(self.sku),
            gateway_ip_configurations: vec![ChildResource::new(
                gateway_config.clone(),
                GatewayIpConfigurationProperties {
                    subnet: Some(SubResource::new(gateway_subnet.clone())),
                    provisioning_state: None,
                },
            )],
            ssl_certificates: self
                .ssl_certificates
                .iter()
                .map(|cert| {
                    ChildResource::new(
                        cert.name.clone(),
                        SslCertificateProperties {
                            data: Some(cert.data.clone()),
                            password: Some(cert.password.clone()),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
            frontend_ip_configurations: self
                .frontends
                .iter()
                .map(|fe| {
                    let allocation = fe.subnet_id.as_ref().map(|_| match fe.private_ip_address {
                        Some(_) => IpAllocationMethod::Static,
                        None => IpAllocationMethod::Dynamic,
                    });
                    ChildResource::new(
                        fe.name.clone(),
                        FrontendIpConfigurationProperties {
                            private_ip_address: fe.private_ip_address.clone(),
                            private_ip_allocation_method: allocation,
                            subnet: fe.subnet_id.clone().map(SubResource::new),
                            public_ip_address: fe.public_ip_address_id.clone().map(SubResource::new),
                            provisioning_state: None,
                        },
                    )
                })
                .collect(),
            frontend_ports: self
                .frontend_ports
                .iter()
                .map(|(name, port)| {
                    ChildResource::new(
                        name.clone(),
                        FrontendPortProperties {
                            port: Some(*port),
                            provisioning_state: None,
                        },
                    )
                })
                .collect(),
            backend_address_pools: self
                .backend_pools
                .iter()
                .map(|pool| {
                    ChildResource::new(
                        pool.name.clone(),
                        BackendAddressPoolProperties {
                            backend_addresses: pool.addresses.clone(),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
            backend_http_settings_collection: self
                .http_settings
                .iter()
                .map(|settings| {
                    let affinity = if settings.cookie_based_affinity {
                        CookieBasedAffinity::Enabled
                    } else {
                        CookieBasedAffinity::Disabled
                    };
                    ChildResource::new(
                        settings.name.clone(),
                        BackendHttpSettingsProperties {
                            port: Some(settings.port),
                            protocol: Some(settings.protocol),
                            cookie_based_affinity: Some(affinity),
                            request_timeout: settings.request_timeout,
                            provisioning_state: None,
                        },
                    )
                })
                .collect(),
            http_listeners: self
                .listeners
                .iter()
                .map(|listener| {
                    ChildResource::new(
                        listener.name.clone(),
                        HttpListenerProperties {
                            frontend_ip_configuration: Some(child(
                                "frontendIPConfigurations",
                                &listener.frontend,
                            )),
                            frontend_port: Some(child("frontendPorts", &listener.frontend_port)),
                            protocol: Some(listener.protocol),
                            host_name: listener.host_name.clone(),
                            ssl_certificate: listener
                                .ssl_certificate
                                .as_deref()
                                .map(|cert| child("sslCertificates", cert)),
                            provisioning_state: None,
                        },
                    )
                })
                .collect(),
            request_routing_rules: self
                .rules
                .iter()
                .map(|rule| {
                    ChildResource::new(
                        rule.name.clone(),
                        RequestRoutingRuleProperties {
                            rule_type: Some(RequestRoutingRuleType::Basic),
                            backend_address_pool: Some(child("backendAddressPools", &rule.backend_pool)),
                            backend_http_settings: Some(child(
                                "backendHttpSettingsCollection",
                                &rule.http_settings,
                            )),
                            http_listener: Some(child("httpListeners", &rule.listener)),
                            provisioning_state: None,
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

impl ApplicationGatewayCreateRequestBuilder {
    /// Set the Azure region. **Required.**
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the instance size and count. **Required.**
    pub fn sku(mut self, name: SkuName, capacity: u32) -> Self {
        self.sku = Some((name, capacity));
        self
    }

    /// Deploy the gateway into `subnet_id`. **Required.**
    ///
    /// The subnet must be dedicated to application gateways.
    pub fn gateway_ip_configuration(mut self, name: impl Into<String>, subnet_id: impl Into<String>) -> Self {
        self.gateway_ip_configuration = Some((name.into(), subnet_id.into()));
        self
    }

    pub fn frontend(mut self, frontend: FrontendSpec) -> Self {
        self.frontends.push(frontend);
        self
    }

    pub fn frontend_port(mut self, name: impl Into<String>, port: u16) -> Self {
        self.frontend_ports.push((name.into(), port));
        self
    }

    pub fn backend_pool(mut self, pool: BackendPoolSpec) -> Self {
        self.backend_pools.push(pool);
        self
    }

    pub fn http_settings(mut self, settings: HttpSettingsSpec) -> Self {
        self.http_settings.push(settings);
        self
    }

    pub fn ssl_certificate(mut self, certificate: SslCertificateSpec) -> Self {
        self.ssl_certificates.push(certificate);
        self
    }

    pub fn listener(mut self, listener: ListenerSpec) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn routing_rule(mut self, rule: RoutingRuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Builder`] when the location, SKU, gateway IP
    /// configuration, a frontend, a listener or a routing rule is missing,
    /// when a name or frontend port is duplicated, or when a listener or
    /// rule refers to something not defined in the request.
    pub fn build(self) -> NetworkResult<ApplicationGatewayCreateRequest> {
        let location = validate::required("location", self.location)?;

        let (sku_name, capacity) = self
            .sku
            .ok_or_else(|| NetworkError::Builder("sku is required".into()))?;
        if !CAPACITY_RANGE.contains(&capacity) {
            return Err(NetworkError::Builder(format!(
                "capacity must be between {} and {}",
                CAPACITY_RANGE.start(),
                CAPACITY_RANGE.end()
            )));
        }

        let (gateway_config, gateway_subnet) = self.gateway_ip_configuration.ok_or_else(|| {
            NetworkError::Builder("gateway IP configuration is required".into())
        })?;
        validate::required("gateway IP configuration name", Some(gateway_config.clone()))?;
        let subnet_id: ResourceId = gateway_subnet.parse()?;
        if !subnet_id
            .full_type()
            .eq_ignore_ascii_case("Microsoft.Network/virtualNetworks/subnets")
        {
            return Err(NetworkError::InvalidResourceId {
                id: gateway_subnet,
                reason: "expected a Microsoft.Network/virtualNetworks/subnets resource".into(),
            });
        }

        for (what, empty) in [
            ("frontend IP configuration", self.frontends.is_empty()),
            ("frontend port", self.frontend_ports.is_empty()),
            ("backend address pool", self.backend_pools.is_empty()),
            ("backend HTTP settings", self.http_settings.is_empty()),
            ("HTTP listener", self.listeners.is_empty()),
            ("request routing rule", self.rules.is_empty()),
        ] {
            if empty {
                return Err(NetworkError::Builder(format!("at least one {what} is required")));
            }
        }

        unique_names("frontend", self.frontends.iter().map(|f| f.name.as_str()))?;
        unique_names("frontend port", self.frontend_ports.iter().map(|(n, _)| n.as_str()))?;
        unique_names("backend pool", self.backend_pools.iter().map(|p| p.name.as_str()))?;
        unique_names("HTTP settings", self.http_settings.iter().map(|s| s.name.as_str()))?;
        unique_names("SSL certificate", self.ssl_certificates.iter().map(|c| c.name.as_str()))?;
        unique_names("listener", self.listeners.iter().map(|l| l.name.as_str()))?;
        unique_names("rule", self.rules.iter().map(|r| r.name.as_str()))?;

        for fe in &self.frontends {
            if let Some(id) = &fe.public_ip_address_id {
                id.parse::<ResourceId>()?.expect_type("publicIPAddresses")?;
                if fe.private_ip_address.is_some() {
                    return Err(NetworkError::Builder(format!(
                        "frontend '{}' is public and cannot have a static private IP",
                        fe.name
                    )));
                }
            }
            if let Some(id) = &fe.subnet_id {
                id.parse::<ResourceId>()?;
            }
            if let Some(ip) = &fe.private_ip_address {
                validate::ip_address("static_ip", ip)?;
            }
        }

        let mut ports = HashSet::new();
        for (name, port) in &self.frontend_ports {
            validate::port("frontend port", *port)?;
            if !ports.insert(*port) {
                return Err(NetworkError::Builder(format!(
                    "frontend port '{name}' reuses port {port}"
                )));
            }
        }

        for pool in &self.backend_pools {
            for address in &pool.addresses {
                if let Some(ip) = &address.ip_address {
                    validate::ip_address("backend address", ip)?;
                }
                if let Some(fqdn) = &address.fqdn {
                    validate::required("backend fqdn", Some(fqdn.clone()))?;
                }
            }
        }

        for settings in &self.http_settings {
            validate::port("backend port", settings.port)?;
            if let Some(timeout) = settings.request_timeout {
                if !REQUEST_TIMEOUT_RANGE.contains(&timeout) {
                    return Err(NetworkError::Builder(format!(
                        "HTTP settings '{}' request timeout must be between {} and {} seconds",
                        settings.name,
                        REQUEST_TIMEOUT_RANGE.start(),
                        REQUEST_TIMEOUT_RANGE.end()
                    )));
                }
            }
        }

        for cert in &self.ssl_certificates {
            validate::required("SSL certificate data", Some(cert.data.clone()))?;
        }

        validate::references(
            "frontend",
            self.frontends.iter().map(|f| f.name.as_str()),
            self.listeners.iter().map(|l| l.frontend.as_str()),
        )?;
        validate::references(
            "frontend port",
            self.frontend_ports.iter().map(|(n, _)| n.as_str()),
            self.listeners.iter().map(|l| l.frontend_port.as_str()),
        )?;
        validate::references(
            "SSL certificate",
            self.ssl_certificates.iter().map(|c| c.name.as_str()),
            self.listeners.iter().filter_map(|l| l.ssl_certificate.as_deref()),
        )?;

        let mut sites = HashSet::new();
        for listener in &self.listeners {
            if listener.protocol == ApplicationGatewayProtocol::Https && listener.ssl_certificate.is_none() {
                return Err(NetworkError::Builder(format!(
                    "HTTPS listener '{}' needs an SSL certificate",
                    listener.name
                )));
            }
            let site = (
                listener.frontend.as_str(),
                listener.frontend_port.as_str(),
                listener.host_name.as_deref().unwrap_or_default(),
            );
            if !sites.insert(site) {
                return Err(NetworkError::Builder(format!(
                    "listener '{}' duplicates another listener's frontend, port and host name",
                    listener.name
                )));
            }
        }

        validate::references(
            "listener",
            self.listeners.iter().map(|l| l.name.as_str()),
            self.rules.iter().map(|r| r.listener.as_str()),
        )?;
        validate::references(
            "backend pool",
            self.backend_pools.iter().map(|p| p.name.as_str()),
            self.rules.iter().map(|r| r.backend_pool.as_str()),
        )?;
        validate::references(
            "HTTP settings",
            self.http_settings.iter().map(|s| s.name.as_str()),
            self.rules.iter().map(|r| r.http_settings.as_str()),
        )?;

        let mut routed = HashSet::new();
        for rule in &self.rules {
            if !routed.insert(rule.listener.as_str()) {
                return Err(NetworkError::Builder(format!(
                    "listener '{}' is used by more than one rule",
                    rule.listener
                )));
            }
        }

        Ok(ApplicationGatewayCreateRequest {
            location,
            tags: self.tags,
            sku: ApplicationGatewaySku {
                name: sku_name,
                tier: SkuTier::Standard,
                capacity: Some(capacity),
            },
            gateway_ip_configuration: (gateway_config, gateway_subnet),
            frontends: self.frontends,
            frontend_ports: self.frontend_ports,
            backend_pools: self.backend_pools,
            http_settings: self.http_settings,
            ssl_certificates: self.ssl_certificates,
            listeners: self.listeners,
            rules: self.rules,
        })
    }
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Create or replace an application gateway and wait for provisioning to finish.
///
/// Provisioning a gateway commonly takes several minutes; raise the
/// client's `max_poll_attempts` accordingly.
///
/// # Tracing
///
/// Emits a span named `network::application_gateways::create_or_update`.
#[tracing::instrument(
    name = "network::application_gateways::create_or_update",
    skip(client, request),
    fields(resource_group = %resource_group, name = %name, location = %request.location)
)]
pub async fn create_or_update(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    request: &ApplicationGatewayCreateRequest,
) -> NetworkResult<ApplicationGateway> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let id = ResourceId::network(client.subscription_id(), resource_group, COLLECTION, name);

    let body = ApplicationGatewayBody {
        location: &request.location,
        tags: request.tags.clone(),
        properties: request.properties(&id),
    };
    tracing::debug!(
        sku = ?request.sku.name,
        capacity = ?request.sku.capacity,
        listeners = body.properties.http_listeners.len(),
        "creating application gateway"
    );

    lro::put_and_wait(client, &path, &body).await
}

/// Send back a modified copy of a fetched gateway.
///
/// Certificate data and passwords are never returned by the service, so
/// set them again on any certificate the gateway still uses.
#[tracing::instrument(
    name = "network::application_gateways::update",
    skip(client, gateway),
    fields(resource_group = %resource_group, name = %gateway.name)
)]
pub async fn update(
    client: &NetworkClient,
    resource_group: &str,
    gateway: &ApplicationGateway,
) -> NetworkResult<ApplicationGateway> {
    let path = client.resource_path(resource_group, COLLECTION, &gateway.name)?;
    lro::put_and_wait(client, &path, gateway).await
}

#[tracing::instrument(
    name = "network::application_gateways::get",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn get(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<ApplicationGateway> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    let response = client.get(&path).await?;
    Ok(response.json::<ApplicationGateway>().await?)
}

pub async fn get_by_id(client: &NetworkClient, id: &str) -> NetworkResult<ApplicationGateway> {
    let id: ResourceId = id.parse()?;
    id.expect_type(COLLECTION)?;
    client.ensure_subscription(&id)?;
    get(client, &id.resource_group, &id.name).await
}

#[tracing::instrument(
    name = "network::application_gateways::list",
    skip(client),
    fields(resource_group = %resource_group)
)]
pub async fn list(client: &NetworkClient, resource_group: &str) -> NetworkResult<Vec<ApplicationGateway>> {
    let path = client.resource_collection_path(resource_group, COLLECTION)?;
    pager::collect_all(client, path).await
}

#[tracing::instrument(name = "network::application_gateways::list_all", skip(client))]
pub async fn list_all(client: &NetworkClient) -> NetworkResult<Vec<ApplicationGateway>> {
    pager::collect_all(client, client.subscription_collection_path(COLLECTION)).await
}

#[tracing::instrument(
    name = "network::application_gateways::delete",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn delete(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    lro::delete_and_wait(client, &path).await
}

/// Start a stopped gateway and wait until it is running.
#[tracing::instrument(
    name = "network::application_gateways::start",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn start(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    tracing::debug!("starting application gateway");
    lro::post_and_wait(client, &format!("{path}/start")).await
}

/// Stop a running gateway and wait until it is stopped. Billing stops with it.
#[tracing::instrument(
    name = "network::application_gateways::stop",
    skip(client),
    fields(resource_group = %resource_group, name = %name)
)]
pub async fn stop(client: &NetworkClient, resource_group: &str, name: &str) -> NetworkResult<()> {
    let path = client.resource_path(resource_group, COLLECTION, name)?;
    tracing::debug!("stopping application gateway");
    lro::post_and_wait(client, &format!("{path}/stop")).await
}
