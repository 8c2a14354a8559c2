//! Common types shared across all Azure Network Management crates.

use crate::error::{NetworkError, NetworkResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Resource provider namespace for all network resources.
pub const NETWORK_PROVIDER: &str = "Microsoft.Network";

/// Resource tags.
pub type Tags = HashMap<String, String>;

/// A reference to another resource by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

impl SubResource {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl From<&ResourceId> for SubResource {
    fn from(id: &ResourceId) -> Self {
        Self { id: id.to_string() }
    }
}

/// A top-level tracked resource as returned by the service.
///
/// `P` is the resource-specific `properties` bag. The same shape is accepted
/// by PUT, so a fetched resource can be modified and sent back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<P> {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: Tags,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default)]
    pub properties: P,
}

impl<P> Resource<P> {
    /// Parse this resource's `id`.
    pub fn resource_id(&self) -> NetworkResult<ResourceId> {
        self.id.parse()
    }
}

/// A child resource nested inside its parent (subnet, security rule,
/// frontend IP configuration, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildResource<P> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default)]
    pub properties: P,
}

impl<P> ChildResource<P> {
    /// A child definition identified by name only, as sent inside a parent PUT.
    pub fn new(name: impl Into<String>, properties: P) -> Self {
        Self {
            id: None,
            name: name.into(),
            etag: None,
            properties,
        }
    }
}

/// Provisioning state reported by the service for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Succeeded,
    Updating,
    Deleting,
    Failed,
    Canceled,
    Creating,
    #[serde(other)]
    Unknown,
}

impl ProvisioningState {
    /// Whether no further state transitions are expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// How a private or public IP address is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAllocationMethod {
    Static,
    Dynamic,
}

/// Transport protocol of a load balancing or NAT rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportProtocol {
    Tcp,
    Udp,
}

/// One page of a list operation.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,

    /// Absolute URL of the next page, absent on the last page.
    #[serde(rename = "nextLink")]
    pub next_link: Option<String>,
}

/// Body of a tags-only PATCH.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TagsUpdate {
    pub tags: Tags,
}

impl TagsUpdate {
    pub fn new(tags: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            tags: tags
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A parsed Azure Resource Manager resource ID.
///
/// ```text
/// /subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}[/{child_type}/{child_name}]...
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    pub resource_type: String,
    pub name: String,
    /// Nested `(type, name)` segments, outermost first.
    pub children: Vec<(String, String)>,
}

impl ResourceId {
    /// Build the ID of a top-level network resource.
    pub fn network(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            provider: NETWORK_PROVIDER.to_string(),
            resource_type: resource_type.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// The ID of a child resource of this resource.
    pub fn child(&self, child_type: impl Into<String>, child_name: impl Into<String>) -> Self {
        let mut id = self.clone();
        id.children.push((child_type.into(), child_name.into()));
        id
    }

    /// The name of the innermost resource.
    pub fn leaf_name(&self) -> &str {
        self.children
            .last()
            .map(|(_, name)| name.as_str())
            .unwrap_or(&self.name)
    }

    /// The type of the innermost resource, e.g. `virtualNetworks/subnets`.
    pub fn full_type(&self) -> String {
        let mut ty = format!("{}/{}", self.provider, self.resource_type);
        for (child_type, _) in &self.children {
            ty.push('/');
            ty.push_str(child_type);
        }
        ty
    }

    /// Check that this ID names a resource of `resource_type` (case-insensitive, top-level type only).
    pub fn expect_type(&self, resource_type: &str) -> NetworkResult<()> {
        if self.provider.eq_ignore_ascii_case(NETWORK_PROVIDER)
            && self.resource_type.eq_ignore_ascii_case(resource_type)
            && self.children.is_empty()
        {
            Ok(())
        } else {
            Err(NetworkError::InvalidResourceId {
                id: self.to_string(),
                reason: format!("expected a {NETWORK_PROVIDER}/{resource_type} resource"),
            })
        }
    }
}

impl FromStr for ResourceId {
    type Err = NetworkError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| NetworkError::InvalidResourceId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = id.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty path segment"));
        }
        if segments.len() < 8 || segments.len() % 2 != 0 {
            return Err(invalid("expected type/name pairs after the provider namespace"));
        }

        let keyword = |index: usize, expected: &str| {
            if segments[index].eq_ignore_ascii_case(expected) {
                Ok(())
            } else {
                Err(invalid(&format!("expected '{expected}' segment")))
            }
        };
        keyword(0, "subscriptions")?;
        keyword(2, "resourceGroups")?;
        keyword(4, "providers")?;

        let children = segments[8..]
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(Self {
            subscription_id: segments[1].to_string(),
            resource_group: segments[3].to_string(),
            provider: segments[5].to_string(),
            resource_type: segments[6].to_string(),
            name: segments[7].to_string(),
            children,
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.subscription_id, self.resource_group, self.provider, self.resource_type, self.name
        )?;
        for (child_type, child_name) in &self.children {
            write!(f, "/{child_type}/{child_name}")?;
        }
        Ok(())
    }
}
