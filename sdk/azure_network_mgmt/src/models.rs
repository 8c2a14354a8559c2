//! Shared constants and enums for the network management modules.

pub use azure_network_core::models::{IpAllocationMethod, TransportProtocol};

/// API version for virtual network peerings, which the 2015 API does not know about.
pub const PEERING_API_VERSION: &str = "2016-06-01";
