//! # Azure Network Management
//!
//! Virtual networks, subnets, peerings, network interfaces, public IP
//! addresses, network security groups, route tables, and DNS name checks
//! for the Azure Network Management Rust SDK.
//!
//! Every operation is an async function taking a
//! [`NetworkClient`](azure_network_core::client::NetworkClient). Resources
//! are defined with a request builder and sent with `create_or_update`;
//! slow operations are polled to completion before the call returns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use azure_network_core::auth::NetworkCredential;
//! use azure_network_core::client::NetworkClient;
//! use azure_network_mgmt::virtual_network::{self, VirtualNetworkCreateRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NetworkClient::builder()
//!         .subscription_id("00000000-0000-0000-0000-000000000000")
//!         .credential(NetworkCredential::azure_cli()?)
//!         .build()?;
//!
//!     let request = VirtualNetworkCreateRequest::builder()
//!         .location("westus")
//!         .address_prefix("10.0.0.0/16")
//!         .subnet("frontend", "10.0.1.0/24")
//!         .build()?;
//!
//!     let vnet = virtual_network::create_or_update(&client, "rg1", "vnet1", &request).await?;
//!     println!("Created {}", vnet.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`virtual_network`] - Virtual networks
//! - [`subnet`] - Subnets of a virtual network
//! - [`peering`] - Virtual network peerings
//! - [`network_interface`] - Network interfaces (NICs)
//! - [`public_ip_address`] - Public IP addresses
//! - [`network_security_group`] - Network security groups and their rules
//! - [`route_table`] - Route tables and their routes
//! - [`dns`] - DNS name availability

pub mod dns;
pub mod models;
pub mod network_interface;
pub mod network_security_group;
pub mod peering;
pub mod public_ip_address;
pub mod route_table;
pub mod subnet;
pub mod virtual_network;

/// Test utilities shared across modules.
#[cfg(test)]
pub(crate) mod test_utils {
    pub use azure_network_core::test_support::{
        network_path, setup_mock_client, TEST_SUBSCRIPTION_ID, TEST_TOKEN,
    };

    /// Default test location.
    pub const TEST_LOCATION: &str = "westus";

    /// Default test resource group.
    pub const TEST_RESOURCE_GROUP: &str = "rg1";

    /// Full ID of a network resource in the test subscription.
    pub fn network_id(resource_group: &str, rest: &str) -> String {
        format!("{}/{}", network_path(resource_group), rest)
    }
}
