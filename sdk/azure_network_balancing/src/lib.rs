#![doc = include_str!("../README.md")]

pub mod application_gateway;
pub mod load_balancer;

/// Test utilities shared across modules.
#[cfg(test)]
pub(crate) mod test_utils {
    pub use azure_network_core::test_support::{
        network_path, setup_mock_client, TEST_SUBSCRIPTION_ID,
    };

    pub const TEST_LOCATION: &str = "westus";
    pub const TEST_RESOURCE_GROUP: &str = "rg1";

    /// Full ID of a network resource in the test subscription.
    pub fn network_id(resource_group: &str, rest: &str) -> String {
        format!("{}/{}", network_path(resource_group), rest)
    }
}
