#![doc = include_str!("../README.md")]

pub mod auth;
pub mod client;
pub mod error;
pub mod lro;
pub mod models;
pub mod pager;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::NetworkClient;
pub use error::{NetworkError, NetworkResult};
