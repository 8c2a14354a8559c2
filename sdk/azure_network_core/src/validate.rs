//! Argument checks shared by the request builders.
//!
//! All functions return [`NetworkError::Builder`] (for builder fields) or
//! [`NetworkError::InvalidArgument`] (for operation arguments) so that
//! invalid input is rejected before any request leaves the process.

use crate::error::{NetworkError, NetworkResult};
use std::net::IpAddr;

/// Characters that would change the request URL if spliced into a path segment.
const PATH_METACHARACTERS: [char; 4] = ['/', '?', '#', '%'];

/// Reject empty or whitespace-only operation arguments such as resource names,
/// and arguments carrying URL metacharacters.
pub fn require_arg(field: &str, value: &str) -> NetworkResult<()> {
    if value.trim().is_empty() {
        return Err(NetworkError::InvalidArgument(format!(
            "{field} cannot be empty"
        )));
    }
    if let Some(c) = value.chars().find(|c| PATH_METACHARACTERS.contains(c)) {
        return Err(NetworkError::InvalidArgument(format!(
            "{field} cannot contain '{c}'"
        )));
    }
    Ok(())
}

/// Take a required builder field, rejecting `None` and blank strings.
pub fn required(field: &str, value: Option<String>) -> NetworkResult<String> {
    let value = value.ok_or_else(|| NetworkError::Builder(format!("{field} is required")))?;
    if value.trim().is_empty() {
        return Err(NetworkError::Builder(format!("{field} cannot be empty")));
    }
    Ok(value)
}

/// Validate an address prefix in CIDR notation (`10.0.0.0/16`, `fd00::/8`).
pub fn cidr(field: &str, value: &str) -> NetworkResult<()> {
    let invalid = || NetworkError::Builder(format!("{field} '{value}' is not a valid CIDR prefix"));

    let (addr, len) = value.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let len: u8 = len.parse().map_err(|_| invalid())?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if len > max {
        return Err(invalid());
    }
    Ok(())
}

/// Validate an IP address literal.
pub fn ip_address(field: &str, value: &str) -> NetworkResult<()> {
    value
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| NetworkError::Builder(format!("{field} '{value}' is not a valid IP address")))
}

/// Validate a security-rule port specification: `*`, a single port, or `low-high`.
pub fn port_range(field: &str, value: &str) -> NetworkResult<()> {
    let invalid = || {
        NetworkError::Builder(format!(
            "{field} '{value}' must be '*', a port, or a range between 0 and 65535"
        ))
    };

    if value == "*" {
        return Ok(());
    }
    match value.split_once('-') {
        Some((low, high)) => {
            let low: u16 = low.trim().parse().map_err(|_| invalid())?;
            let high: u16 = high.trim().parse().map_err(|_| invalid())?;
            if low > high {
                return Err(invalid());
            }
        }
        None => {
            value.trim().parse::<u16>().map_err(|_| invalid())?;
        }
    }
    Ok(())
}

/// Validate a listener or probe port (1-65535).
pub fn port(field: &str, value: u16) -> NetworkResult<()> {
    if value == 0 {
        return Err(NetworkError::Builder(format!(
            "{field} must be between 1 and 65535"
        )));
    }
    Ok(())
}

/// Validate a public DNS label: 3-63 chars of `[a-z0-9-]`, starting with a
/// letter and not ending with a hyphen.
pub fn dns_label(value: &str) -> NetworkResult<()> {
    let invalid = |why: &str| {
        NetworkError::Builder(format!("domain_name_label '{value}' is invalid: {why}"))
    };

    if !(3..=63).contains(&value.len()) {
        return Err(invalid("must be 3 to 63 characters"));
    }
    if !value.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("must start with a lowercase letter"));
    }
    if value.ends_with('-') {
        return Err(invalid("must not end with a hyphen"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("only lowercase letters, digits and hyphens are allowed"));
    }
    Ok(())
}

/// Check that every name in `references` appears in `defined`.
pub fn references<'a>(
    what: &str,
    defined: impl IntoIterator<Item = &'a str> + Clone,
    references: impl IntoIterator<Item = &'a str>,
) -> NetworkResult<()> {
    for name in references {
        if !defined.clone().into_iter().any(|d| d == name) {
            return Err(NetworkError::Builder(format!(
                "{what} '{name}' is referenced but not defined"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_arg_rejects_blank_and_slashes() {
        assert!(require_arg("resource_group", "rg1").is_ok());
        assert!(matches!(
            require_arg("resource_group", "  "),
            Err(NetworkError::InvalidArgument(_))
        ));
        assert!(require_arg("name", "a/b").is_err());
    }

    #[test]
    fn require_arg_rejects_url_metacharacters() {
        for value in ["vnet1?api-version=2015-01-01", "vnet1#frag", "vnet1%2Fsubnets"] {
            let err = require_arg("name", value).unwrap_err();
            assert!(matches!(err, NetworkError::InvalidArgument(_)), "{value}");
        }
        let err = require_arg("name", "a?b").unwrap_err();
        assert!(err.to_string().contains("cannot contain '?'"));

        assert!(require_arg("name", "web-vnet_01.prod").is_ok());
    }

    #[test]
    fn required_reports_field_name() {
        let err = required("location", None).unwrap_err();
        assert!(err.to_string().contains("location is required"));

        let err = required("location", Some(String::new())).unwrap_err();
        assert!(err.to_string().contains("location cannot be empty"));

        assert_eq!(required("location", Some("westus".into())).unwrap(), "westus");
    }

    #[test]
    fn cidr_accepts_v4_and_v6() {
        assert!(cidr("address_prefix", "10.0.0.0/16").is_ok());
        assert!(cidr("address_prefix", "0.0.0.0/0").is_ok());
        assert!(cidr("address_prefix", "fd00::/8").is_ok());
    }

    #[test]
    fn cidr_rejects_bad_prefixes() {
        for bad in ["10.0.0.0", "10.0.0.0/33", "10.0.0/16", "fd00::/129", "x/8", "10.0.0.0/-1"] {
            assert!(cidr("address_prefix", bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn port_range_forms() {
        for ok in ["*", "80", "0", "65535", "1000-2000", "22-22"] {
            assert!(port_range("port", ok).is_ok(), "{ok} should pass");
        }
        for bad in ["", "65536", "2000-1000", "a-b", "80-", "-1"] {
            assert!(port_range("port", bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn dns_label_rules() {
        assert!(dns_label("my-app-01").is_ok());
        assert!(dns_label("ab").is_err());
        assert!(dns_label("1app").is_err());
        assert!(dns_label("App").is_err());
        assert!(dns_label("app-").is_err());
        assert!(dns_label("my_app").is_err());
        assert!(dns_label(&"a".repeat(64)).is_err());
    }

    #[test]
    fn references_must_be_defined() {
        let defined = ["fe1", "fe2"];
        assert!(references("frontend", defined.iter().copied(), ["fe1"]).is_ok());

        let err = references("frontend", defined.iter().copied(), ["fe3"]).unwrap_err();
        assert!(err.to_string().contains("frontend 'fe3'"));
    }

    #[test]
    fn ip_address_literal() {
        assert!(ip_address("ip", "10.0.0.4").is_ok());
        assert!(ip_address("ip", "10.0.0.256").is_err());
    }
}
