// Network Setup - Validation Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Input validation for interface names, addresses and numeric settings.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use super::error::{Error, Result};

/// Characters allowed in sysconfig interface names (max 15, kernel IFNAMSIZ - 1).
static INTERFACE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[[:alnum:]._:-]{1,15}$").expect("static interface name regex is valid")
});

/// Check whether `name` is usable as an interface name.
pub fn is_valid_interface_name(name: &str) -> bool {
    INTERFACE_NAME_RE.is_match(name)
}

/// Validate an interface name.
pub fn validate_interface_name(name: &str) -> Result<&str> {
    if is_valid_interface_name(name) {
        Ok(name)
    } else {
        Err(Error::InvalidInterfaceName(name.to_string()))
    }
}

/// Validate an IP address string (v4 or v6).
pub fn validate_ip(s: &str) -> Result<IpAddr> {
    IpAddr::from_str(s).map_err(|_| Error::InvalidIpAddress(s.to_string()))
}

/// Check that `prefix` fits the address family of `ip`.
pub fn validate_prefix(ip: &IpAddr, prefix: u8) -> Result<u8> {
    let max_prefix = if ip.is_ipv4() { 32 } else { 128 };
    if prefix > max_prefix {
        return Err(Error::InvalidIpAddress(format!(
            "Prefix {} exceeds maximum {} for address type",
            prefix, max_prefix
        )));
    }
    Ok(prefix)
}

/// Convert a dotted IPv4 netmask to a prefix length.
///
/// Rejects masks with non-contiguous bits such as `255.0.255.0`.
pub fn netmask_to_prefix(mask: &str) -> Result<u8> {
    let mask: Ipv4Addr = mask
        .parse()
        .map_err(|_| Error::InvalidIpAddress(format!("Invalid netmask: {}", mask)))?;
    let bits = u32::from(mask);
    let prefix = bits.leading_ones();
    if bits.checked_shl(prefix).unwrap_or(0) != 0 {
        return Err(Error::InvalidIpAddress(format!("Invalid netmask: {}", mask)));
    }
    Ok(prefix as u8)
}

/// Validate an MTU value.
pub fn validate_mtu(mtu: u32) -> Result<u32> {
    // Standard Ethernet MTU range
    if !(68..=65535).contains(&mtu) {
        return Err(Error::ValidationFailed(format!(
            "MTU must be between 68 and 65535: {}",
            mtu
        )));
    }
    Ok(mtu)
}

/// Validate a VLAN ID.
pub fn validate_vlan_id(id: u16) -> Result<u16> {
    if id == 0 || id > 4094 {
        return Err(Error::ValidationFailed(format!(
            "VLAN ID must be 1-4094: {}",
            id
        )));
    }
    Ok(id)
}

/// Validate a hostname.
pub fn validate_hostname(s: &str) -> Result<String> {
    if s.is_empty() || s.len() > 253 {
        return Err(Error::ValidationFailed(format!(
            "Hostname must be 1-253 characters: {}",
            s
        )));
    }

    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(Error::ValidationFailed(format!(
                "Label must be 1-63 characters: {}",
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::ValidationFailed(format!(
                "Invalid characters in label: {}",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::ValidationFailed(format!(
                "Label cannot start or end with hyphen: {}",
                label
            )));
        }
    }

    Ok(s.to_lowercase())
}
