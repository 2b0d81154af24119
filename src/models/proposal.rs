// Network Setup - Proposal Data Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Backend selection, routing defaults and system facts used by the
//! network proposal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{Error, Result};
use crate::sysconfig::KeyValueDocument;

/// Package providing the wicked service.
pub const WICKED_PACKAGE: &str = "wicked";

/// Package providing the NetworkManager service.
pub const NETWORK_MANAGER_PACKAGE: &str = "NetworkManager";

/// Service that applies the network configuration on the installed system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Wicked,
    NetworkManager,
    /// No network service at all.
    None,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wicked => "wicked",
            Self::NetworkManager => "network_manager",
            Self::None => "none",
        }
    }

    /// Package that has to be installed for this backend.
    pub fn package(&self) -> Option<&'static str> {
        match self {
            Self::Wicked => Some(WICKED_PACKAGE),
            Self::NetworkManager => Some(NETWORK_MANAGER_PACKAGE),
            Self::None => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "wicked" => Ok(Self::Wicked),
            "network_manager" | "networkmanager" => Ok(Self::NetworkManager),
            "none" => Ok(Self::None),
            _ => Err(Error::ValidationFailed(format!("Unknown backend: {}", s))),
        }
    }
}

/// Hardware and platform facts that influence the proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFacts {
    pub is_laptop: bool,
    pub is_s390: bool,
    pub is_xen_dom0: bool,
}

/// IP forwarding settings (`/etc/sysconfig/sysctl`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub forward_ipv4: bool,
    pub forward_ipv6: bool,
}

impl RoutingConfig {
    const IPV4_KEY: &'static str = "IP_FORWARD";
    const IPV6_KEY: &'static str = "IPV6_FORWARD";

    /// Read the forwarding flags from a sysctl sysconfig document.
    pub fn from_document(document: &KeyValueDocument) -> Self {
        Self {
            forward_ipv4: document.get(Self::IPV4_KEY) == Some("yes"),
            forward_ipv6: document.get(Self::IPV6_KEY) == Some("yes"),
        }
    }

    /// Write the forwarding flags into `document`, keeping everything else.
    pub fn apply_to(&self, document: &mut KeyValueDocument) -> Result<()> {
        document.set(Self::IPV4_KEY, yes_no(self.forward_ipv4))?;
        document.set(Self::IPV6_KEY, yes_no(self.forward_ipv6))
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
