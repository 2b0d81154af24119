// Network Setup - Adapter Information
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Detected network adapter types.

use serde::{Deserialize, Serialize};

use super::interface::InterfaceType;

/// Type of network adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    /// Wired Ethernet adapter.
    Ethernet,
    /// Wireless (WiFi) adapter.
    Wifi,
    /// InfiniBand adapter.
    Infiniband,
    /// Virtual adapter (bridges, VLANs, etc.).
    Virtual,
    /// Loopback interface.
    Loopback,
    /// Unknown or other type.
    Other,
}

impl AdapterType {
    /// Whether this is a physical network card.
    pub fn is_physical(&self) -> bool {
        matches!(self, Self::Ethernet | Self::Wifi | Self::Infiniband)
    }

    /// Interface type used when configuring the adapter.
    pub fn interface_type(&self) -> Option<InterfaceType> {
        match self {
            Self::Ethernet => Some(InterfaceType::Ethernet),
            Self::Wifi => Some(InterfaceType::Wireless),
            Self::Infiniband => Some(InterfaceType::Infiniband),
            Self::Loopback => Some(InterfaceType::Loopback),
            Self::Virtual | Self::Other => None,
        }
    }

    /// Get human-readable name for this adapter type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ethernet => "Ethernet",
            Self::Wifi => "Wi-Fi",
            Self::Infiniband => "InfiniBand",
            Self::Virtual => "Virtual",
            Self::Loopback => "Loopback",
            Self::Other => "Network",
        }
    }
}

/// Information about a detected network adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Interface name (e.g., "eth0", "wlan0", "enp3s0").
    pub name: String,
    /// Type of adapter.
    pub adapter_type: AdapterType,
    /// Hardware MAC address (if available).
    pub mac_address: Option<String>,
    /// Kernel driver bound to the device.
    pub driver: Option<String>,
    /// Whether the physical link reports a carrier.
    pub has_carrier: bool,
}

impl AdapterInfo {
    /// Create a new AdapterInfo.
    pub fn new(name: impl Into<String>, adapter_type: AdapterType) -> Self {
        Self {
            name: name.into(),
            adapter_type,
            mac_address: None,
            driver: None,
            has_carrier: false,
        }
    }

    /// Get a display label for the adapter.
    pub fn display_label(&self) -> String {
        if let Some(driver) = &self.driver {
            format!("{} ({})", self.name, driver)
        } else {
            format!("{} - {}", self.name, self.adapter_type.display_name())
        }
    }
}
