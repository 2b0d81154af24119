// Network Setup - Interface Configuration Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Interface types, boot protocols, start modes and the persisted
//! per-device configuration record (`ifcfg-<device>`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use super::error::{Error, Result};
use crate::sysconfig::KeyValueDocument;

/// Sysconfig keys written by this tool.
pub mod keys {
    pub const BOOTPROTO: &str = "BOOTPROTO";
    pub const STARTMODE: &str = "STARTMODE";
    pub const IFPLUGD_PRIORITY: &str = "IFPLUGD_PRIORITY";
    pub const IPADDR: &str = "IPADDR";
    pub const PREFIXLEN: &str = "PREFIXLEN";
    pub const NETMASK: &str = "NETMASK";
    pub const REMOTE_IPADDR: &str = "REMOTE_IPADDR";
    pub const MTU: &str = "MTU";
    pub const NAME: &str = "NAME";
    pub const ETHTOOL_OPTIONS: &str = "ETHTOOL_OPTIONS";
    pub const ZONE: &str = "ZONE";
    pub const DHCLIENT_SET_DEFAULT_ROUTE: &str = "DHCLIENT_SET_DEFAULT_ROUTE";
    pub const HOSTNAME: &str = "HOSTNAME";
    pub const ETHERDEVICE: &str = "ETHERDEVICE";
    pub const VLAN_ID: &str = "VLAN_ID";
    pub const BRIDGE: &str = "BRIDGE";
    pub const BRIDGE_PORTS: &str = "BRIDGE_PORTS";
    pub const BONDING_MASTER: &str = "BONDING_MASTER";
    pub const BONDING_MODULE_OPTS: &str = "BONDING_MODULE_OPTS";
    pub const BONDING_SLAVE: &str = "BONDING_SLAVE_";
    pub const TUNNEL: &str = "TUNNEL";
    pub const WIRELESS_MODE: &str = "WIRELESS_MODE";
    pub const WIRELESS_ESSID: &str = "WIRELESS_ESSID";
    pub const INTERFACETYPE: &str = "INTERFACETYPE";
}

/// Type of network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    Ethernet,
    Wireless,
    Bond,
    Bridge,
    Vlan,
    Tun,
    Tap,
    Dummy,
    Infiniband,
    Qeth,
    Loopback,
}

impl InterfaceType {
    /// All known interface types.
    pub const ALL: [InterfaceType; 11] = [
        Self::Ethernet,
        Self::Wireless,
        Self::Bond,
        Self::Bridge,
        Self::Vlan,
        Self::Tun,
        Self::Tap,
        Self::Dummy,
        Self::Infiniband,
        Self::Qeth,
        Self::Loopback,
    ];

    /// Short name, also used as the device name prefix.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Ethernet => "eth",
            Self::Wireless => "wlan",
            Self::Bond => "bond",
            Self::Bridge => "br",
            Self::Vlan => "vlan",
            Self::Tun => "tun",
            Self::Tap => "tap",
            Self::Dummy => "dummy",
            Self::Infiniband => "ib",
            Self::Qeth => "qeth",
            Self::Loopback => "lo",
        }
    }

    /// Resolve a type from its short name.
    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.short_name() == name)
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ethernet => "Ethernet",
            Self::Wireless => "Wireless",
            Self::Bond => "Bond",
            Self::Bridge => "Bridge",
            Self::Vlan => "VLAN",
            Self::Tun => "TUN",
            Self::Tap => "TAP",
            Self::Dummy => "Dummy",
            Self::Infiniband => "InfiniBand",
            Self::Qeth => "QETH",
            Self::Loopback => "Loopback",
        }
    }

    /// Whether the interface is backed by hardware whose kernel driver can
    /// be chosen by the user.
    pub fn supports_custom_driver(&self) -> bool {
        matches!(
            self,
            Self::Ethernet | Self::Wireless | Self::Infiniband | Self::Qeth
        )
    }

    /// Whether the interface type can obtain addresses via DHCP.
    pub fn supports_dhcp(&self) -> bool {
        !matches!(self, Self::Dummy | Self::Loopback)
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for InterfaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_short_name(s).ok_or_else(|| Error::UnknownInterfaceType(s.to_string()))
    }
}

/// Method by which an interface obtains its IP configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BootProtocol {
    #[default]
    Static,
    Dhcp,
    Dhcp4,
    Dhcp6,
    DhcpAutoip,
    Autoip,
    Ibft,
    None,
}

impl BootProtocol {
    /// Name as written in sysconfig.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dhcp => "dhcp",
            Self::Dhcp4 => "dhcp4",
            Self::Dhcp6 => "dhcp6",
            Self::DhcpAutoip => "dhcp+autoip",
            Self::Autoip => "autoip",
            Self::Ibft => "ibft",
            Self::None => "none",
        }
    }

    pub fn is_dhcp(&self) -> bool {
        matches!(self, Self::Dhcp | Self::Dhcp4 | Self::Dhcp6 | Self::DhcpAutoip)
    }
}

impl FromStr for BootProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let proto = match s {
            "static" | "" => Self::Static,
            "dhcp" => Self::Dhcp,
            "dhcp4" => Self::Dhcp4,
            "dhcp6" => Self::Dhcp6,
            "dhcp+autoip" => Self::DhcpAutoip,
            "autoip" => Self::Autoip,
            "ibft" => Self::Ibft,
            "none" => Self::None,
            other => {
                return Err(Error::ValidationFailed(format!(
                    "Unknown boot protocol: {}",
                    other
                )))
            }
        };
        Ok(proto)
    }
}

impl fmt::Display for BootProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy controlling when an interface is brought up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StartMode {
    Auto,
    Hotplug,
    /// Brought up on cable link; higher priority wins among ifplugd devices.
    Ifplugd { priority: u32 },
    #[default]
    Manual,
    Nfsroot,
    Off,
}

impl StartMode {
    /// Name as written in sysconfig.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Hotplug => "hotplug",
            Self::Ifplugd { .. } => "ifplugd",
            Self::Manual => "manual",
            Self::Nfsroot => "nfsroot",
            Self::Off => "off",
        }
    }

    /// Create a start mode from its sysconfig name.
    pub fn create(name: &str) -> Result<Self> {
        let mode = match name {
            "auto" | "boot" | "onboot" | "on" => Self::Auto,
            "hotplug" => Self::Hotplug,
            "ifplugd" => Self::Ifplugd { priority: 0 },
            "manual" => Self::Manual,
            "nfsroot" => Self::Nfsroot,
            "off" => Self::Off,
            other => {
                return Err(Error::ValidationFailed(format!(
                    "Unknown start mode: {}",
                    other
                )))
            }
        };
        Ok(mode)
    }

    /// Ifplugd priority, zero for every other mode.
    pub fn priority(&self) -> u32 {
        match self {
            Self::Ifplugd { priority } => *priority,
            _ => 0,
        }
    }
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Additional IP address of an interface (`IPADDR_<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAlias {
    /// Suffix used in the sysconfig keys, e.g. `_1`.
    pub id: String,
    /// Optional alias label (`LABEL_<id>`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub address: IpAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<u8>,
}

/// Persisted configuration record of a single device.
///
/// The record is the parsed `ifcfg-<device>` file; typed accessors read and
/// write the well-known keys, everything else passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    name: String,
    document: KeyValueDocument,
}

impl InterfaceConfig {
    /// Create an empty record for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_document(name, KeyValueDocument::new())
    }

    /// Wrap an already loaded document.
    pub fn from_document(name: impl Into<String>, document: KeyValueDocument) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document(&self) -> &KeyValueDocument {
        &self.document
    }

    /// Raw value of a sysconfig field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.document.get(key)
    }

    /// Set a sysconfig field.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        self.document.set(key, value)
    }

    /// Drop a sysconfig field.
    pub fn remove_field(&mut self, key: &str) -> bool {
        self.document.remove(key)
    }

    pub fn boot_protocol(&self) -> Result<BootProtocol> {
        self.field(keys::BOOTPROTO).unwrap_or("static").parse()
    }

    pub fn set_boot_protocol(&mut self, proto: BootProtocol) -> Result<()> {
        self.set_field(keys::BOOTPROTO, proto.as_str())
    }

    /// Start mode, with the ifplugd priority folded in.
    pub fn start_mode(&self) -> Result<StartMode> {
        let mode = StartMode::create(self.field(keys::STARTMODE).unwrap_or("manual"))?;
        Ok(match mode {
            StartMode::Ifplugd { .. } => StartMode::Ifplugd {
                priority: self
                    .field(keys::IFPLUGD_PRIORITY)
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(0),
            },
            other => other,
        })
    }

    pub fn set_start_mode(&mut self, mode: StartMode) -> Result<()> {
        self.set_field(keys::STARTMODE, mode.as_str())?;
        match mode {
            StartMode::Ifplugd { priority } => {
                self.set_field(keys::IFPLUGD_PRIORITY, &priority.to_string())?
            }
            _ => {
                self.remove_field(keys::IFPLUGD_PRIORITY);
            }
        }
        Ok(())
    }

    /// Whether DHCP may install a default route through this device.
    pub fn default_route(&self) -> Option<bool> {
        self.field(keys::DHCLIENT_SET_DEFAULT_ROUTE).map(|v| v == "yes")
    }

    pub fn set_default_route(&mut self, enabled: bool) -> Result<()> {
        self.set_field(
            keys::DHCLIENT_SET_DEFAULT_ROUTE,
            if enabled { "yes" } else { "no" },
        )
    }
}
