// Network Setup - Interface Configuration Builder
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Editing of interface configuration records.
//!
//! [`InterfaceConfigBuilder`] wraps one record and offers normalized setters
//! for the settings a user edits: boot protocol, start mode, addresses and
//! aliases, MTU and the type-specific bridge/bond/VLAN settings. Nothing is
//! written until [`InterfaceConfigBuilder::save`] is called with a store.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::{debug, info};

use crate::models::validation::{
    is_valid_interface_name, netmask_to_prefix, validate_hostname, validate_interface_name,
    validate_ip, validate_mtu, validate_prefix, validate_vlan_id,
};
use crate::models::{
    keys, BootProtocol, Error, InterfaceConfig, InterfaceType, IpAlias, Result, StartMode,
};
use crate::storage::InterfaceStore;
use crate::sysconfig::KeyValueDocument;

/// Number of names offered for a new device.
pub const NEW_DEVICES_COUNT: usize = 10;

/// Key holding the kernel driver chosen for a device.
pub const DRIVER_KEY: &str = "DRIVER";

const DEFAULT_BOND_OPTIONS: &str = "mode=active-backup miimon=100";

static PREFIX_LENGTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}$").expect("static prefix regex is valid"));

static NUMERIC_ALIAS_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_(\d+)$").expect("static alias id regex is valid"));

/// Alias as edited by the user. Empty `id` means a new alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub id: String,
    pub label: String,
    pub ip_address: String,
    /// `/24`, `24`, a netmask, or empty.
    pub subnet_prefix: String,
}

impl AliasEntry {
    pub fn new(ip_address: &str, subnet_prefix: &str) -> Self {
        Self {
            ip_address: ip_address.to_string(),
            subnet_prefix: subnet_prefix.to_string(),
            ..Default::default()
        }
    }
}

/// Builder for a single interface configuration.
#[derive(Debug, Clone)]
pub struct InterfaceConfigBuilder {
    interface_type: InterfaceType,
    name: String,
    config: InterfaceConfig,
    newly_added: bool,
    aliases: Vec<AliasEntry>,
    aliases_modified: bool,
}

impl InterfaceConfigBuilder {
    /// Builder for `interface_type`, editing `existing` or a fresh record
    /// with the type's defaults.
    pub fn for_type(interface_type: InterfaceType, existing: Option<InterfaceConfig>) -> Result<Self> {
        let newly_added = existing.is_none();
        let mut config = existing.unwrap_or_else(|| InterfaceConfig::new(""));
        if newly_added {
            apply_type_defaults(interface_type, &mut config)?;
        }

        let aliases = read_aliases(&config);
        Ok(Self {
            interface_type,
            name: config.name().to_string(),
            config,
            newly_added,
            aliases,
            aliases_modified: false,
        })
    }

    /// Builder for a type given by its short name (`eth`, `br`, ...).
    pub fn for_short_name(short_name: &str, existing: Option<InterfaceConfig>) -> Result<Self> {
        Self::for_type(short_name.parse()?, existing)
    }

    pub fn interface_type(&self) -> InterfaceType {
        self.interface_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the device name. For an existing record the old one is removed
    /// on save.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Current content of the record, saved or not.
    pub fn document(&self) -> &KeyValueDocument {
        self.config.document()
    }

    pub fn is_newly_added(&self) -> bool {
        self.newly_added
    }

    /// Whether the device name changed since the record was loaded.
    pub fn is_renamed(&self) -> bool {
        !self.newly_added && self.name != self.config.name()
    }

    /// Free device names for this type, lowest first.
    pub fn proposed_names<S: InterfaceStore + ?Sized>(&self, store: &S) -> Result<Vec<String>> {
        store.free_names(self.interface_type.short_name(), NEW_DEVICES_COUNT)
    }

    /// Whether `name` is usable as a device name.
    pub fn valid_name(name: &str) -> bool {
        is_valid_interface_name(name)
    }

    /// Whether a record named `name` already exists.
    pub fn name_exists<S: InterfaceStore + ?Sized>(store: &S, name: &str) -> Result<bool> {
        Ok(store.known_names()?.iter().any(|known| known == name))
    }

    pub fn boot_protocol(&self) -> Result<BootProtocol> {
        self.config.boot_protocol()
    }

    pub fn set_boot_protocol(&mut self, proto: BootProtocol) -> Result<()> {
        self.config.set_boot_protocol(proto)
    }

    pub fn start_mode(&self) -> Result<StartMode> {
        self.config.start_mode()
    }

    /// Set the start mode. Selecting the mode already in place keeps it
    /// as is, including its ifplugd priority.
    pub fn set_start_mode(&mut self, mode: StartMode) -> Result<()> {
        if self.config.field(keys::STARTMODE) == Some(mode.as_str()) {
            return Ok(());
        }
        self.config.set_start_mode(mode)
    }

    /// Ifplugd priority, zero unless the start mode is ifplugd.
    pub fn ifplugd_priority(&self) -> u32 {
        self.start_mode().map(|mode| mode.priority()).unwrap_or(0)
    }

    /// Set the ifplugd priority, switching the start mode to ifplugd.
    pub fn set_ifplugd_priority(&mut self, priority: u32) -> Result<()> {
        if self.config.field(keys::STARTMODE) != Some("ifplugd") {
            info!("Priority set for {} but start mode is not ifplugd, adapting", self.name);
        }
        self.config.set_start_mode(StartMode::Ifplugd { priority })
    }

    /// Main address without its prefix, empty when unset.
    pub fn ip_address(&self) -> String {
        self.address().map(|ip| ip.to_string()).unwrap_or_default()
    }

    /// Set the main address. An empty value drops the whole address
    /// configuration including prefix and remote address.
    pub fn set_ip_address(&mut self, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            for key in [keys::IPADDR, keys::PREFIXLEN, keys::NETMASK, keys::REMOTE_IPADDR] {
                self.config.remove_field(key);
            }
            return Ok(());
        }

        let ip = validate_ip(value)?;
        let prefix = self.prefix();
        if let Some(prefix) = prefix {
            validate_prefix(&ip, prefix)?;
        }
        self.write_address(Some(ip), prefix)
    }

    /// Prefix of the main address as `/N`, empty when unset.
    pub fn subnet_prefix(&self) -> String {
        self.prefix().map(|p| format!("/{}", p)).unwrap_or_default()
    }

    /// Set the prefix from `/N`, `N` or a dotted netmask. The result is
    /// always stored as a prefix length.
    pub fn set_subnet_prefix(&mut self, value: &str) -> Result<()> {
        let prefix = parse_prefix(value)?;
        let address = self.address();
        if let (Some(ip), Some(prefix)) = (address, prefix) {
            validate_prefix(&ip, prefix)?;
        }
        self.write_address(address, prefix)
    }

    pub fn remote_ip(&self) -> String {
        self.config.field(keys::REMOTE_IPADDR).unwrap_or_default().to_string()
    }

    pub fn set_remote_ip(&mut self, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            self.config.remove_field(keys::REMOTE_IPADDR);
            return Ok(());
        }
        let ip = validate_ip(value)?;
        self.config.set_field(keys::REMOTE_IPADDR, &ip.to_string())
    }

    pub fn hostname(&self) -> String {
        self.config.field(keys::HOSTNAME).unwrap_or_default().to_string()
    }

    pub fn set_hostname(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            self.config.remove_field(keys::HOSTNAME);
            return Ok(());
        }
        let hostname = validate_hostname(value)?;
        self.config.set_field(keys::HOSTNAME, &hostname)
    }

    /// MTU, or `None` for the kernel default.
    pub fn mtu(&self) -> Option<u32> {
        self.config.field(keys::MTU).and_then(|v| v.parse().ok()).filter(|&mtu| mtu > 0)
    }

    /// Set the MTU; zero restores the kernel default.
    pub fn set_mtu(&mut self, mtu: u32) -> Result<()> {
        if mtu == 0 {
            self.config.remove_field(keys::MTU);
            return Ok(());
        }
        self.config.set_field(keys::MTU, &validate_mtu(mtu)?.to_string())
    }

    pub fn description(&self) -> &str {
        self.config.field(keys::NAME).unwrap_or_default()
    }

    pub fn set_description(&mut self, description: &str) -> Result<()> {
        self.config.set_field(keys::NAME, description)
    }

    pub fn ethtool_options(&self) -> &str {
        self.config.field(keys::ETHTOOL_OPTIONS).unwrap_or_default()
    }

    pub fn set_ethtool_options(&mut self, options: &str) -> Result<()> {
        self.config.set_field(keys::ETHTOOL_OPTIONS, options)
    }

    pub fn firewall_zone(&self) -> &str {
        self.config.field(keys::ZONE).unwrap_or_default()
    }

    pub fn set_firewall_zone(&mut self, zone: &str) -> Result<()> {
        self.config.set_field(keys::ZONE, zone)
    }

    /// Custom kernel driver, `None` when chosen automatically.
    pub fn driver(&self) -> Option<&str> {
        self.config.field(DRIVER_KEY).filter(|d| !d.is_empty())
    }

    /// Pin the kernel driver, or return to automatic selection with `None`.
    pub fn set_driver(&mut self, driver: Option<&str>) -> Result<()> {
        if !self.interface_type.supports_custom_driver() {
            return Err(Error::ValidationFailed(format!(
                "{} interfaces have no selectable driver",
                self.interface_type.display_name()
            )));
        }
        match driver {
            Some(driver) if !driver.is_empty() => self.config.set_field(DRIVER_KEY, driver),
            _ => {
                self.config.remove_field(DRIVER_KEY);
                Ok(())
            }
        }
    }

    pub fn aliases(&self) -> &[AliasEntry] {
        &self.aliases
    }

    pub fn set_aliases(&mut self, aliases: Vec<AliasEntry>) {
        self.aliases = aliases;
        self.aliases_modified = true;
    }

    /// Turn the aliases into address records, giving every alias without
    /// an id the lowest free numeric id above the last one allocated.
    pub fn aliases_to_ip_configs(&self) -> Result<Vec<IpAlias>> {
        let used_ids: Vec<u32> = self
            .aliases
            .iter()
            .filter_map(|alias| NUMERIC_ALIAS_ID_RE.captures(&alias.id))
            .filter_map(|caps| caps[1].parse().ok())
            .collect();

        let mut last_id = 0;
        self.aliases
            .iter()
            .map(|alias| {
                let address = validate_ip(alias.ip_address.trim())?;
                let prefix = parse_prefix(&alias.subnet_prefix)?;
                if let Some(prefix) = prefix {
                    validate_prefix(&address, prefix)?;
                }
                let id = if alias.id.is_empty() {
                    last_id = find_free_alias_id(&used_ids, last_id);
                    format!("_{}", last_id)
                } else {
                    alias.id.clone()
                };
                Ok(IpAlias {
                    id,
                    label: alias.label.clone(),
                    address,
                    prefix,
                })
            })
            .collect()
    }

    /// Strip the addressing so the device can be enslaved to a bridge or
    /// bond.
    pub fn configure_as_port(&mut self) -> Result<()> {
        self.set_boot_protocol(BootProtocol::None)?;
        self.set_aliases(Vec::new());
        self.set_ip_address("")?;
        self.set_subnet_prefix("")?;
        self.set_remote_ip("")
    }

    /// Devices enslaved to this bridge or bond.
    pub fn ports(&self) -> Vec<String> {
        match self.interface_type {
            InterfaceType::Bridge => self
                .config
                .field(keys::BRIDGE_PORTS)
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            InterfaceType::Bond => self
                .config
                .document()
                .attributes()
                .into_iter()
                .filter(|(key, _)| key.starts_with(keys::BONDING_SLAVE))
                .map(|(_, value)| value)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_ports(&mut self, ports: &[String]) -> Result<()> {
        for port in ports {
            validate_interface_name(port)?;
        }
        match self.interface_type {
            InterfaceType::Bridge => self.config.set_field(keys::BRIDGE_PORTS, &ports.join(" ")),
            InterfaceType::Bond => {
                let old: Vec<String> = self
                    .config
                    .document()
                    .pairs()
                    .map(|pair| pair.key().to_string())
                    .filter(|key| key.starts_with(keys::BONDING_SLAVE))
                    .collect();
                for key in old {
                    self.config.remove_field(&key);
                }
                for (idx, port) in ports.iter().enumerate() {
                    self.config
                        .set_field(&format!("{}{}", keys::BONDING_SLAVE, idx), port)?;
                }
                Ok(())
            }
            other => Err(Error::ValidationFailed(format!(
                "{} interfaces have no ports",
                other.display_name()
            ))),
        }
    }

    pub fn set_bond_options(&mut self, options: &str) -> Result<()> {
        self.require_type(InterfaceType::Bond)?;
        self.config.set_field(keys::BONDING_MODULE_OPTS, options)
    }

    /// Parent device and tag of a VLAN.
    pub fn vlan(&self) -> Option<(String, u16)> {
        let parent = self.config.field(keys::ETHERDEVICE)?;
        let id = self.config.field(keys::VLAN_ID)?.parse().ok()?;
        Some((parent.to_string(), id))
    }

    pub fn set_vlan(&mut self, parent: &str, id: u16) -> Result<()> {
        self.require_type(InterfaceType::Vlan)?;
        validate_interface_name(parent)?;
        validate_vlan_id(id)?;
        self.config.set_field(keys::ETHERDEVICE, parent)?;
        self.config.set_field(keys::VLAN_ID, &id.to_string())
    }

    pub fn set_essid(&mut self, essid: &str) -> Result<()> {
        self.require_type(InterfaceType::Wireless)?;
        self.config.set_field(keys::WIRELESS_ESSID, essid)
    }

    /// Whether the boot protocol needs a static address.
    pub fn requires_ip_config(&self) -> bool {
        matches!(self.boot_protocol(), Ok(BootProtocol::Static))
    }

    /// Persist the record under the current name. A renamed record loses
    /// its old file.
    pub fn save<S: InterfaceStore + ?Sized>(&mut self, store: &mut S) -> Result<InterfaceConfig> {
        validate_interface_name(&self.name)?;

        if self.newly_added || self.is_renamed() {
            // Refuses names that already have a record
            store.create(&self.name)?;
        }
        if self.aliases_modified {
            self.write_aliases()?;
        }

        let config = InterfaceConfig::from_document(self.name.clone(), self.config.document().clone());
        store.save(&config)?;

        if self.is_renamed() {
            let old_name = self.config.name().to_string();
            store.delete(&old_name)?;
            info!("Renamed {} to {}", old_name, self.name);
        }

        self.config = config.clone();
        self.newly_added = false;
        self.aliases_modified = false;
        Ok(config)
    }

    fn require_type(&self, expected: InterfaceType) -> Result<()> {
        if self.interface_type == expected {
            Ok(())
        } else {
            Err(Error::ValidationFailed(format!(
                "{} is not a {} interface",
                self.name,
                expected.display_name()
            )))
        }
    }

    fn address(&self) -> Option<IpAddr> {
        let value = self.config.field(keys::IPADDR)?;
        let addr = value.split('/').next().unwrap_or(value);
        addr.parse().ok()
    }

    fn prefix(&self) -> Option<u8> {
        if let Some((_, prefix)) = self.config.field(keys::IPADDR).and_then(|v| v.split_once('/')) {
            return prefix.parse().ok();
        }
        if let Some(prefix) = self.config.field(keys::PREFIXLEN).filter(|p| !p.is_empty()) {
            return prefix.parse().ok();
        }
        self.config
            .field(keys::NETMASK)
            .and_then(|mask| netmask_to_prefix(mask).ok())
    }

    /// Store the main address as `IPADDR=addr/prefix`. Without an address
    /// the prefix is kept in `PREFIXLEN`.
    fn write_address(&mut self, address: Option<IpAddr>, prefix: Option<u8>) -> Result<()> {
        self.config.remove_field(keys::NETMASK);
        match address {
            Some(ip) => {
                let value = match prefix {
                    Some(prefix) => format!("{}/{}", ip, prefix),
                    None => ip.to_string(),
                };
                self.config.remove_field(keys::PREFIXLEN);
                self.config.set_field(keys::IPADDR, &value)
            }
            None => {
                self.config.remove_field(keys::IPADDR);
                match prefix {
                    Some(prefix) => self.config.set_field(keys::PREFIXLEN, &prefix.to_string()),
                    None => {
                        self.config.remove_field(keys::PREFIXLEN);
                        Ok(())
                    }
                }
            }
        }
    }

    fn write_aliases(&mut self) -> Result<()> {
        let aliases = self.aliases_to_ip_configs()?;

        for old in read_aliases(&self.config) {
            if aliases.iter().all(|alias| alias.id != old.id) {
                for key in ["IPADDR", "LABEL", "PREFIXLEN", "NETMASK"] {
                    self.config.remove_field(&format!("{}{}", key, old.id));
                }
            }
        }

        for alias in &aliases {
            let address = match alias.prefix {
                Some(prefix) => format!("{}/{}", alias.address, prefix),
                None => alias.address.to_string(),
            };
            self.config.set_field(&format!("IPADDR{}", alias.id), &address)?;
            self.config.remove_field(&format!("PREFIXLEN{}", alias.id));
            self.config.remove_field(&format!("NETMASK{}", alias.id));
            let label_key = format!("LABEL{}", alias.id);
            if alias.label.is_empty() {
                self.config.remove_field(&label_key);
            } else {
                self.config.set_field(&label_key, &alias.label)?;
            }
        }

        // Aliases are edited as a whole, keep the list in its stored form
        self.aliases = read_aliases(&self.config);
        debug!("Wrote {} alias(es) for {}", aliases.len(), self.name);
        Ok(())
    }
}

/// Fill a fresh record with the defaults of `interface_type`.
fn apply_type_defaults(interface_type: InterfaceType, config: &mut InterfaceConfig) -> Result<()> {
    let proto = if interface_type.supports_dhcp() {
        BootProtocol::Dhcp
    } else {
        BootProtocol::Static
    };
    config.set_boot_protocol(proto)?;
    config.set_start_mode(StartMode::Auto)?;

    match interface_type {
        InterfaceType::Bridge => {
            config.set_field(keys::BRIDGE, "yes")?;
            config.set_field(keys::BRIDGE_PORTS, "")
        }
        InterfaceType::Bond => {
            config.set_field(keys::BONDING_MASTER, "yes")?;
            config.set_field(keys::BONDING_MODULE_OPTS, DEFAULT_BOND_OPTIONS)
        }
        InterfaceType::Tun | InterfaceType::Tap => {
            config.set_field(keys::TUNNEL, interface_type.short_name())
        }
        InterfaceType::Dummy => config.set_field(keys::INTERFACETYPE, "dummy"),
        InterfaceType::Wireless => config.set_field(keys::WIRELESS_MODE, "Managed"),
        _ => Ok(()),
    }
}

/// Aliases stored in `config` as `IPADDR<id>` with optional `LABEL<id>` and
/// `PREFIXLEN<id>`.
fn read_aliases(config: &InterfaceConfig) -> Vec<AliasEntry> {
    config
        .document()
        .attributes()
        .into_iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix(keys::IPADDR)?;
            if id.is_empty() {
                return None;
            }
            let (ip_address, subnet_prefix) = match value.split_once('/') {
                Some((addr, prefix)) => (addr.to_string(), format!("/{}", prefix)),
                None => (
                    value.clone(),
                    config
                        .field(&format!("{}{}", keys::PREFIXLEN, id))
                        .filter(|p| !p.is_empty())
                        .map(|p| format!("/{}", p))
                        .unwrap_or_default(),
                ),
            };
            Some(AliasEntry {
                id: id.to_string(),
                label: config
                    .field(&format!("LABEL{}", id))
                    .unwrap_or_default()
                    .to_string(),
                ip_address,
                subnet_prefix,
            })
        })
        .collect()
}

/// Parse `/N`, `N` or a dotted netmask. Empty means no prefix.
fn parse_prefix(value: &str) -> Result<Option<u8>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let digits = value.strip_prefix('/').unwrap_or(value);
    if PREFIX_LENGTH_RE.is_match(digits) {
        return digits
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidIpAddress(format!("Invalid prefix: {}", value)));
    }
    if value.starts_with('/') {
        return Err(Error::InvalidIpAddress(format!("Invalid prefix: {}", value)));
    }
    netmask_to_prefix(value).map(Some)
}

fn find_free_alias_id(used_ids: &[u32], mut last_id: u32) -> u32 {
    loop {
        last_id += 1;
        if !used_ids.contains(&last_id) {
            return last_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SysconfigStore;
    use std::fs;

    fn store() -> (tempfile::TempDir, SysconfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SysconfigStore::new(dir.path());
        (dir, store)
    }

    fn existing(content: &str) -> InterfaceConfig {
        InterfaceConfig::from_document("eth0", content.parse().unwrap())
    }

    #[test]
    fn test_proposed_names_skip_known() {
        let (dir, store) = store();
        for file in ["ifcfg-eth0", "ifcfg-eth2", "ifcfg-br0"] {
            fs::write(dir.path().join(file), "").unwrap();
        }

        let eth = InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, None).unwrap();
        let names = eth.proposed_names(&store).unwrap();
        assert_eq!(names.len(), NEW_DEVICES_COUNT);
        assert_eq!(&names[..3], ["eth1", "eth3", "eth4"]);
        assert_eq!(names.last().map(String::as_str), Some("eth11"));

        let br = InterfaceConfigBuilder::for_short_name("br", None).unwrap();
        assert_eq!(br.proposed_names(&store).unwrap()[0], "br1");

        assert!(InterfaceConfigBuilder::name_exists(&store, "eth2").unwrap());
        assert!(!InterfaceConfigBuilder::name_exists(&store, "eth1").unwrap());
    }

    #[test]
    fn test_valid_name() {
        assert!(InterfaceConfigBuilder::valid_name("eth0"));
        assert!(InterfaceConfigBuilder::valid_name("vlan.10:1"));
        assert!(!InterfaceConfigBuilder::valid_name(""));
        assert!(!InterfaceConfigBuilder::valid_name("a-very-long-name0"));
        assert!(!InterfaceConfigBuilder::valid_name("eth 0"));
    }

    #[test]
    fn test_unknown_type() {
        assert!(matches!(
            InterfaceConfigBuilder::for_short_name("token-ring", None),
            Err(Error::UnknownInterfaceType(_))
        ));
    }

    #[test]
    fn test_start_mode_and_priority() {
        let mut builder =
            InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, Some(existing(""))).unwrap();
        assert_eq!(builder.ifplugd_priority(), 0);

        builder.set_ifplugd_priority(5).unwrap();
        assert_eq!(builder.start_mode().unwrap(), StartMode::Ifplugd { priority: 5 });
        assert_eq!(builder.ifplugd_priority(), 5);

        // Same mode name keeps the stored priority
        builder.set_start_mode(StartMode::Ifplugd { priority: 0 }).unwrap();
        assert_eq!(builder.ifplugd_priority(), 5);

        builder.set_start_mode(StartMode::Auto).unwrap();
        assert_eq!(builder.ifplugd_priority(), 0);
        assert_eq!(builder.config.field(keys::IFPLUGD_PRIORITY), None);
    }

    #[test]
    fn test_subnet_prefix_forms() {
        let mut builder =
            InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, Some(existing(""))).unwrap();
        builder.set_ip_address("192.168.1.10").unwrap();

        builder.set_subnet_prefix("/24").unwrap();
        assert_eq!(builder.subnet_prefix(), "/24");
        builder.set_subnet_prefix("16").unwrap();
        assert_eq!(builder.subnet_prefix(), "/16");
        builder.set_subnet_prefix("255.255.255.128").unwrap();
        assert_eq!(builder.subnet_prefix(), "/25");
        assert_eq!(builder.config.field(keys::IPADDR), Some("192.168.1.10/25"));

        assert!(builder.set_subnet_prefix("255.0.255.0").is_err());
        assert!(builder.set_subnet_prefix("/33").is_err());
        assert!(builder.set_subnet_prefix("/abc").is_err());

        builder.set_subnet_prefix("").unwrap();
        assert_eq!(builder.subnet_prefix(), "");
        assert_eq!(builder.ip_address(), "192.168.1.10");
    }

    #[test]
    fn test_netmask_is_normalized() {
        let mut builder = InterfaceConfigBuilder::for_type(
            InterfaceType::Ethernet,
            Some(existing("IPADDR=10.0.0.1\nNETMASK=255.255.0.0\n")),
        )
        .unwrap();
        assert_eq!(builder.subnet_prefix(), "/16");

        builder.set_ip_address("10.0.0.2").unwrap();
        assert_eq!(builder.config.document().to_text(), "IPADDR=10.0.0.2/16\n");
    }

    #[test]
    fn test_prefix_before_address() {
        let mut builder =
            InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, Some(existing(""))).unwrap();
        builder.set_subnet_prefix("24").unwrap();
        assert_eq!(builder.config.field(keys::PREFIXLEN), Some("24"));

        builder.set_ip_address("10.1.1.1").unwrap();
        assert_eq!(builder.config.field(keys::IPADDR), Some("10.1.1.1/24"));
        assert_eq!(builder.config.field(keys::PREFIXLEN), None);
        assert!(builder.set_ip_address("not-an-address").is_err());
    }

    #[test]
    fn test_alias_id_allocation() {
        let mut builder =
            InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, Some(existing(""))).unwrap();
        builder.set_aliases(vec![
            AliasEntry {
                id: "_1".to_string(),
                ..AliasEntry::new("10.0.0.1", "/24")
            },
            AliasEntry::new("10.0.0.2", "24"),
            AliasEntry {
                id: "_3".to_string(),
                ..AliasEntry::new("10.0.0.3", "")
            },
            AliasEntry {
                id: "web".to_string(),
                ..AliasEntry::new("10.0.0.4", "255.255.255.0")
            },
            AliasEntry::new("10.0.0.5", ""),
        ]);

        let ids: Vec<String> = builder
            .aliases_to_ip_configs()
            .unwrap()
            .into_iter()
            .map(|alias| alias.id)
            .collect();
        assert_eq!(ids, vec!["_1", "_2", "_3", "web", "_4"]);
    }

    #[test]
    fn test_aliases_round_trip_through_store() {
        let (dir, mut store) = store();
        fs::write(
            dir.path().join("ifcfg-eth0"),
            "BOOTPROTO='static'\nIPADDR='10.0.0.1/24'\nIPADDR_1='10.0.0.9'\nPREFIXLEN_1='24'\nLABEL_1='old'\n",
        )
        .unwrap();

        let config = store.find("eth0").unwrap();
        let mut builder = InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, config).unwrap();
        assert_eq!(
            builder.aliases(),
            [AliasEntry {
                id: "_1".to_string(),
                label: "old".to_string(),
                ip_address: "10.0.0.9".to_string(),
                subnet_prefix: "/24".to_string(),
            }]
        );

        let mut aliases = builder.aliases().to_vec();
        aliases[0].label = String::new();
        aliases.push(AliasEntry {
            label: "svc".to_string(),
            ..AliasEntry::new("10.0.0.10", "/24")
        });
        builder.set_aliases(aliases);
        builder.save(&mut store).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("ifcfg-eth0")).unwrap(),
            "BOOTPROTO='static'\nIPADDR='10.0.0.1/24'\nIPADDR_1='10.0.0.9/24'\n\
             IPADDR_2=10.0.0.10/24\nLABEL_2=svc\n"
        );
        assert_eq!(builder.aliases().len(), 2);
    }

    #[test]
    fn test_configure_as_port() {
        let mut builder = InterfaceConfigBuilder::for_type(
            InterfaceType::Ethernet,
            Some(existing(
                "BOOTPROTO=static\nIPADDR=10.0.0.1/24\nREMOTE_IPADDR=10.0.0.2\nIPADDR_0=10.0.1.1\nMTU=9000\n",
            )),
        )
        .unwrap();

        builder.configure_as_port().unwrap();
        builder.write_aliases().unwrap();

        assert_eq!(builder.boot_protocol().unwrap(), BootProtocol::None);
        assert_eq!(builder.ip_address(), "");
        assert_eq!(builder.remote_ip(), "");
        assert!(builder.aliases().is_empty());
        assert_eq!(builder.config.document().to_text(), "BOOTPROTO=none\nMTU=9000\n");
    }

    #[test]
    fn test_custom_driver_capability() {
        let mut eth =
            InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, Some(existing(""))).unwrap();
        eth.set_driver(Some("e1000e")).unwrap();
        assert_eq!(eth.driver(), Some("e1000e"));
        eth.set_driver(None).unwrap();
        assert_eq!(eth.driver(), None);

        let mut br = InterfaceConfigBuilder::for_type(InterfaceType::Bridge, None).unwrap();
        assert!(br.set_driver(Some("bridge")).is_err());
    }

    #[test]
    fn test_type_defaults_and_specifics() {
        let mut bond = InterfaceConfigBuilder::for_type(InterfaceType::Bond, None).unwrap();
        assert_eq!(bond.config.field(keys::BONDING_MASTER), Some("yes"));
        assert_eq!(bond.config.field(keys::BONDING_MODULE_OPTS), Some(DEFAULT_BOND_OPTIONS));
        bond.set_ports(&["eth0".to_string(), "eth1".to_string()]).unwrap();
        bond.set_ports(&["eth2".to_string()]).unwrap();
        assert_eq!(bond.ports(), vec!["eth2"]);
        assert_eq!(bond.config.field("BONDING_SLAVE_1"), None);

        let mut br = InterfaceConfigBuilder::for_type(InterfaceType::Bridge, None).unwrap();
        br.set_ports(&["eth0".to_string(), "eth1".to_string()]).unwrap();
        assert_eq!(br.config.field(keys::BRIDGE_PORTS), Some("eth0 eth1"));
        assert_eq!(br.ports(), vec!["eth0", "eth1"]);
        assert!(br.set_vlan("eth0", 10).is_err());

        let mut vlan = InterfaceConfigBuilder::for_type(InterfaceType::Vlan, None).unwrap();
        vlan.set_vlan("eth0", 10).unwrap();
        assert_eq!(vlan.vlan(), Some(("eth0".to_string(), 10)));
        assert!(vlan.set_vlan("eth0", 5000).is_err());
        assert!(vlan.set_ports(&["eth1".to_string()]).is_err());

        let tap = InterfaceConfigBuilder::for_type(InterfaceType::Tap, None).unwrap();
        assert_eq!(tap.config.field(keys::TUNNEL), Some("tap"));

        let dummy = InterfaceConfigBuilder::for_type(InterfaceType::Dummy, None).unwrap();
        assert_eq!(dummy.boot_protocol().unwrap(), BootProtocol::Static);
        assert!(dummy.requires_ip_config());
    }

    #[test]
    fn test_save_new_and_rename() {
        let (dir, mut store) = store();

        let mut builder = InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, None).unwrap();
        assert!(builder.save(&mut store).is_err());

        builder.set_name("eth0");
        builder.set_mtu(1400).unwrap();
        builder.save(&mut store).unwrap();
        assert!(!builder.is_newly_added());
        assert_eq!(
            fs::read_to_string(dir.path().join("ifcfg-eth0")).unwrap(),
            "BOOTPROTO=dhcp\nSTARTMODE=auto\nMTU=1400\n"
        );

        let mut other = InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, None).unwrap();
        other.set_name("eth0");
        assert!(matches!(
            other.save(&mut store),
            Err(Error::Configuration { .. })
        ));

        builder.set_name("lan0");
        assert!(builder.is_renamed());
        builder.save(&mut store).unwrap();
        assert_eq!(store.known_names().unwrap(), vec!["lan0"]);
        assert_eq!(builder.mtu(), Some(1400));
    }

    #[test]
    fn test_misc_fields() {
        let mut builder =
            InterfaceConfigBuilder::for_type(InterfaceType::Ethernet, Some(existing(""))).unwrap();
        builder.set_hostname("node1.example.org").unwrap();
        assert_eq!(builder.hostname(), "node1.example.org");
        assert!(builder.set_hostname("bad_host").is_err());
        builder.set_hostname("").unwrap();
        assert_eq!(builder.hostname(), "");

        assert!(builder.set_mtu(20).is_err());
        builder.set_mtu(9000).unwrap();
        builder.set_mtu(0).unwrap();
        assert_eq!(builder.mtu(), None);

        builder.set_remote_ip("10.0.0.254").unwrap();
        assert_eq!(builder.remote_ip(), "10.0.0.254");
        builder.set_description("Uplink").unwrap();
        builder.set_firewall_zone("public").unwrap();
        builder.set_ethtool_options("-K eth0 tso off").unwrap();
        assert_eq!(builder.description(), "Uplink");
        assert_eq!(builder.firewall_zone(), "public");
        assert_eq!(builder.ethtool_options(), "-K eth0 tso off");
    }
}
