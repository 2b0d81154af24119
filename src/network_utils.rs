// Network Setup - Network Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Network card and platform detection.
//!
//! Network cards are read from the Linux sysfs interface. All functions take
//! the sysfs directory explicitly so they can run against a fake tree.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::models::{AdapterInfo, AdapterType, SystemFacts};

/// Detect all network adapters below `net_path`, sorted naturally by name.
///
/// Virtual and loopback interfaces are skipped.
pub fn detect_network_adapters(net_path: &Path) -> Vec<AdapterInfo> {
    let mut adapters = Vec::new();

    if let Ok(entries) = fs::read_dir(net_path) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let adapter_type = determine_adapter_type(&entry.path(), &name);

            if !adapter_type.is_physical() {
                continue;
            }

            let mut info = AdapterInfo::new(&name, adapter_type);

            // Read MAC address
            let address_path = entry.path().join("address");
            if let Ok(mac) = fs::read_to_string(&address_path) {
                let mac = mac.trim().to_uppercase();
                if !mac.is_empty() && mac != "00:00:00:00:00:00" {
                    info.mac_address = Some(mac);
                }
            }

            info.has_carrier = has_carrier(net_path, &name);

            // Kernel driver behind the device link
            let driver_path = entry.path().join("device").join("driver");
            if let Ok(driver_link) = fs::read_link(&driver_path) {
                if let Some(driver_name) = driver_link.file_name() {
                    info.driver = Some(driver_name.to_string_lossy().to_string());
                }
            }

            debug!("Detected adapter {}", info.display_label());
            adapters.push(info);
        }
    }

    // Sort by name for consistent ordering
    adapters.sort_by(|a, b| natural_cmp(&a.name, &b.name));

    adapters
}

/// Whether the physical link of `device` reports a carrier.
///
/// Reading `carrier` fails while the link is administratively down, which
/// counts as no carrier.
pub fn has_carrier(net_path: &Path, device: &str) -> bool {
    fs::read_to_string(net_path.join(device).join("carrier"))
        .map(|c| c.trim() == "1")
        .unwrap_or(false)
}

/// Determine the type of network adapter.
fn determine_adapter_type(path: &Path, name: &str) -> AdapterType {
    // Check for wireless by looking for wireless directory
    if path.join("wireless").exists() {
        return AdapterType::Wifi;
    }

    if let Ok(uevent) = fs::read_to_string(path.join("uevent")) {
        if uevent.contains("DEVTYPE=wlan") {
            return AdapterType::Wifi;
        }
        if uevent.contains("DEVTYPE=bridge")
            || uevent.contains("DEVTYPE=vlan")
            || uevent.contains("DEVTYPE=bond")
        {
            return AdapterType::Virtual;
        }
    }

    // Check type file (1 = ARPHRD_ETHER, 32 = ARPHRD_INFINIBAND, 772 = ARPHRD_LOOPBACK)
    if let Ok(type_str) = fs::read_to_string(path.join("type")) {
        match type_str.trim().parse::<u32>().unwrap_or(0) {
            1 => {
                // Physical cards have a backing device node
                if is_virtual_interface(name) || !path.join("device").exists() {
                    return AdapterType::Virtual;
                }
                return AdapterType::Ethernet;
            }
            32 => return AdapterType::Infiniband,
            772 => return AdapterType::Loopback,
            _ => {}
        }
    }

    if name == "lo" {
        return AdapterType::Loopback;
    }

    if name.starts_with("wl") {
        return AdapterType::Wifi;
    }

    if is_virtual_interface(name) {
        return AdapterType::Virtual;
    }

    if name.starts_with("en") || name.starts_with("eth") {
        return AdapterType::Ethernet;
    }

    AdapterType::Other
}

/// Check if interface name suggests a virtual/tunnel interface.
fn is_virtual_interface(name: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "veth", "br", "virbr", "docker", "vnet", "tun", "tap", "bond", "team", "vlan", "dummy",
    ];
    PREFIXES.iter().any(|p| name.starts_with(p)) || name.contains("podman")
}

/// Compare interface names so that embedded numbers sort by value:
/// `eth2` < `eth10`, `enp0s25` < `enp1s0`.
///
/// Names are split into runs of digits and non-digits that are compared
/// pairwise. Names equal under that rule (`eth01`, `eth1`) fall back to
/// plain string order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let order = match (is_number(x), is_number(y)) {
                    (true, true) => cmp_numbers(x, y),
                    _ => x.cmp(y),
                };
                if order != Ordering::Equal {
                    return order;
                }
            }
        }
    }
}

/// Split `s` into maximal runs of ASCII digits and of everything else.
fn segments(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (segment, tail) = rest.split_at(end);
        rest = tail;
        Some(segment)
    })
}

fn is_number(segment: &str) -> bool {
    segment.starts_with(|c: char| c.is_ascii_digit())
}

/// Compare digit runs by value without parsing, so any length works.
fn cmp_numbers(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

/// Detect platform facts relevant to the network proposal.
pub fn detect_system_facts() -> SystemFacts {
    let is_laptop = fs::read_dir("/sys/class/power_supply")
        .map(|entries| {
            entries.flatten().any(|entry| {
                fs::read_to_string(entry.path().join("type"))
                    .map(|t| t.trim() == "Battery")
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false);

    let is_xen_dom0 = fs::read_to_string("/proc/xen/capabilities")
        .map(|caps| caps.contains("control_d"))
        .unwrap_or(false);

    SystemFacts {
        is_laptop,
        is_s390: std::env::consts::ARCH.starts_with("s390"),
        is_xen_dom0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_device(root: &Path, name: &str, kind: u32, carrier: Option<&str>, physical: bool) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{}\n", kind)).unwrap();
        fs::write(dir.join("address"), "52:54:00:12:34:56\n").unwrap();
        if let Some(carrier) = carrier {
            fs::write(dir.join("carrier"), carrier).unwrap();
        }
        if physical {
            fs::create_dir_all(dir.join("device")).unwrap();
        }
    }

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["eth10", "enp2s0", "eth2", "enp0s25", "enp1s0", "eth0", "enp0s3"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            names,
            vec!["enp0s3", "enp0s25", "enp1s0", "enp2s0", "eth0", "eth2", "eth10"]
        );

        assert_eq!(natural_cmp("eth1", "eth1"), Ordering::Equal);
        assert_eq!(natural_cmp("eth01", "eth1"), Ordering::Less);
        assert_eq!(natural_cmp("eth1", "eth1a"), Ordering::Less);
        assert_eq!(natural_cmp("wlp3s0", "wlp3s0f1"), Ordering::Less);
        assert_eq!(
            natural_cmp("eth99999999999999999999", "eth100000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn test_detect_fake_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fake_device(root, "eth10", 1, Some("0\n"), true);
        fake_device(root, "eth2", 1, Some("1\n"), true);
        fake_device(root, "lo", 772, Some("1\n"), false);
        fake_device(root, "br0", 1, Some("1\n"), false);
        fake_device(root, "ib0", 32, None, true);
        fake_device(root, "enp1s0", 1, None, true);
        fake_device(root, "enp0s25", 1, None, true);

        let adapters = detect_network_adapters(root);
        let names: Vec<&str> = adapters.iter().map(|a| a.name.as_str()).collect();

        assert_eq!(names, vec!["enp0s25", "enp1s0", "eth2", "eth10", "ib0"]);
        assert!(adapters[2].has_carrier);
        assert!(!adapters[3].has_carrier);
        assert!(!adapters[4].has_carrier);
        assert_eq!(adapters[4].adapter_type, AdapterType::Infiniband);
        assert_eq!(adapters[2].mac_address.as_deref(), Some("52:54:00:12:34:56"));
    }

    #[test]
    fn test_missing_sysfs_detects_nothing() {
        assert!(detect_network_adapters(Path::new("/nonexistent/sys/class/net")).is_empty());
    }
}
