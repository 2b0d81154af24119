// Network Setup - DHCP Activation Service
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Install-time DHCP activation of unconfigured network cards.
//!
//! Every connected card without a configuration gets a DHCP record, is
//! reloaded through the network service and checked for being up. Cards
//! that stay down lose their record again. Among the cards that came up,
//! one is chosen to own the default route: the only one, or the first one
//! through which a target server answers.

use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::command::CommandRunner;
use crate::models::{
    ActivationReport, AdapterInfo, AppConfig, BootProtocol, CommandConfig, Error, InterfaceConfig,
    Result, StartMode, StepStatus,
};
use crate::network_utils::has_carrier;
use crate::storage::InterfaceStore;

/// Drives DHCP setup and activation for a set of devices.
pub struct DhcpActivator<'a, S: InterfaceStore, R: CommandRunner> {
    store: &'a mut S,
    runner: &'a R,
    config: &'a AppConfig,
}

impl<'a, S: InterfaceStore, R: CommandRunner> DhcpActivator<'a, S, R> {
    pub fn new(store: &'a mut S, runner: &'a R, config: &'a AppConfig) -> Self {
        Self {
            store,
            runner,
            config,
        }
    }

    /// Devices eligible for DHCP: no persisted record and a physical link.
    ///
    /// A record that exists but cannot be read counts as configured.
    pub fn candidates(&self, adapters: &[AdapterInfo]) -> Vec<String> {
        let candidates: Vec<String> = adapters
            .iter()
            .filter(|adapter| match self.store.is_configured(&adapter.name) {
                Ok(configured) => !configured,
                Err(e) => {
                    warn!("Skipping {}: {}", adapter.name, e);
                    false
                }
            })
            .filter(|adapter| self.phy_connected(&adapter.name))
            .map(|adapter| adapter.name.clone())
            .collect();

        info!("Candidates for enabling DHCP: {:?}", candidates);
        candidates
    }

    /// Whether `device` has a physical link.
    ///
    /// A link that is down reports no carrier, so it is brought up first and
    /// polled once per second for the configured wait time.
    pub fn phy_connected(&self, device: &str) -> bool {
        if has_carrier(&self.config.sysfs_dir, device) {
            return true;
        }

        let command = CommandConfig::render(&self.config.commands.link_up, device, None);
        if !self.runner.succeeds(&command) {
            debug!("Could not bring up the link of {}", device);
            return false;
        }

        for _ in 0..self.config.probe.link_wait_secs {
            if has_carrier(&self.config.sysfs_dir, device) {
                return true;
            }
            thread::sleep(Duration::from_secs(1));
        }
        let connected = has_carrier(&self.config.sysfs_dir, device);
        debug!("Physical link of {}: {}", device, connected);
        connected
    }

    /// Write a DHCP configuration (`BOOTPROTO=dhcp`, `STARTMODE=auto`) for
    /// `device`, creating the record if needed.
    pub fn setup_dhcp(&mut self, device: &str) -> Result<()> {
        let mut config = match self.store.find(device)? {
            Some(config) => config,
            None => self.store.create(device)?,
        };
        config.set_boot_protocol(BootProtocol::Dhcp)?;
        config.set_start_mode(StartMode::Auto)?;
        self.store.save(&config)
    }

    /// Ask the network service to reload `device`.
    pub fn reload(&self, device: &str) -> bool {
        let command = CommandConfig::render(&self.config.commands.reload, device, None);
        let reloaded = self.runner.succeeds(&command);
        if !reloaded {
            warn!("Reloading {} failed", device);
        }
        reloaded
    }

    /// Reload every device in `devices`, reporting the result of each.
    pub fn activate_changes(&self, devices: &[String]) -> Vec<bool> {
        devices.iter().map(|device| self.reload(device)).collect()
    }

    /// Whether the network service reports `device` as up.
    pub fn is_active(&self, device: &str) -> bool {
        let command = CommandConfig::render(&self.config.commands.status, device, None);
        self.runner.succeeds(&command)
    }

    /// Persist `DHCLIENT_SET_DEFAULT_ROUTE` for `device`.
    pub fn set_default_route_flag(&mut self, device: &str, enabled: bool) -> Result<()> {
        let mut config = self.record(device)?;
        config.set_default_route(enabled)?;
        self.store.save(&config)
    }

    /// Give `device` the default route and keep it only if one of the
    /// target servers is reachable through it.
    pub fn try_default_route(&mut self, device: &str) -> Result<bool> {
        self.set_default_route_flag(device, true)?;
        self.reload(device);

        let reached = self.config.probe.target_servers.iter().any(|server| {
            let command = CommandConfig::render(&self.config.commands.ping, device, Some(server));
            self.runner.succeeds(&command)
        });
        info!("Target servers can be reached via {}: {}", device, reached);

        if !reached {
            self.set_default_route_flag(device, false)?;
            self.reload(device);
        }
        Ok(reached)
    }

    /// Run the whole activation for `devices`, in order.
    ///
    /// Failures are isolated per device and collected in the report.
    pub fn run(&mut self, devices: &[String]) -> ActivationReport {
        let mut report = ActivationReport::new(devices);

        let mut configured = Vec::new();
        for device in devices {
            match self.setup_dhcp(device) {
                Ok(()) => {
                    report.device_mut(device).configured = StepStatus::Success;
                    configured.push(device.clone());
                }
                Err(e) => {
                    warn!("Failed to save configuration for {}: {}", device, e);
                    let result = report.device_mut(device);
                    result.configured = StepStatus::Error;
                    result.activated = StepStatus::Skipped;
                    result.errors.push(e.to_string());
                }
            }
        }

        let reloaded = self.activate_changes(&configured);
        let mut active = Vec::new();
        for (device, reloaded) in configured.iter().zip(reloaded) {
            if reloaded && self.is_active(device) {
                report.device_mut(device).activated = StepStatus::Success;
                active.push(device.clone());
                continue;
            }

            let reason = if reloaded {
                "device is not up after reload"
            } else {
                "reload failed"
            };
            let result = report.device_mut(device);
            result.activated = StepStatus::Error;
            result.errors.push(reason.to_string());

            match self.store.delete(device) {
                Ok(_) => report.device_mut(device).rolled_back = true,
                Err(e) => report.record_error(device, e),
            }
        }
        info!("Active devices: {:?}", active);

        let route_device = self.choose_default_route(&active, &mut report);
        report.default_route_device = route_device;

        for (device, reloaded) in configured.iter().zip(self.activate_changes(&configured)) {
            if !reloaded {
                debug!("Final reload of {} failed", device);
            }
        }

        report.finalize();
        info!("{}", report.message);
        report
    }

    fn choose_default_route(
        &mut self,
        active: &[String],
        report: &mut ActivationReport,
    ) -> Option<String> {
        if let [device] = active {
            return match self.set_default_route_flag(device, true) {
                Ok(()) => {
                    report.device_mut(device).default_route = Some(true);
                    Some(device.clone())
                }
                Err(e) => {
                    report.record_error(device, e);
                    None
                }
            };
        }

        let mut winner = None;
        for device in active {
            if winner.is_some() {
                // Never probed, must not compete for the route
                match self.set_default_route_flag(device, false) {
                    Ok(()) => report.device_mut(device).default_route = Some(false),
                    Err(e) => report.record_error(device, e),
                }
                continue;
            }

            match self.try_default_route(device) {
                Ok(reached) => {
                    report.device_mut(device).default_route = Some(reached);
                    if reached {
                        winner = Some(device.clone());
                    }
                }
                Err(e) => report.record_error(device, e),
            }
        }
        winner
    }

    fn record(&self, device: &str) -> Result<InterfaceConfig> {
        self.store
            .find(device)?
            .ok_or_else(|| Error::configuration(device, "no configuration found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::DeviceResult;
    use crate::models::{keys, AdapterType};
    use crate::services::command::testing::ScriptedRunner;
    use crate::storage::SysconfigStore;
    use std::fs;

    fn setup() -> (tempfile::TempDir, SysconfigStore, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let store = SysconfigStore::new(dir.path().join("network"));
        let mut config = AppConfig::default();
        config.probe.link_wait_secs = 0;
        (dir, store, config)
    }

    fn result<'a>(report: &'a ActivationReport, device: &str) -> &'a DeviceResult {
        report
            .devices
            .iter()
            .find(|d| d.device == device)
            .expect("device is in the report")
    }

    fn names(devices: &[&str]) -> Vec<String> {
        devices.iter().map(|d| d.to_string()).collect()
    }

    fn route_flag(store: &SysconfigStore, device: &str) -> Option<String> {
        store
            .find(device)
            .unwrap()
            .and_then(|c| c.field(keys::DHCLIENT_SET_DEFAULT_ROUTE).map(str::to_string))
    }

    #[test]
    fn test_failed_reload_rolls_back_and_survivor_gets_route() {
        let (_dir, mut store, config) = setup();
        let runner = ScriptedRunner::new().on("ifreload 'eth1'", 1);

        let report = DhcpActivator::new(&mut store, &runner, &config).run(&names(&["eth0", "eth1"]));

        let eth0 = store.find("eth0").unwrap().unwrap();
        assert_eq!(eth0.field(keys::BOOTPROTO), Some("dhcp"));
        assert_eq!(eth0.field(keys::STARTMODE), Some("auto"));
        assert_eq!(eth0.default_route(), Some(true));
        assert!(store.find("eth1").unwrap().is_none());

        assert_eq!(report.default_route_device.as_deref(), Some("eth0"));
        assert_eq!(report.active_devices(), vec!["eth0"]);
        let eth1 = result(&report, "eth1");
        assert!(eth1.rolled_back);
        assert_eq!(eth1.activated, StepStatus::Error);
        // Single survivor is not probed
        assert_eq!(runner.count("ping"), 0);
    }

    #[test]
    fn test_device_not_up_is_deleted() {
        let (_dir, mut store, config) = setup();
        let runner = ScriptedRunner::new().on("ifstatus --brief eth0", 1);

        let report = DhcpActivator::new(&mut store, &runner, &config).run(&names(&["eth0"]));

        assert!(store.find("eth0").unwrap().is_none());
        assert!(report.default_route_device.is_none());
        assert_eq!(
            result(&report, "eth0").errors,
            vec!["device is not up after reload"]
        );
    }

    #[test]
    fn test_route_goes_to_first_reachable_device() {
        let (_dir, mut store, config) = setup();
        let runner = ScriptedRunner::new().on("ping -I eth0 ", 1);

        let report = DhcpActivator::new(&mut store, &runner, &config)
            .run(&names(&["eth0", "eth1", "eth2"]));

        assert_eq!(route_flag(&store, "eth0").as_deref(), Some("no"));
        assert_eq!(route_flag(&store, "eth1").as_deref(), Some("yes"));
        assert_eq!(route_flag(&store, "eth2").as_deref(), Some("no"));
        assert_eq!(report.default_route_device.as_deref(), Some("eth1"));

        // eth2 never probed once eth1 answered
        assert_eq!(runner.count("ping -I eth2 "), 0);
        // initial, set yes, set no, final
        assert_eq!(runner.count("ifreload 'eth0'"), 4);
        // initial, set yes, final
        assert_eq!(runner.count("ifreload 'eth1'"), 3);
        assert_eq!(runner.count("ifreload 'eth2'"), 2);
    }

    #[test]
    fn test_no_reachable_device_keeps_route_off() {
        let (_dir, mut store, config) = setup();
        let runner = ScriptedRunner::new().on("ping", 1);

        let report =
            DhcpActivator::new(&mut store, &runner, &config).run(&names(&["eth0", "eth1"]));

        assert_eq!(route_flag(&store, "eth0").as_deref(), Some("no"));
        assert_eq!(route_flag(&store, "eth1").as_deref(), Some("no"));
        assert!(report.default_route_device.is_none());
        assert_eq!(report.active_devices(), vec!["eth0", "eth1"]);
    }

    #[test]
    fn test_invalid_device_is_isolated() {
        let (_dir, mut store, config) = setup();
        let runner = ScriptedRunner::new();

        let report = DhcpActivator::new(&mut store, &runner, &config)
            .run(&names(&["bad name", "eth0"]));

        let bad = result(&report, "bad name");
        assert_eq!(bad.configured, StepStatus::Error);
        assert_eq!(bad.activated, StepStatus::Skipped);
        assert_eq!(report.default_route_device.as_deref(), Some("eth0"));
        assert_eq!(runner.count("'bad name'"), 0);
    }

    #[test]
    fn test_existing_record_is_updated_in_place() {
        let (dir, mut store, config) = setup();
        let net = dir.path().join("network");
        fs::create_dir_all(&net).unwrap();
        fs::write(net.join("ifcfg-eth0"), "# keep\nBOOTPROTO='static'\nMTU='9000'\n").unwrap();
        let runner = ScriptedRunner::new();

        DhcpActivator::new(&mut store, &runner, &config)
            .setup_dhcp("eth0")
            .unwrap();

        assert_eq!(
            fs::read_to_string(net.join("ifcfg-eth0")).unwrap(),
            "# keep\nBOOTPROTO='dhcp'\nMTU='9000'\nSTARTMODE=auto\n"
        );
    }

    #[test]
    fn test_candidates_need_link_and_no_record() {
        let (dir, mut store, mut config) = setup();
        let sysfs = dir.path().join("sys");
        config.sysfs_dir = sysfs.clone();
        for (device, carrier) in [("eth0", "1"), ("eth1", "0"), ("eth2", "1")] {
            fs::create_dir_all(sysfs.join(device)).unwrap();
            fs::write(sysfs.join(device).join("carrier"), carrier).unwrap();
        }
        let existing = store.create("eth2").unwrap();
        store.save(&existing).unwrap();

        let adapters: Vec<AdapterInfo> = ["eth0", "eth1", "eth2"]
            .iter()
            .map(|name| AdapterInfo::new(*name, AdapterType::Ethernet))
            .collect();
        let runner = ScriptedRunner::new();
        let activator = DhcpActivator::new(&mut store, &runner, &config);

        assert_eq!(activator.candidates(&adapters), vec!["eth0"]);
        assert_eq!(runner.count("ip link set dev 'eth1' up"), 1);
        assert_eq!(runner.count("'eth2'"), 0);
    }
}
