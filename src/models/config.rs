// Network Setup - Application Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Application configuration model.
//!
//! Loaded once at startup (from TOML) and passed by reference to whatever
//! needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::proposal::Backend;

/// Shell command templates used to drive the network service.
///
/// `{device}` and `{server}` are substituted before execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Reload the persisted configuration of one device.
    #[serde(default = "default_reload_command")]
    pub reload: String,

    /// Succeeds when the device is reported as up.
    #[serde(default = "default_status_command")]
    pub status: String,

    /// Reachability probe through one device.
    #[serde(default = "default_ping_command")]
    pub ping: String,

    /// Bring the link of a device up so its carrier can be read.
    #[serde(default = "default_link_up_command")]
    pub link_up: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            reload: default_reload_command(),
            status: default_status_command(),
            ping: default_ping_command(),
            link_up: default_link_up_command(),
        }
    }
}

impl CommandConfig {
    /// Render a template for `device` and an optional `server`.
    pub fn render(template: &str, device: &str, server: Option<&str>) -> String {
        let command = template.replace("{device}", device);
        match server {
            Some(server) => command.replace("{server}", server),
            None => command,
        }
    }
}

fn default_reload_command() -> String {
    "wicked ifreload '{device}'".to_string()
}

fn default_status_command() -> String {
    "wicked ifstatus --brief {device} | grep 'up$'".to_string()
}

fn default_ping_command() -> String {
    "ping -I {device} -c 3 {server}".to_string()
}

fn default_link_up_command() -> String {
    "ip link set dev '{device}' up".to_string()
}

/// Reachability probing used to choose the default route device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Servers that must be reachable through the default route device.
    #[serde(default = "default_target_servers")]
    pub target_servers: Vec<String>,

    /// Seconds to wait for a carrier after bringing a link up.
    #[serde(default = "default_link_wait_secs")]
    pub link_wait_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target_servers: default_target_servers(),
            link_wait_secs: default_link_wait_secs(),
        }
    }
}

fn default_target_servers() -> Vec<String> {
    vec!["scc.suse.com".to_string()]
}

fn default_link_wait_secs() -> u64 {
    6
}

/// Product defaults for the network proposal (control file `network` section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFeatures {
    /// `"always"`, `"laptop"` or empty to fall back to
    /// `network_manager_is_default`.
    #[serde(default)]
    pub network_manager: String,

    #[serde(default)]
    pub network_manager_is_default: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_forward: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_forward: Option<bool>,
}

/// Settings imported from an unattended installation profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoinstConfig {
    /// Backend requested by the profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_backend: Option<Backend>,

    /// `false` when the profile disabled the virtualization bridge proposal.
    #[serde(default = "default_true")]
    pub virt_bridge_proposal: bool,
}

impl Default for AutoinstConfig {
    fn default() -> Self {
        Self {
            selected_backend: None,
            virt_bridge_proposal: true,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the `ifcfg-*` files.
    #[serde(default = "default_sysconfig_dir")]
    pub sysconfig_dir: PathBuf,

    /// Network class directory of sysfs, read for cards and link state.
    #[serde(default = "default_sysfs_dir")]
    pub sysfs_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub commands: CommandConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub network: NetworkFeatures,

    #[serde(default)]
    pub autoinst: AutoinstConfig,
}

fn default_sysconfig_dir() -> PathBuf {
    PathBuf::from("/etc/sysconfig/network")
}

fn default_sysfs_dir() -> PathBuf {
    PathBuf::from("/sys/class/net")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sysconfig_dir: default_sysconfig_dir(),
            sysfs_dir: default_sysfs_dir(),
            log_level: default_log_level(),
            commands: CommandConfig::default(),
            probe: ProbeConfig::default(),
            network: NetworkFeatures::default(),
            autoinst: AutoinstConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, super::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Default location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(super::CONFIG_DIR_NAME).join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sysconfig_dir, PathBuf::from("/etc/sysconfig/network"));
        assert_eq!(config.sysfs_dir, PathBuf::from("/sys/class/net"));
        assert_eq!(config.probe.target_servers, vec!["scc.suse.com".to_string()]);
        assert!(config.autoinst.virt_bridge_proposal);
        assert_eq!(config.probe.link_wait_secs, 6);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            sysconfig_dir = "/tmp/net"

            [network]
            network_manager = "laptop"
            ipv4_forward = true

            [autoinst]
            selected_backend = "network_manager"
            "#,
        )
        .unwrap();

        assert_eq!(config.sysconfig_dir, PathBuf::from("/tmp/net"));
        assert_eq!(config.network.network_manager, "laptop");
        assert_eq!(config.network.ipv4_forward, Some(true));
        assert_eq!(config.network.ipv6_forward, None);
        assert_eq!(config.autoinst.selected_backend, Some(Backend::NetworkManager));
        assert_eq!(config.commands, CommandConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.probe.target_servers = vec!["example.org".to_string()];
        config.sysfs_dir = PathBuf::from("/tmp/sys/class/net");

        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded, config);
        assert!(matches!(
            AppConfig::load_from_file(&dir.path().join("missing.toml")),
            Err(crate::models::Error::Io(_))
        ));
    }

    #[test]
    fn test_render_command() {
        let commands = CommandConfig::default();
        assert_eq!(
            CommandConfig::render(&commands.reload, "eth0", None),
            "wicked ifreload 'eth0'"
        );
        assert_eq!(
            CommandConfig::render(&commands.ping, "eth1", Some("scc.suse.com")),
            "ping -I eth1 -c 3 scc.suse.com"
        );
    }
}
