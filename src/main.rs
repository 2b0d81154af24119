// Network Setup - Main Entry Point
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Network Setup
//!
//! Sysconfig key/value merge engine and install-time network setup for
//! Linux interfaces managed by wicked.
//!
//! This is the main entry point for the command-line tool.

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};

mod builder;
mod models;
mod network_utils;
mod services;
mod storage;
mod sysconfig;

use builder::{AliasEntry, InterfaceConfigBuilder, NEW_DEVICES_COUNT};
use models::{
    AppConfig, Backend, BootProtocol, Error, InterfaceType, NetworkFeatures, Result,
    RoutingConfig, StartMode,
};
use services::{DhcpActivator, PackageSelection, ProposalSettings, ShellRunner};
use storage::{InterfaceStore, SysconfigStore};
use sysconfig::MergeOutcome;

/// Human-readable application name.
pub const APP_NAME: &str = "Network Setup";

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "network-setup")]
#[command(about = "Sysconfig merge engine and install-time network setup", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the settings of MODIFIED into ORIGINAL, keeping its comments
    Merge {
        /// File to update (copied from MODIFIED when missing)
        original: PathBuf,

        /// File holding the new settings
        modified: PathBuf,
    },

    /// Enable DHCP on connected, unconfigured cards and pick the default route
    SetupDhcp {
        /// Devices to set up instead of the detected candidates
        #[arg(long = "device", short = 'D')]
        devices: Vec<String>,

        /// Sysconfig network directory (default from configuration)
        #[arg(long)]
        sysconfig_dir: Option<PathBuf>,
    },

    /// Show the configuration of a device
    Show {
        device: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        #[arg(long)]
        sysconfig_dir: Option<PathBuf>,
    },

    /// Propose free names for a new device of the given type (eth, br, bond, ...)
    ProposeNames {
        #[arg(value_name = "TYPE")]
        interface_type: String,

        /// Number of names to propose (at most 10)
        #[arg(long, short = 'n', default_value_t = NEW_DEVICES_COUNT)]
        count: usize,

        #[arg(long)]
        sysconfig_dir: Option<PathBuf>,
    },

    /// Create or edit the configuration of a device
    Configure(ConfigureArgs),

    /// Select the network backend and show the resulting package proposal
    Backend(BackendArgs),
}

#[derive(Args, Debug)]
struct ConfigureArgs {
    device: String,

    /// Interface type short name (eth, wlan, br, bond, vlan, ...);
    /// detected from the hardware when omitted
    #[arg(long = "type", short = 't')]
    interface_type: Option<String>,

    /// Save the record under a new device name
    #[arg(long, value_name = "NAME")]
    rename: Option<String>,

    /// Boot protocol (static, dhcp, dhcp4, dhcp6, dhcp+autoip, autoip, ibft, none)
    #[arg(long)]
    bootproto: Option<String>,

    /// Start mode (auto, hotplug, ifplugd, manual, nfsroot, off)
    #[arg(long)]
    startmode: Option<String>,

    /// Ifplugd priority, implies --startmode ifplugd
    #[arg(long)]
    ifplugd_priority: Option<u32>,

    /// Static address, empty to drop the address configuration
    #[arg(long)]
    ip: Option<String>,

    /// Prefix as /N, N or a dotted netmask
    #[arg(long)]
    prefix: Option<String>,

    /// Peer address of a point-to-point link
    #[arg(long)]
    remote_ip: Option<String>,

    /// Hostname sent with DHCP requests
    #[arg(long)]
    hostname: Option<String>,

    /// MTU, 0 for the kernel default
    #[arg(long)]
    mtu: Option<u32>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    ethtool: Option<String>,

    /// Firewall zone
    #[arg(long)]
    zone: Option<String>,

    /// Kernel driver for the card, empty for automatic selection
    #[arg(long)]
    driver: Option<String>,

    /// Additional address as ADDR[/PREFIX], repeatable; replaces the
    /// existing aliases
    #[arg(long = "alias", value_name = "ADDR[/PREFIX]")]
    aliases: Vec<String>,

    /// Remove all additional addresses
    #[arg(long, conflicts_with = "aliases")]
    clear_aliases: bool,

    /// Bridge or bond ports (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ports: Option<Vec<String>>,

    /// Bonding module options
    #[arg(long)]
    bond_options: Option<String>,

    /// VLAN parent device and tag
    #[arg(long, value_name = "PARENT:ID")]
    vlan: Option<String>,

    /// Wireless network name
    #[arg(long)]
    essid: Option<String>,

    /// Strip addressing so the device can serve as a bridge or bond port
    #[arg(long)]
    port: bool,

    /// Print a JSON summary instead of the written file
    #[arg(long)]
    json: bool,

    #[arg(long)]
    sysconfig_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BackendArgs {
    /// wicked, network-manager or none
    backend: Backend,

    /// sysctl sysconfig file to receive the forwarding defaults
    #[arg(long)]
    sysctl: Option<PathBuf>,

    /// Override the product default for IPv4 forwarding
    #[arg(long)]
    ipv4_forward: Option<bool>,

    /// Override the product default for IPv6 forwarding
    #[arg(long)]
    ipv6_forward: Option<bool>,

    /// Whether a bridge for virtual machines may be proposed
    #[arg(long)]
    propose_bridge: Option<bool>,
}

/// Load the configuration from `path`, or from the default location when
/// present.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::load_from_file(path);
    }
    match AppConfig::default_path() {
        Some(path) if path.exists() => AppConfig::load_from_file(&path),
        _ => Ok(AppConfig::default()),
    }
}

fn init_logging(debug_mode: bool, config_level: &str) {
    let level = if debug_mode { "debug" } else { config_level };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(cli.debug, &config.log_level);

    if let Err(e) = &loaded {
        error!("Failed to load configuration: {}", e);
        return ExitCode::FAILURE;
    }
    debug!("Starting {} v{}", APP_NAME, VERSION);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    let store_for = |dir: Option<PathBuf>| {
        SysconfigStore::new(dir.unwrap_or_else(|| config.sysconfig_dir.clone()))
    };

    match command {
        Commands::Merge { original, modified } => run_merge(&original, &modified),
        Commands::SetupDhcp {
            devices,
            sysconfig_dir,
        } => run_setup_dhcp(store_for(sysconfig_dir), devices, config),
        Commands::Show {
            device,
            json,
            sysconfig_dir,
        } => run_show(&store_for(sysconfig_dir), &device, json),
        Commands::ProposeNames {
            interface_type,
            count,
            sysconfig_dir,
        } => run_propose_names(&store_for(sysconfig_dir), &interface_type, count),
        Commands::Configure(args) => {
            let mut store = store_for(args.sysconfig_dir.clone());
            let (builder, newly_added) = configure_device(&mut store, &args, config)?;
            if args.json {
                let summary = configure_summary(&builder, newly_added)?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", builder.document());
            }
            Ok(())
        }
        Commands::Backend(args) => run_backend(config, &args),
    }
}

/// Apply the `configure` options to the record of `args.device` and save
/// it. Returns the builder and whether the record was created.
fn configure_device(
    store: &mut SysconfigStore,
    args: &ConfigureArgs,
    config: &AppConfig,
) -> Result<(InterfaceConfigBuilder, bool)> {
    let existing = store.find(&args.device)?;
    let mut builder = match &args.interface_type {
        Some(short_name) => InterfaceConfigBuilder::for_short_name(short_name, existing)?,
        None => InterfaceConfigBuilder::for_type(
            detect_interface_type(config, &args.device),
            existing,
        )?,
    };
    let newly_added = builder.is_newly_added();
    builder.set_name(&args.device);

    if let Some(new_name) = &args.rename {
        if !InterfaceConfigBuilder::valid_name(new_name) {
            return Err(Error::InvalidInterfaceName(new_name.clone()));
        }
        if InterfaceConfigBuilder::name_exists(&*store, new_name)? {
            return Err(Error::configuration(new_name, "configuration already exists"));
        }
        builder.set_name(new_name);
    }

    if let Some(proto) = &args.bootproto {
        builder.set_boot_protocol(proto.parse::<BootProtocol>()?)?;
    }
    if let Some(mode) = &args.startmode {
        builder.set_start_mode(StartMode::create(mode)?)?;
    }
    if let Some(priority) = args.ifplugd_priority {
        builder.set_ifplugd_priority(priority)?;
    }
    if args.port {
        builder.configure_as_port()?;
    }
    if let Some(ip) = &args.ip {
        builder.set_ip_address(ip)?;
    }
    if let Some(prefix) = &args.prefix {
        builder.set_subnet_prefix(prefix)?;
    }
    if let Some(remote) = &args.remote_ip {
        builder.set_remote_ip(remote)?;
    }
    if let Some(hostname) = &args.hostname {
        builder.set_hostname(hostname)?;
    }
    if let Some(mtu) = args.mtu {
        builder.set_mtu(mtu)?;
    }
    if let Some(description) = &args.description {
        builder.set_description(description)?;
    }
    if let Some(options) = &args.ethtool {
        builder.set_ethtool_options(options)?;
    }
    if let Some(zone) = &args.zone {
        builder.set_firewall_zone(zone)?;
    }
    if let Some(driver) = &args.driver {
        builder.set_driver(Some(driver.as_str()))?;
    }
    if args.clear_aliases {
        builder.set_aliases(Vec::new());
    } else if !args.aliases.is_empty() {
        let aliases = alias_entries(builder.aliases(), &args.aliases);
        builder.set_aliases(aliases);
    }
    if let Some(ports) = &args.ports {
        builder.set_ports(ports)?;
    }
    if let Some(options) = &args.bond_options {
        builder.set_bond_options(options)?;
    }
    if let Some(vlan) = &args.vlan {
        let (parent, id) = parse_vlan(vlan)?;
        builder.set_vlan(parent, id)?;
    }
    if let Some(essid) = &args.essid {
        builder.set_essid(essid)?;
    }

    if builder.requires_ip_config() && builder.ip_address().is_empty() {
        return Err(Error::ValidationFailed(format!(
            "{} uses a static boot protocol but has no address",
            builder.name()
        )));
    }

    builder.save(store)?;
    Ok((builder, newly_added))
}

/// Alias entries for `specs` (`ADDR[/PREFIX]`). Addresses that already
/// have an alias keep its id and label.
fn alias_entries(current: &[AliasEntry], specs: &[String]) -> Vec<AliasEntry> {
    specs
        .iter()
        .map(|spec| {
            let (address, prefix) = spec.split_once('/').unwrap_or((spec.as_str(), ""));
            match current.iter().find(|alias| alias.ip_address == address) {
                Some(alias) => AliasEntry {
                    subnet_prefix: prefix.to_string(),
                    ..alias.clone()
                },
                None => AliasEntry::new(address, prefix),
            }
        })
        .collect()
}

/// Split `PARENT:ID`. The tag follows the last colon, as names may hold one.
fn parse_vlan(value: &str) -> Result<(&str, u16)> {
    let (parent, id) = value
        .rsplit_once(':')
        .ok_or_else(|| Error::ValidationFailed(format!("Expected PARENT:ID, got {}", value)))?;
    let id = id
        .parse()
        .map_err(|_| Error::ValidationFailed(format!("Invalid VLAN ID: {}", id)))?;
    Ok((parent, id))
}

fn configure_summary(builder: &InterfaceConfigBuilder, newly_added: bool) -> Result<serde_json::Value> {
    Ok(json!({
        "device": builder.name(),
        "type": builder.interface_type().short_name(),
        "new": newly_added,
        "boot_protocol": builder.boot_protocol()?,
        "start_mode": builder.start_mode()?,
        "ifplugd_priority": builder.ifplugd_priority(),
        "ip_address": builder.ip_address(),
        "subnet_prefix": builder.subnet_prefix(),
        "remote_ip": builder.remote_ip(),
        "hostname": builder.hostname(),
        "mtu": builder.mtu(),
        "description": builder.description(),
        "ethtool_options": builder.ethtool_options(),
        "firewall_zone": builder.firewall_zone(),
        "driver": builder.driver(),
        "aliases": builder.aliases(),
        "ports": builder.ports(),
        "vlan": builder.vlan().map(|(parent, id)| json!({ "parent": parent, "id": id })),
    }))
}

/// Interface type of a detected card, Ethernet for anything unknown.
fn detect_interface_type(config: &AppConfig, device: &str) -> InterfaceType {
    network_utils::detect_network_adapters(&config.sysfs_dir)
        .into_iter()
        .find(|adapter| adapter.name == device)
        .and_then(|adapter| adapter.adapter_type.interface_type())
        .unwrap_or(InterfaceType::Ethernet)
}

fn run_merge(original: &Path, modified: &Path) -> Result<()> {
    let outcome = match sysconfig::merge_files(original, modified)? {
        MergeOutcome::Merged => "merged",
        MergeOutcome::Copied => "copied",
    };
    println!("{}: {}", original.display(), outcome);
    Ok(())
}

fn run_setup_dhcp(mut store: SysconfigStore, devices: Vec<String>, config: &AppConfig) -> Result<()> {
    let runner = ShellRunner::new();
    let mut activator = DhcpActivator::new(&mut store, &runner, config);

    let devices = if devices.is_empty() {
        let adapters = network_utils::detect_network_adapters(&config.sysfs_dir);
        activator.candidates(&adapters)
    } else {
        devices
    };

    let report = activator.run(&devices);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_show(store: &SysconfigStore, device: &str, json: bool) -> Result<()> {
    let config = store
        .find(device)?
        .ok_or_else(|| Error::NotFound(store.path_for(device)))?;

    if json {
        let fields: serde_json::Map<String, serde_json::Value> = config
            .document()
            .attributes()
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::String(value)))
            .collect();
        let output = json!({
            "device": device,
            "boot_protocol": config.boot_protocol()?,
            "start_mode": config.start_mode()?,
            "dhcp": config.boot_protocol()?.is_dhcp(),
            "default_route": config.default_route(),
            "fields": fields,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (key, value) in config.document().attributes() {
            println!("{}={}", key, value);
        }
    }
    Ok(())
}

fn run_propose_names(store: &SysconfigStore, interface_type: &str, count: usize) -> Result<()> {
    let builder = InterfaceConfigBuilder::for_short_name(interface_type, None)?;
    for name in builder.proposed_names(store)?.into_iter().take(count) {
        println!("{}", name);
    }
    Ok(())
}

fn run_backend(config: &AppConfig, args: &BackendArgs) -> Result<()> {
    let facts = network_utils::detect_system_facts();
    let mut proposal = ProposalSettings::new(config, facts, PackageSelection::new(ShellRunner::new()));
    if args.ipv4_forward.is_some() || args.ipv6_forward.is_some() {
        proposal.modify_defaults(NetworkFeatures {
            ipv4_forward: args.ipv4_forward,
            ipv6_forward: args.ipv6_forward,
            ..config.network.clone()
        });
    }
    if let Some(propose) = args.propose_bridge {
        proposal.set_propose_bridge(propose);
    }
    match args.backend {
        Backend::Wicked => proposal.enable_wicked(),
        Backend::NetworkManager => proposal.enable_network_manager(),
        Backend::None => proposal.disable_network(),
    };

    if let Some(path) = &args.sysctl {
        let mut document = sysconfig::io::load_or_default(path)?;
        let mut routing = RoutingConfig::from_document(&document);
        if proposal.apply_defaults(&mut routing) {
            routing.apply_to(&mut document)?;
            sysconfig::io::write(&document, path)?;
            info!("Wrote forwarding defaults to {:?}", path);
        }
    }

    let output = json!({
        "backend": proposal.current_backend(),
        "network_service": proposal.network_service(),
        "packages": proposal.installer().selected(),
        "propose_bridge": proposal.propose_bridge(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keys;
    use std::fs;

    fn parse(args: &[&str]) -> Commands {
        let mut argv = vec!["network-setup"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    fn configure(dir: &Path, args: &[&str]) -> Result<(InterfaceConfigBuilder, bool)> {
        let mut argv = vec!["configure"];
        argv.extend_from_slice(args);
        let args = match parse(&argv) {
            Commands::Configure(args) => args,
            _ => panic!("expected the configure command"),
        };
        let config = AppConfig {
            sysfs_dir: dir.join("no-sysfs"),
            ..AppConfig::default()
        };
        configure_device(&mut SysconfigStore::new(dir), &args, &config)
    }

    #[test]
    fn test_configure_vlan_with_alias() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, newly_added) = configure(
            dir.path(),
            &[
                "vlan10", "--type", "vlan", "--vlan", "eth0:10", "--bootproto", "static",
                "--ip", "192.168.10.2", "--prefix", "24", "--alias", "192.168.10.3/24",
            ],
        )
        .unwrap();

        assert!(newly_added);
        assert_eq!(builder.vlan(), Some(("eth0".to_string(), 10)));
        assert_eq!(builder.aliases()[0].id, "_1");

        let saved = SysconfigStore::new(dir.path()).find("vlan10").unwrap().unwrap();
        assert_eq!(saved.field(keys::ETHERDEVICE), Some("eth0"));
        assert_eq!(saved.field(keys::IPADDR), Some("192.168.10.2/24"));
        assert_eq!(saved.field("IPADDR_1"), Some("192.168.10.3/24"));

        let summary = configure_summary(&builder, newly_added).unwrap();
        assert_eq!(summary["vlan"]["id"], 10);
        assert_eq!(summary["subnet_prefix"], "/24");
        assert_eq!(summary["new"], true);
    }

    #[test]
    fn test_configure_driver_and_rename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ifcfg-eth0"), "BOOTPROTO='dhcp'\n").unwrap();

        let (builder, newly_added) = configure(
            dir.path(),
            &["eth0", "--driver", "e1000e", "--rename", "lan0", "--hostname", "node1.example.org"],
        )
        .unwrap();

        assert!(!newly_added);
        assert_eq!(builder.driver(), Some("e1000e"));
        let store = SysconfigStore::new(dir.path());
        assert_eq!(store.known_names().unwrap(), vec!["lan0"]);
        let saved = store.find("lan0").unwrap().unwrap();
        assert_eq!(saved.field("DRIVER"), Some("e1000e"));
        assert_eq!(saved.field(keys::HOSTNAME), Some("node1.example.org"));
    }

    #[test]
    fn test_configure_bond() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, _) = configure(
            dir.path(),
            &["bond0", "--type", "bond", "--ports", "eth0,eth1", "--bond-options", "mode=802.3ad miimon=100"],
        )
        .unwrap();

        assert_eq!(builder.ports(), vec!["eth0", "eth1"]);
        let saved = SysconfigStore::new(dir.path()).find("bond0").unwrap().unwrap();
        assert_eq!(saved.field(keys::BONDING_MODULE_OPTS), Some("mode=802.3ad miimon=100"));
        assert_eq!(saved.field("BONDING_SLAVE_1"), Some("eth1"));
    }

    #[test]
    fn test_configure_rejections_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ifcfg-eth1"), "BOOTPROTO='dhcp'\n").unwrap();

        assert!(configure(dir.path(), &["br0", "--type", "br", "--driver", "bridge"]).is_err());
        assert!(matches!(
            configure(dir.path(), &["eth0", "--type", "eth", "--rename", "eth1"]),
            Err(Error::Configuration { .. })
        ));
        assert!(configure(dir.path(), &["vlan5", "--type", "vlan", "--vlan", "eth0"]).is_err());
        assert!(matches!(
            configure(dir.path(), &["dummy0", "--type", "dummy"]),
            Err(Error::ValidationFailed(_))
        ));

        let store = SysconfigStore::new(dir.path());
        assert_eq!(store.known_names().unwrap(), vec!["eth1"]);
    }

    #[test]
    fn test_alias_entries_keep_existing_ids() {
        let current = vec![AliasEntry {
            id: "_3".to_string(),
            label: "web".to_string(),
            ip_address: "10.0.0.5".to_string(),
            subnet_prefix: "/24".to_string(),
        }];
        let specs = vec!["10.0.0.5/16".to_string(), "10.0.0.6".to_string()];

        let entries = alias_entries(&current, &specs);

        assert_eq!(entries[0].id, "_3");
        assert_eq!(entries[0].label, "web");
        assert_eq!(entries[0].subnet_prefix, "16");
        assert_eq!(entries[1], AliasEntry::new("10.0.0.6", ""));
    }

    #[test]
    fn test_parse_vlan() {
        assert_eq!(parse_vlan("eth0:10").unwrap(), ("eth0", 10));
        assert_eq!(parse_vlan("eth0:1:20").unwrap(), ("eth0:1", 20));
        assert!(parse_vlan("eth0").is_err());
        assert!(parse_vlan("eth0:ten").is_err());
    }

    #[test]
    fn test_backend_flags() {
        match parse(&["backend", "network-manager", "--ipv4-forward", "true", "--propose-bridge", "false"]) {
            Commands::Backend(args) => {
                assert_eq!(args.backend, Backend::NetworkManager);
                assert_eq!(args.ipv4_forward, Some(true));
                assert_eq!(args.ipv6_forward, None);
                assert_eq!(args.propose_bridge, Some(false));
            }
            _ => panic!("expected the backend command"),
        }
    }
}
