// Network Setup - Interface Configuration Storage
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Persisted per-device interface configuration.
//!
//! [`SysconfigStore`] keeps one `ifcfg-<device>` file per device in the
//! sysconfig network directory. Records are handed out by value and written
//! back explicitly with [`InterfaceStore::save`]; there is no notion of a
//! currently selected device.

use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::models::validation::is_valid_interface_name;
use crate::models::{Error, InterfaceConfig, Result};
use crate::sysconfig::io;

/// Prefix of interface configuration files.
pub const IFCFG_PREFIX: &str = "ifcfg-";

/// Suffixes of editor and package manager leftovers that are not configs.
const IGNORED_SUFFIXES: &[&str] = &["~", ".bak", ".orig", ".old", ".rpmnew", ".rpmsave", ".scpmbackup"];

/// Store of persisted interface configuration records.
pub trait InterfaceStore {
    /// Look up the record of `device`.
    fn find(&self, device: &str) -> Result<Option<InterfaceConfig>>;

    /// Create a new, not yet persisted, record for `device`.
    fn create(&mut self, device: &str) -> Result<InterfaceConfig>;

    /// Persist `config`.
    fn save(&mut self, config: &InterfaceConfig) -> Result<()>;

    /// Delete the record of `device`. Returns whether one existed.
    fn delete(&mut self, device: &str) -> Result<bool>;

    /// Names of all devices with a persisted record, sorted.
    fn known_names(&self) -> Result<Vec<String>>;

    /// Propose `count` unused names of the form `<prefix><n>`, lowest first.
    fn free_names(&self, prefix: &str, count: usize) -> Result<Vec<String>> {
        let known = self.known_names()?;
        Ok((0..)
            .map(|n| format!("{}{}", prefix, n))
            .filter(|name| !known.contains(name))
            .take(count)
            .collect())
    }

    /// Whether `device` has a persisted record.
    fn is_configured(&self, device: &str) -> Result<bool> {
        Ok(self.find(device)?.is_some())
    }
}

/// Interface store backed by a sysconfig network directory.
#[derive(Debug, Clone)]
pub struct SysconfigStore {
    dir: PathBuf,
}

impl SysconfigStore {
    /// Create a store over `dir` (usually `/etc/sysconfig/network`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the configuration file of `device`.
    pub fn path_for(&self, device: &str) -> PathBuf {
        self.dir.join(format!("{}{}", IFCFG_PREFIX, device))
    }

    fn check_name(device: &str) -> Result<()> {
        if is_valid_interface_name(device) {
            Ok(())
        } else {
            Err(Error::configuration(device, "invalid interface name"))
        }
    }
}

impl InterfaceStore for SysconfigStore {
    fn find(&self, device: &str) -> Result<Option<InterfaceConfig>> {
        Self::check_name(device)?;
        match io::load(&self.path_for(device)) {
            Ok(document) => Ok(Some(InterfaceConfig::from_document(device, document))),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create(&mut self, device: &str) -> Result<InterfaceConfig> {
        Self::check_name(device)?;
        if self.path_for(device).exists() {
            return Err(Error::configuration(device, "configuration already exists"));
        }
        debug!("Creating configuration record for {}", device);
        Ok(InterfaceConfig::new(device))
    }

    fn save(&mut self, config: &InterfaceConfig) -> Result<()> {
        Self::check_name(config.name())?;
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(config.name());
        // Wireless configs may hold keys
        io::write_private(config.document(), &path)?;
        info!("Saved configuration of {} to {:?}", config.name(), path);
        Ok(())
    }

    fn delete(&mut self, device: &str) -> Result<bool> {
        Self::check_name(device)?;
        let path = self.path_for(device);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted configuration of {}", device);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn known_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().to_string();
                let name = file_name.strip_prefix(IFCFG_PREFIX)?;
                if IGNORED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                    return None;
                }
                is_valid_interface_name(name).then(|| name.to_string())
            })
            .collect();
        names.sort();
        Ok(names)
    }
}
