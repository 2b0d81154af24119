// Network Setup - Package Proposal
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Packages proposed for installation by the network setup.

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::command::CommandRunner;

/// Selects packages for installation and answers package queries.
pub trait PackageInstaller {
    /// Add packages to the proposal.
    fn add_packages(&mut self, names: &[&str]);

    /// Remove packages from the proposal.
    fn remove_packages(&mut self, names: &[&str]);

    /// Whether a package is currently proposed for installation.
    fn is_selected(&self, name: &str) -> bool;

    /// Whether a package is installed on the system.
    fn is_installed(&self, name: &str) -> bool;

    /// Whether a package can be installed from the configured repositories.
    fn is_available(&self, name: &str) -> bool;
}

/// Package proposal backed by `rpm`/`zypper` queries.
#[derive(Debug)]
pub struct PackageSelection<R: CommandRunner> {
    runner: R,
    selected: BTreeSet<String>,
}

impl<R: CommandRunner> PackageSelection<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            selected: BTreeSet::new(),
        }
    }

    /// Currently proposed packages, sorted.
    pub fn selected(&self) -> Vec<&str> {
        self.selected.iter().map(String::as_str).collect()
    }
}

impl<R: CommandRunner> PackageInstaller for PackageSelection<R> {
    fn add_packages(&mut self, names: &[&str]) {
        for name in names {
            if self.selected.insert(name.to_string()) {
                info!("Proposing package {} for installation", name);
            }
        }
    }

    fn remove_packages(&mut self, names: &[&str]) {
        for name in names {
            if self.selected.remove(*name) {
                info!("Removing package {} from the proposal", name);
            }
        }
    }

    fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    fn is_installed(&self, name: &str) -> bool {
        let installed = self.runner.succeeds(&format!("rpm -q --quiet {}", name));
        debug!("Package {} installed: {}", name, installed);
        installed
    }

    fn is_available(&self, name: &str) -> bool {
        let available = self.runner.succeeds(&format!(
            "zypper --non-interactive --quiet search --match-exact -t package {}",
            name
        ));
        if !available {
            info!("The {} package is not available", name);
        }
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::command::testing::ScriptedRunner;

    #[test]
    fn test_add_and_remove() {
        let mut selection = PackageSelection::new(ScriptedRunner::new());
        selection.add_packages(&["wicked", "NetworkManager"]);
        selection.remove_packages(&["wicked", "not-there"]);

        assert_eq!(selection.selected(), vec!["NetworkManager"]);
        assert!(selection.is_selected("NetworkManager"));
        assert!(!selection.is_selected("wicked"));
    }

    #[test]
    fn test_queries_use_exit_codes() {
        let selection = PackageSelection::new(
            ScriptedRunner::new()
                .on("rpm -q --quiet NetworkManager", 1)
                .on("search --match-exact -t package NetworkManager", 104),
        );

        assert!(selection.is_installed("wicked"));
        assert!(!selection.is_installed("NetworkManager"));
        assert!(selection.is_available("wicked"));
        assert!(!selection.is_available("NetworkManager"));
    }
}
