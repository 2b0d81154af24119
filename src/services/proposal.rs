// Network Setup - Proposal Settings
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Network backend proposal.
//!
//! [`ProposalSettings`] decides which network service the installed system
//! uses, keeps the package proposal in line with that choice and applies the
//! product's forwarding defaults. It is built once from the application
//! configuration and passed around explicitly.

use tracing::{debug, info};

use super::packages::PackageInstaller;
use crate::models::proposal::{NETWORK_MANAGER_PACKAGE, WICKED_PACKAGE};
use crate::models::{AppConfig, Backend, NetworkFeatures, RoutingConfig, SystemFacts};

/// Backend and package proposal for the installed system.
#[derive(Debug)]
pub struct ProposalSettings<P: PackageInstaller> {
    installer: P,
    features: NetworkFeatures,
    facts: SystemFacts,
    selected_backend: Option<Backend>,
    virt_bridge_proposal: bool,
    ipv4_forward: Option<bool>,
    ipv6_forward: Option<bool>,
    defaults_applied: bool,
}

impl<P: PackageInstaller> ProposalSettings<P> {
    pub fn new(config: &AppConfig, facts: SystemFacts, installer: P) -> Self {
        Self {
            installer,
            features: config.network.clone(),
            facts,
            selected_backend: config.autoinst.selected_backend,
            virt_bridge_proposal: config.autoinst.virt_bridge_proposal,
            ipv4_forward: config.network.ipv4_forward,
            ipv6_forward: config.network.ipv6_forward,
            defaults_applied: false,
        }
    }

    pub fn installer(&self) -> &P {
        &self.installer
    }

    /// Switch to the network features of another product. Forwarding
    /// defaults the new features leave unset keep their previous value.
    /// They are applied again on the next
    /// [`apply_defaults`](Self::apply_defaults).
    pub fn modify_defaults(&mut self, features: NetworkFeatures) {
        if features.ipv4_forward.is_some() {
            self.ipv4_forward = features.ipv4_forward;
        }
        if features.ipv6_forward.is_some() {
            self.ipv6_forward = features.ipv6_forward;
        }
        self.features = features;
        self.defaults_applied = false;
    }

    /// Apply the forwarding defaults to `routing`, once.
    ///
    /// Returns whether `routing` was modified.
    pub fn apply_defaults(&mut self, routing: &mut RoutingConfig) -> bool {
        if self.defaults_applied {
            return false;
        }
        self.defaults_applied = true;

        let before = *routing;
        if let Some(forward) = self.ipv4_forward {
            routing.forward_ipv4 = forward;
        }
        if let Some(forward) = self.ipv6_forward {
            routing.forward_ipv6 = forward;
        }
        *routing != before
    }

    /// The selected backend, or the product default when none was selected.
    pub fn current_backend(&self) -> Backend {
        self.selected_backend
            .unwrap_or_else(|| self.default_backend())
    }

    /// NetworkManager when the product asks for it and the package is
    /// available, wicked otherwise.
    pub fn default_backend(&self) -> Backend {
        let default = if self.network_manager_available() && self.network_manager_default() {
            Backend::NetworkManager
        } else {
            Backend::Wicked
        };
        info!("The default backend is: {}", default);
        default
    }

    /// Whether a bridge for virtual machines should be proposed.
    pub fn propose_bridge(&self) -> bool {
        self.virtual_proposal_required() && self.virt_bridge_proposal
    }

    pub fn set_propose_bridge(&mut self, propose: bool) {
        info!("Bridge proposal set to: {}", propose);
        self.virt_bridge_proposal = propose;
    }

    pub fn enable_network_manager(&mut self) -> Backend {
        info!("Enabling NetworkManager");
        self.select(Backend::NetworkManager)
    }

    pub fn enable_wicked(&mut self) -> Backend {
        info!("Enabling wicked");
        self.select(Backend::Wicked)
    }

    /// Select no network service at all, dropping both packages from the
    /// proposal.
    pub fn disable_network(&mut self) -> Backend {
        info!("Disabling all network services");
        self.select(Backend::None)
    }

    /// Select `backend` and refresh the package proposal.
    pub fn select(&mut self, backend: Backend) -> Backend {
        self.selected_backend = Some(backend);
        self.refresh_packages();
        backend
    }

    /// Keep the package proposal in line with the current backend: its
    /// package is added, the other backends' packages are removed.
    pub fn refresh_packages(&mut self) {
        let current = self.current_backend();
        let others: Vec<&str> = [Backend::Wicked, Backend::NetworkManager]
            .into_iter()
            .filter(|backend| *backend != current)
            .filter_map(|backend| backend.package())
            .collect();

        if let Some(package) = current.package() {
            self.installer.add_packages(&[package]);
        }
        self.installer.remove_packages(&others);
    }

    pub fn network_manager_available(&self) -> bool {
        self.installer.is_available(NETWORK_MANAGER_PACKAGE)
    }

    /// Whether the selected packages call for a virtualization bridge.
    pub fn virtual_proposal_required(&self) -> bool {
        if self.facts.is_s390 {
            return false;
        }
        (self.installer.is_selected("xen") && self.facts.is_xen_dom0)
            || self.installer.is_selected("kvm")
            || self.installer.is_selected("qemu")
    }

    /// Service that will actually run, falling back to whichever one is
    /// installed when the current backend's package is missing.
    pub fn network_service(&self) -> Backend {
        match self.current_backend() {
            Backend::NetworkManager => {
                if self.installer.is_installed(NETWORK_MANAGER_PACKAGE) {
                    return Backend::NetworkManager;
                }
                info!("NetworkManager is selected but not installed, using wicked");
                Backend::Wicked
            }
            Backend::Wicked => {
                if self.installer.is_installed(WICKED_PACKAGE) {
                    Backend::Wicked
                } else if self.installer.is_installed(NETWORK_MANAGER_PACKAGE) {
                    info!("wicked is selected but not installed, using NetworkManager");
                    Backend::NetworkManager
                } else {
                    Backend::None
                }
            }
            Backend::None => Backend::None,
        }
    }

    fn network_manager_default(&self) -> bool {
        match self.features.network_manager.as_str() {
            "" => self.features.network_manager_is_default,
            "always" => true,
            "laptop" => {
                info!("Is a laptop: {}", self.facts.is_laptop);
                self.facts.is_laptop
            }
            other => {
                debug!("Unknown network_manager setting {:?}", other);
                false
            }
        }
    }
}
