// Network Setup - Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Services that act on the system.
//!
//! - Command: Shell command execution
//! - Packages: Package proposal and queries
//! - Proposal: Network backend proposal
//! - DHCP: Install-time activation of unconfigured cards

pub mod command;
pub mod dhcp;
pub mod packages;
pub mod proposal;

pub use command::ShellRunner;
pub use dhcp::DhcpActivator;
pub use packages::PackageSelection;
pub use proposal::ProposalSettings;
