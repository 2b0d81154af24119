// Network Setup - Data Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Network Setup Data Models
//!
//! Shared types used across the tool:
//!
//! - **Interface**: Interface types, boot protocols, start modes and the
//!   persisted `ifcfg` record
//! - **Adapter**: Detected network cards
//! - **Proposal**: Backend selection, routing defaults, system facts
//! - **Config**: Application configuration
//! - **Result**: DHCP activation report
//! - **Error**: Shared error types

pub mod adapter;
pub mod config;
pub mod error;
pub mod interface;
pub mod proposal;
pub mod result;
pub mod validation;

// Re-export main types for convenience
pub use adapter::{AdapterInfo, AdapterType};
pub use config::{AppConfig, CommandConfig, NetworkFeatures};
pub use error::{Error, Result};
pub use interface::{keys, BootProtocol, InterfaceConfig, InterfaceType, IpAlias, StartMode};
pub use proposal::{Backend, RoutingConfig, SystemFacts};
pub use result::{ActivationReport, StepStatus};

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "network-setup";
