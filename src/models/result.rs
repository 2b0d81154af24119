// Network Setup - Activation Results
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Result types for the DHCP activation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single step for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step has not run.
    #[default]
    Pending,
    /// Step completed successfully.
    Success,
    /// Step failed.
    Error,
    /// Step was skipped.
    Skipped,
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome of the activation run for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResult {
    pub device: String,
    /// DHCP configuration written.
    pub configured: StepStatus,
    /// Device came up after reload.
    pub activated: StepStatus,
    /// Final `DHCLIENT_SET_DEFAULT_ROUTE` value, if one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_route: Option<bool>,
    /// Whether the persisted configuration was removed again.
    pub rolled_back: bool,
    /// Errors collected for this device.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl DeviceResult {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            configured: StepStatus::Pending,
            activated: StepStatus::Pending,
            default_route: None,
            rolled_back: false,
            errors: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.activated.is_success()
    }
}

/// Overall result of a DHCP activation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationReport {
    /// Per-device results, in processing order.
    pub devices: Vec<DeviceResult>,
    /// Device chosen to own the default route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_route_device: Option<String>,
    /// Summary message.
    pub message: String,
    /// Total execution duration in milliseconds.
    pub total_duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ActivationReport {
    /// Create a report with a pending entry for every candidate device.
    pub fn new<S: AsRef<str>>(devices: &[S]) -> Self {
        let now = Utc::now();
        Self {
            devices: devices.iter().map(|d| DeviceResult::new(d.as_ref())).collect(),
            default_route_device: None,
            message: String::new(),
            total_duration_ms: 0,
            started_at: now,
            completed_at: now,
        }
    }

    /// Result entry of `device`, created on first use.
    pub fn device_mut(&mut self, device: &str) -> &mut DeviceResult {
        if let Some(idx) = self.devices.iter().position(|d| d.device == device) {
            &mut self.devices[idx]
        } else {
            self.devices.push(DeviceResult::new(device));
            let last = self.devices.len() - 1;
            &mut self.devices[last]
        }
    }

    /// Record an error for `device`.
    pub fn record_error(&mut self, device: &str, error: impl ToString) {
        self.device_mut(device).errors.push(error.to_string());
    }

    /// Devices that ended up active.
    pub fn active_devices(&self) -> Vec<&str> {
        self.devices
            .iter()
            .filter(|d| d.is_active())
            .map(|d| d.device.as_str())
            .collect()
    }

    /// Count devices with at least one error.
    pub fn error_count(&self) -> usize {
        self.devices.iter().filter(|d| !d.errors.is_empty()).count()
    }

    /// Finalize the report, computing duration and summary.
    pub fn finalize(&mut self) {
        self.completed_at = Utc::now();
        self.total_duration_ms = (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;

        let active = self.active_devices().len();
        self.message = match (&self.default_route_device, self.error_count()) {
            (Some(route), 0) => format!(
                "{} of {} device(s) active, default route via {}",
                active,
                self.devices.len(),
                route
            ),
            (None, 0) => format!("{} of {} device(s) active", active, self.devices.len()),
            (_, errors) => format!(
                "{} of {} device(s) active, {} device(s) reported errors",
                active,
                self.devices.len(),
                errors
            ),
        };
    }
}
