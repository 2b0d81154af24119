// Network Setup - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for the network setup tool.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for network setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for network setup operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // Sysconfig File Errors
    // ========================================
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse {} at line {line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid sysconfig key: {0}")]
    InvalidKey(String),

    // ========================================
    // Interface Configuration Errors
    // ========================================
    #[error("Failed to save configuration for device {device}: {reason}")]
    Configuration { device: String, reason: String },

    #[error("Invalid interface name: {0}")]
    InvalidInterfaceName(String),

    #[error("Unknown interface type: {0}")]
    UnknownInterfaceType(String),

    // ========================================
    // Validation Errors
    // ========================================
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    // ========================================
    // Command Errors
    // ========================================
    #[error("Command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    // ========================================
    // Configuration File Errors
    // ========================================
    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    #[error("Failed to write configuration: {0}")]
    ConfigWriteFailed(String),

    // ========================================
    // System Errors
    // ========================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error for a device.
    pub fn configuration(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Create a new command failed error.
    pub fn command_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Map an IO error on `path` to `NotFound` when the file is missing.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.into())
        } else {
            Self::Io(err)
        }
    }

    /// Check if this error means the file could not be read at all,
    /// as opposed to being read but not understood.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Io(_))
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

// Convert from toml serialize errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigWriteFailed(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigWriteFailed(err.to_string())
    }
}
