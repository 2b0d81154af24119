// Network Setup - Command Execution
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Blocking execution of shell commands.
//!
//! All interaction with the network service (reloading a device, querying
//! its state, probing reachability) goes through [`CommandRunner`], which
//! only reports the exit code.

use std::process::Command;
use tracing::{debug, warn};

use crate::models::{Error, Result};

/// Runs shell commands and reports their exit code.
pub trait CommandRunner {
    /// Run `command` through the shell and wait for it to finish.
    fn execute(&self, command: &str) -> Result<i32>;

    /// Run `command` and report whether it exited with status 0.
    /// Failures to spawn count as unsuccessful.
    fn succeeds(&self, command: &str) -> bool {
        match self.execute(command) {
            Ok(code) => code == 0,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}

/// Runner executing commands with `sh -c`.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellRunner {
    fn execute(&self, command: &str) -> Result<i32> {
        debug!("Executing: {}", command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| Error::command_failed(command, e.to_string()))?;

        // Killed by a signal
        let code = output.status.code().unwrap_or(-1);
        if code != 0 {
            debug!(
                "Command '{}' exited with {}: {}",
                command,
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(code)
    }
}

/// Scripted runner for tests.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Answers commands from a list of `(substring, exit code)` rules; the
    /// first rule contained in the command wins, anything else exits 0.
    /// Every command is recorded.
    #[derive(Debug, Default)]
    pub struct ScriptedRunner {
        rules: Vec<(String, i32)>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make commands containing `pattern` exit with `code`.
        pub fn on(mut self, pattern: &str, code: i32) -> Self {
            self.rules.push((pattern.to_string(), code));
            self
        }

        pub fn count(&self, pattern: &str) -> usize {
            self.calls.borrow().iter().filter(|c| c.contains(pattern)).count()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn execute(&self, command: &str) -> Result<i32> {
            self.calls.borrow_mut().push(command.to_string());
            Ok(self
                .rules
                .iter()
                .find(|(pattern, _)| command.contains(pattern.as_str()))
                .map(|(_, code)| *code)
                .unwrap_or(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_runner_exit_codes() {
        let runner = ShellRunner::new();
        assert_eq!(runner.execute("true").unwrap(), 0);
        assert_eq!(runner.execute("exit 3").unwrap(), 3);
        assert!(runner.succeeds("echo up | grep 'up$'"));
        assert!(!runner.succeeds("echo down | grep 'up$'"));
    }

    #[test]
    fn test_scripted_runner_rules() {
        let runner = testing::ScriptedRunner::new().on("eth1", 1);
        assert!(runner.succeeds("wicked ifreload 'eth0'"));
        assert!(!runner.succeeds("wicked ifreload 'eth1'"));
        assert_eq!(runner.count("ifreload"), 2);
    }
}
