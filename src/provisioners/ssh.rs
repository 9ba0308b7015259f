//! Remote command execution over `ssh`.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::driver::SshTarget;
use crate::error::RsmachineError;
use crate::executor::{CommandExecutor, CommandSpec};

/// Options passed to every `ssh` invocation.
///
/// Machines are recreated freely, so host keys are neither checked nor recorded.
const SSH_OPTIONS: &[&str] = &[
    "-F",
    "/dev/null",
    "-o",
    "ConnectionAttempts=3",
    "-o",
    "ConnectTimeout=10",
    "-o",
    "ControlMaster=no",
    "-o",
    "ControlPath=none",
    "-o",
    "LogLevel=quiet",
    "-o",
    "PasswordAuthentication=no",
    "-o",
    "ServerAliveInterval=60",
    "-o",
    "StrictHostKeyChecking=no",
    "-o",
    "UserKnownHostsFile=/dev/null",
];

/// Quotes a string for safe use as a single POSIX shell word.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Runs shell commands on a machine through the `ssh` client.
#[derive(Clone)]
pub struct SshRunner {
    target: SshTarget,
    executor: Arc<dyn CommandExecutor>,
}

impl SshRunner {
    pub fn new(target: SshTarget, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { target, executor }
    }

    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    /// Builds the `ssh` command spec for a remote shell command.
    pub fn command_spec(&self, command: &str) -> CommandSpec {
        let mut args: Vec<String> = SSH_OPTIONS.iter().map(|s| s.to_string()).collect();
        if let Some(key) = &self.target.key_path {
            args.extend([
                "-o".to_string(),
                "IdentitiesOnly=yes".to_string(),
                "-i".to_string(),
                key.to_string(),
            ]);
        }
        args.extend([
            "-p".to_string(),
            self.target.port.to_string(),
            format!("{}@{}", self.target.user, self.target.hostname),
            "--".to_string(),
            command.to_string(),
        ]);
        CommandSpec::new("ssh", args)
    }

    /// Runs a command on the machine and returns its standard output.
    pub fn run(&self, command: &str) -> Result<String> {
        self.execute(self.command_spec(command))
    }

    /// Runs a command on the machine with `stdin` piped to it.
    pub fn run_with_stdin(&self, command: &str, stdin: &str) -> Result<String> {
        self.execute(self.command_spec(command).with_stdin(stdin))
    }

    fn execute(&self, spec: CommandSpec) -> Result<String> {
        let remote = spec.args.last().cloned().unwrap_or_default();
        debug!("ssh {}@{}: {}", self.target.user, self.target.hostname, remote);

        let result = self.executor.execute(&spec)?;
        if !result.success() {
            return Err(RsmachineError::Execution {
                command: format!("ssh {}@{}: {}", self.target.user, self.target.hostname, remote),
                status: result.code().map_or_else(
                    || "terminated by signal".to_string(),
                    |c| format!("exit status: {}", c),
                ),
            }
            .into());
        }
        Ok(result.stdout)
    }
}
