//! SSH + sudo command runner

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::DeployerError;

/// Captured result of a remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs shell commands as another user on the bastion host
///
/// A non-zero exit code is not an error; callers inspect [`CommandOutput`].
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    async fn sudo(&self, user: &str, command: &str) -> Result<CommandOutput, DeployerError>;
}

/// Runner backed by the local `ssh` client
#[derive(Debug, Clone)]
pub struct SshRunner {
    host: String,
    sudo_prefix: String,
}

impl SshRunner {
    pub fn new(host: impl Into<String>, sudo_prefix: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            sudo_prefix: sudo_prefix.into(),
        }
    }

    /// Remote command line handed to ssh
    pub fn remote_command(&self, user: &str, command: &str) -> String {
        format!(
            "{} -u {} /bin/bash -c {}",
            self.sudo_prefix,
            shell_quote(user),
            shell_quote(command)
        )
    }

    /// The `ssh` invocation; the child is killed if the run is cancelled
    pub fn command(&self, user: &str, command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(["-o", "BatchMode=yes", self.host.as_str()])
            .arg(self.remote_command(user, command))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl RemoteRunner for SshRunner {
    async fn sudo(&self, user: &str, command: &str) -> Result<CommandOutput, DeployerError> {
        debug!("ssh {} as {}: {}", self.host, user, command);

        let output = self
            .command(user, command)
            .output()
            .await
            .map_err(|e| DeployerError::RemoteError(format!("Failed to run ssh: {}", e)))?;

        // ssh reports its own connection failures with 255
        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code == 255 {
            return Err(DeployerError::RemoteError(format!(
                "ssh to {} failed: {}",
                self.host,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Quote a string for a POSIX shell
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
