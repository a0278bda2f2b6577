//! Remote command execution over ssh
//!
//! Every deploy ends up as one `ssh <user>@<host> <command>` per puppet
//! server. [`RemoteExecutor`] is the seam the fan-out dispatcher drives, so
//! tests can substitute a fake without spawning processes.

use std::future::Future;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;

use crate::config::SshConfig;

/// Errors from running a command on a remote host.
///
/// Both variants carry whatever standard output was captured so the caller
/// can log it next to the failure.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The ssh client could not be started at all.
    #[error("failed to start {binary} for {host}: {source}")]
    Spawn {
        host: String,
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// ssh exited unsuccessfully: unreachable host, rejected key or a failing
    /// remote command all land here.
    #[error("command on {host} exited with {status}: {stderr}")]
    Failed {
        host: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

impl ExecutionError {
    /// Standard output captured before the failure
    pub fn output(&self) -> &str {
        match self {
            ExecutionError::Spawn { .. } => "",
            ExecutionError::Failed { stdout, .. } => stdout,
        }
    }
}

/// Runs one command on one remote host.
pub trait RemoteExecutor: Send + Sync + 'static {
    /// Run `command` on `host` and return its standard output.
    fn execute(
        &self,
        host: &str,
        command: &str,
    ) -> impl Future<Output = Result<String, ExecutionError>> + Send;
}

/// [`RemoteExecutor`] backed by the system ssh client.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    user: String,
    binary: String,
    options: Vec<String>,
}

impl SshExecutor {
    pub fn new(config: &SshConfig) -> Self {
        Self {
            user: config.user.clone(),
            binary: config.binary.clone(),
            options: config.options.clone(),
        }
    }

    /// `user@host` destination for `host`
    pub fn destination(&self, host: &str) -> String {
        format!("{}@{}", self.user, host)
    }

    fn command(&self, host: &str, command: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.options)
            .arg(self.destination(host))
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl RemoteExecutor for SshExecutor {
    async fn execute(&self, host: &str, command: &str) -> Result<String, ExecutionError> {
        tracing::debug!(host, command, "Running remote command");

        let output = self
            .command(host, command)
            .output()
            .await
            .map_err(|source| ExecutionError::Spawn {
                host: host.to_string(),
                binary: self.binary.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            Err(ExecutionError::Failed {
                host: host.to_string(),
                status: output.status,
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(binary: &str) -> SshConfig {
        SshConfig {
            user: "root".to_string(),
            binary: binary.to_string(),
            options: vec![],
        }
    }

    #[test]
    fn test_destination_uses_configured_user() {
        let executor = SshExecutor::new(&SshConfig {
            user: "deploy".to_string(),
            binary: "ssh".to_string(),
            options: vec!["-o".to_string(), "BatchMode=yes".to_string()],
        });
        assert_eq!(executor.destination("ps1.example.com"), "deploy@ps1.example.com");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let executor = SshExecutor::new(&config("/nonexistent/pmg-test-ssh"));
        let err = executor.execute("ps1", "true").await.unwrap_err();

        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert_eq!(err.output(), "");
    }

    // `echo` stands in for ssh: it prints the destination and command back.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let executor = SshExecutor::new(&config("echo"));
        let output = executor.execute("ps1", "r10k deploy environment -p").await.unwrap();

        assert_eq!(output.trim(), "root@ps1 r10k deploy environment -p");
    }

    // `false` ignores its arguments and exits 1, like a failed remote command.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let executor = SshExecutor::new(&config("false"));
        let err = executor.execute("ps1", "r10k").await.unwrap_err();

        match err {
            ExecutionError::Failed { host, status, .. } => {
                assert_eq!(host, "ps1");
                assert!(!status.success());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
