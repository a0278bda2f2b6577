//! Typed settings extracted from the merged configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main configuration structure for pmg
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Webhook and deploy configuration
    pub hook: HookConfig,

    /// Remote shell configuration
    pub ssh: SshConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Webhook and deploy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Address the webhook API binds to
    pub listen: String,

    /// Root directory holding the bare repositories
    pub githome: PathBuf,

    /// Puppet servers every deploy is fanned out to
    #[serde(default)]
    pub puppetservers: Vec<String>,

    /// r10k config for module and environment deploys
    pub puppet_config: PathBuf,

    /// r10k config for hiera data deploys
    pub hiera_config: PathBuf,

    /// Hold a per-repository lock while a push is deployed
    #[serde(default = "default_serialize_per_repository")]
    pub serialize_per_repository: bool,
}

fn default_serialize_per_repository() -> bool {
    true
}

/// Remote shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Remote account commands run as
    pub user: String,

    /// ssh client binary
    pub binary: String,

    /// Extra arguments placed before the destination
    #[serde(default)]
    pub options: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Parsed listen address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.hook
            .listen
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.hook.listen))
    }

    /// Validate configuration.
    ///
    /// Hard errors make the process refuse to start; the returned warnings
    /// describe settings that are legal but probably not what the operator
    /// wants.
    pub fn validate(&self) -> Result<Vec<String>> {
        self.listen_addr()?;

        if self.ssh.user.trim().is_empty() {
            anyhow::bail!("ssh.user cannot be empty");
        }
        if self.ssh.binary.trim().is_empty() {
            anyhow::bail!("ssh.binary cannot be empty");
        }
        if self.hook.puppet_config.as_os_str().is_empty() {
            anyhow::bail!("hook.puppet_config cannot be empty");
        }
        if self.hook.hiera_config.as_os_str().is_empty() {
            anyhow::bail!("hook.hiera_config cannot be empty");
        }

        let mut warnings = Vec::new();
        if self.hook.puppetservers.is_empty() {
            warnings.push("hook.puppetservers is empty, deploys will not reach any server".to_string());
        }
        if self.hook.puppetservers.iter().any(|host| host.trim().is_empty()) {
            warnings.push("hook.puppetservers contains an empty host name".to_string());
        }
        if !self.hook.githome.is_dir() {
            warnings.push(format!(
                "hook.githome {} is not a directory, module metadata cannot be read",
                self.hook.githome.display()
            ));
        }

        Ok(warnings)
    }
}
