//! Deploy categories and the r10k commands they map to

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::config::HookConfig;

/// Kind of deploy a push can cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployCategory {
    ModuleUpdate,
    HieraUpdate,
    PuppetEnvironmentUpdate,
    HieraEnvironmentUpdate,
}

impl DeployCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployCategory::ModuleUpdate => "module_update",
            DeployCategory::HieraUpdate => "hiera_update",
            DeployCategory::PuppetEnvironmentUpdate => "puppet_environment_update",
            DeployCategory::HieraEnvironmentUpdate => "hiera_environment_update",
        }
    }
}

impl fmt::Display for DeployCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deploy that a classified push asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum DeployTrigger {
    /// Deploy one Puppet module, by short name
    Module { module: String },
    /// Deploy a hiera data repository, by bare repository name
    Hiera { module: String },
    /// Redeploy all puppet environments
    PuppetEnvironment,
    /// Redeploy all hiera environments
    HieraEnvironment,
}

impl DeployTrigger {
    pub fn category(&self) -> DeployCategory {
        match self {
            DeployTrigger::Module { .. } => DeployCategory::ModuleUpdate,
            DeployTrigger::Hiera { .. } => DeployCategory::HieraUpdate,
            DeployTrigger::PuppetEnvironment => DeployCategory::PuppetEnvironmentUpdate,
            DeployTrigger::HieraEnvironment => DeployCategory::HieraEnvironmentUpdate,
        }
    }

    /// The module or repository name the deploy targets, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            DeployTrigger::Module { module } | DeployTrigger::Hiera { module } => Some(module.as_str()),
            DeployTrigger::PuppetEnvironment | DeployTrigger::HieraEnvironment => None,
        }
    }

    /// Build the r10k command line for this trigger
    pub fn command(&self, paths: &R10kPaths) -> String {
        match self {
            DeployTrigger::Module { module } => {
                format!("r10k deploy module {module} --config {}", paths.puppet.display())
            }
            DeployTrigger::Hiera { module } => {
                format!("r10k deploy module {module} --config {}", paths.hiera.display())
            }
            DeployTrigger::PuppetEnvironment => {
                format!("r10k deploy environment -p --config {}", paths.puppet.display())
            }
            DeployTrigger::HieraEnvironment => {
                format!("r10k deploy environment -p --config {}", paths.hiera.display())
            }
        }
    }
}

/// r10k configuration files on the puppet servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R10kPaths {
    pub puppet: PathBuf,
    pub hiera: PathBuf,
}

impl From<&HookConfig> for R10kPaths {
    fn from(config: &HookConfig) -> Self {
        Self {
            puppet: config.puppet_config.clone(),
            hiera: config.hiera_config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> R10kPaths {
        R10kPaths {
            puppet: PathBuf::from("/etc/r10k/puppet_r10k.yaml"),
            hiera: PathBuf::from("/etc/r10k/hiera_r10k.yaml"),
        }
    }

    #[test]
    fn test_module_commands() {
        let module = DeployTrigger::Module { module: "apache".into() };
        let hiera = DeployTrigger::Hiera { module: "infra_hiera".into() };

        assert_eq!(
            module.command(&paths()),
            "r10k deploy module apache --config /etc/r10k/puppet_r10k.yaml"
        );
        assert_eq!(
            hiera.command(&paths()),
            "r10k deploy module infra_hiera --config /etc/r10k/hiera_r10k.yaml"
        );
    }

    #[test]
    fn test_environment_commands() {
        assert_eq!(
            DeployTrigger::PuppetEnvironment.command(&paths()),
            "r10k deploy environment -p --config /etc/r10k/puppet_r10k.yaml"
        );
        assert_eq!(
            DeployTrigger::HieraEnvironment.command(&paths()),
            "r10k deploy environment -p --config /etc/r10k/hiera_r10k.yaml"
        );
    }

    #[test]
    fn test_categories_and_targets() {
        let module = DeployTrigger::Module { module: "ntp".into() };
        assert_eq!(module.category(), DeployCategory::ModuleUpdate);
        assert_eq!(module.target(), Some("ntp"));
        assert_eq!(DeployTrigger::HieraEnvironment.target(), None);
        assert_eq!(
            DeployTrigger::PuppetEnvironment.category().to_string(),
            "puppet_environment_update"
        );
    }

    #[test]
    fn test_trigger_serializes_with_category_tag() {
        let json = serde_json::to_value(DeployTrigger::Hiera { module: "x_hiera".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"category": "hiera", "module": "x_hiera"}));
    }
}
