use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};

use super::Settings;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

pub struct PmgConfig {
    figment: Figment,
}

impl PmgConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        tracing::trace!(custom_config = ?custom_config, "Loading configuration");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        // A custom config replaces the user and working directory files
        if let Some(custom_path) = custom_config {
            figment = match extension(custom_path) {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        } else {
            let user_dir = Self::user_config_dir();
            figment = figment
                .merge(Yaml::file(Self::legacy_user_config_path()))
                .merge(Toml::file(format!("{user_dir}/config.toml")))
                .merge(Json::file(format!("{user_dir}/config.json")))
                .merge(Yaml::file(format!("{user_dir}/config.yaml")))
                .merge(Yaml::file(format!("{user_dir}/config.yml")))
                .merge(Toml::file("pmg.toml"))
                .merge(Json::file("pmg.json"))
                .merge(Yaml::file("pmg.yaml"))
                .merge(Yaml::file("pmg.yml"));
        }

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed("PMG_").split("__"));

        Ok(PmgConfig { figment })
    }

    /// Extract the typed settings used by the hook controller and the server.
    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .context("Failed to extract pmg settings from configuration")
    }

    /// `~/.pmg.yaml`, the location older installs used.
    fn legacy_user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.pmg.yaml"),
            Err(_) => "~/.pmg.yaml".to_string(),
        }
    }

    fn user_config_dir() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/pmg"),
            Err(_) => "~/.config/pmg".to_string(),
        }
    }
}

fn extension(path: &str) -> Option<&str> {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading() {
        let config = PmgConfig::load();
        assert!(config.is_ok(), "Should load default config successfully");
    }

    #[test]
    fn test_config_loads_defaults() {
        let settings = PmgConfig::load_with_custom_config(Some("non_existent.toml"))
            .expect("Should load default config")
            .settings()
            .expect("Defaults should extract");

        assert_eq!(settings.hook.listen, "0.0.0.0:8666");
        assert_eq!(settings.hook.githome.to_str(), Some("/srv"));
        assert_eq!(settings.ssh.user, "root");
        assert!(settings.hook.puppetservers.is_empty());
    }

    #[test]
    fn test_custom_config_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pmg.yaml");
        std::fs::write(
            &path,
            "hook:\n  githome: /var/git\n  puppetservers:\n    - ps1.example.com\n    - ps2.example.com\n",
        )
        .unwrap();

        let config = PmgConfig::load_with_custom_config(path.to_str()).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.hook.githome.to_str(), Some("/var/git"));
        assert_eq!(
            settings.hook.puppetservers,
            vec!["ps1.example.com".to_string(), "ps2.example.com".to_string()]
        );
        // Untouched keys keep their defaults
        assert_eq!(settings.ssh.user, "root");
    }

    #[test]
    fn test_custom_config_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pmgrc");
        std::fs::write(&path, "[hook]\nlisten = \"127.0.0.1:9000\"\n").unwrap();

        let settings = PmgConfig::load_with_custom_config(path.to_str())
            .unwrap()
            .settings()
            .unwrap();
        assert_eq!(settings.hook.listen, "127.0.0.1:9000");
    }
}
