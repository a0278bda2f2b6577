//! Configuration command implementations

use anyhow::{Context, Result};

use crate::cli::{ConfigCommands, Output};
use crate::config::PmgConfig;

/// Execute config commands
pub async fn execute(cmd: ConfigCommands, config: &PmgConfig, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config, output).await,
        ConfigCommands::Validate => validate(config, output).await,
    }
}

async fn show(config: &PmgConfig, output: &Output) -> Result<()> {
    let settings = config.settings()?;
    let rendered = toml::to_string_pretty(&settings).context("Failed to serialize configuration")?;
    output.raw(rendered.trim_end());
    Ok(())
}

async fn validate(config: &PmgConfig, output: &Output) -> Result<()> {
    output.header("✅ Validating Configuration");

    let settings = match config.settings() {
        Ok(settings) => settings,
        Err(err) => {
            output.error("Configuration is invalid");
            return Err(err);
        }
    };

    let warnings = match settings.validate() {
        Ok(warnings) => warnings,
        Err(err) => {
            output.error("Configuration is invalid");
            return Err(err);
        }
    };

    output.success("Configuration is valid");
    output.key_value("Listen:", &settings.hook.listen, false);
    output.key_value("Repositories:", &settings.hook.githome.display().to_string(), false);
    output.key_value("Puppet servers:", &settings.hook.puppetservers.len().to_string(), true);
    output.key_value("SSH:", &format!("{} as {}", settings.ssh.binary, settings.ssh.user), false);

    for warning in &warnings {
        output.warning(warning);
    }
    output.verbose(&format!("{} warning(s)", warnings.len()));

    Ok(())
}
