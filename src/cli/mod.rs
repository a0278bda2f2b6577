//! Command-line interface for pmg
//!
//! This module provides the main CLI structure and command handling. It uses
//! clap for argument parsing; `pmg hook` is what runs in production.

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};

mod commands;
mod output;

pub use output::Output;

use crate::config::{PmgConfig, Settings};

/// pmg - deploy Puppet modules and r10k environments from push webhooks
#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "Deploy Puppet modules and r10k environments from git push webhooks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (default: ~/.pmg.yaml, ~/.config/pmg/config.*, ./pmg.*)
    #[arg(short, long, value_name = "FILE", global = true, env = "PMG_CONFIG")]
    pub config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors, both on the terminal and in the log
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook API
    Hook {
        /// Address to bind to, overrides hook.listen
        #[arg(short, long, value_name = "ADDR")]
        listen: Option<String>,
    },
    /// Classify a repository and deploy it now, as if it had been pushed
    Deploy {
        /// Repository as <org>/<repo>
        repository: String,
    },
    /// Show what a push of a repository would deploy, without running anything
    Classify {
        /// Repository as <org>/<repo>
        repository: String,
    },
    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Show version information
    Version,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration
    Show,
    /// Validate configuration
    Validate,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let Cli {
            config,
            verbose,
            quiet,
            command,
        } = self;
        let output = Output::new(verbose > 0, quiet);
        let config = config.as_deref();

        match command {
            Some(Commands::Hook { listen }) => {
                let settings = load_settings(config)?;
                commands::setup_logging(&settings, verbose, quiet);
                commands::hook::execute(settings, listen, &output).await
            }
            Some(Commands::Deploy { repository }) => {
                let settings = load_settings(config)?;
                commands::setup_logging(&settings, verbose, quiet);
                commands::deploy::execute(&settings, &repository, &output).await
            }
            Some(Commands::Classify { repository }) => {
                let settings = load_settings(config)?;
                commands::setup_logging(&settings, verbose, quiet);
                commands::classify::execute(&settings, &repository, &output).await
            }
            Some(Commands::Config(cmd)) => {
                let config = PmgConfig::load_with_custom_config(config)?;
                commands::config::execute(cmd, &config, &output).await
            }
            Some(Commands::Version) => commands::version::execute(&output).await,
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

fn load_settings(config: Option<&str>) -> Result<Settings> {
    PmgConfig::load_with_custom_config(config)?.settings()
}
