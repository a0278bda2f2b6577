//! Command implementations for the pmg CLI
//!
//! Each command is organized into its own module.

pub mod classify;
pub mod config;
pub mod deploy;
pub mod hook;
pub mod version;

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `-q`, then `-v` flags, then `logging.filter`.
pub fn setup_logging(settings: &Settings, verbose: u8, quiet: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(settings, verbose, quiet))
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .init();
}

fn log_filter(settings: &Settings, verbose: u8, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::try_new(&settings.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug,hyper=info"),
        _ => EnvFilter::new("trace"),
    }
}
