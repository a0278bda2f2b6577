//! Configuration management for pmg
//!
//! Settings are layered with figment (embedded defaults, config files,
//! `PMG_` environment variables) and extracted once at startup into the
//! immutable [`Settings`] value that the rest of the crate borrows from.

mod core;
mod settings;

pub use self::core::PmgConfig;
pub use settings::{HookConfig, LoggingConfig, Settings, SshConfig};
