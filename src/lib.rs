//! # pmg - Puppet module gateway
//!
//! Receives push webhooks from a git server and turns them into r10k
//! deploys on every puppet server.
//!
//! ## How a push is handled
//!
//! 1. `POST /hook` delivers the push payload; only `repository.full_name`
//!    is read.
//! 2. The repository is classified from its bare mirror and its name:
//!    a Puppet module (`metadata.json`, or the legacy `Modulefile`), hiera
//!    data (`*_hiera*`), or one of the `puppet_r10k` / `hiera_r10k` control
//!    repositories.
//! 3. For each resulting deploy, `r10k` runs on every puppet server over
//!    ssh, all servers at once, and the next deploy starts once every
//!    server has finished.
//!
//! ## Quick Start
//!
//! ```bash
//! # Point pmg at the mirrors and the puppet servers
//! export PMG_HOOK__GITHOME=/srv/git
//! export PMG_HOOK__PUPPETSERVERS='[puppet1.example.com, puppet2.example.com]'
//!
//! # See what a push would do
//! pmg classify acme/apache
//!
//! # Serve webhooks on :8666
//! pmg hook
//! ```

pub mod classify;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod git;
pub mod hook;
pub mod parallel;
pub mod remote;
pub mod server;

pub use cli::{Cli, Output};
pub use config::{PmgConfig, Settings};
pub use hook::{HookController, SshHookController};

/// Result type alias for pmg operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
