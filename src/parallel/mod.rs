//! Concurrent fan-out of remote commands
//!
//! A deploy has to reach every puppet server, and the servers are independent
//! of each other: one of them being unreachable must not hold back the rest.
//! The dispatcher therefore starts one task per host and then waits for all
//! of them, so the caller still knows when the whole round has finished.
//!
//! ```text
//!                      ┌──▶ task(ps1) ── ssh root@ps1 <command> ──┐
//! dispatch(hosts, cmd) ├──▶ task(ps2) ── ssh root@ps2 <command> ──┼──▶ barrier ──▶ return
//!                      └──▶ task(ps3) ── ssh root@ps3 <command> ──┘
//! ```
//!
//! There is no aggregate result. Each outcome is logged as soon as its task
//! completes, and a failed host never cancels or delays its siblings.
//!
//! # Example
//!
//! ```rust,no_run
//! use pmg::config::SshConfig;
//! use pmg::parallel::FanOutDispatcher;
//! use pmg::remote::SshExecutor;
//!
//! # async fn run() {
//! let ssh = SshConfig { user: "root".into(), binary: "ssh".into(), options: vec![] };
//! let dispatcher = FanOutDispatcher::new(SshExecutor::new(&ssh));
//! let hosts = vec!["ps1.example.com".to_string(), "ps2.example.com".to_string()];
//! dispatcher
//!     .dispatch(&hosts, "r10k deploy environment -p --config /etc/r10k/puppet_r10k.yaml")
//!     .await;
//! # }
//! ```

pub mod dispatcher;

pub use dispatcher::FanOutDispatcher;
