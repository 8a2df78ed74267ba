// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap
//!
//! The bootstrap crate sits **outside** `spine`'s application/infrastructure
//! layers and owns everything a process needs before the substrate itself
//! can run:
//!
//! - **Entry point** (`main.rs`) — the composition root
//! - **CLI** ([`cli`]) — argv parsing and validation
//! - **Configuration** ([`config`]) — resolves `--config`/env into an `AppConfig`
//! - **Platform abstraction** ([`platform`]) — OS-specific operations (POSIX vs Windows)
//! - **Signal handling** ([`signals`]) — SIGTERM/SIGINT to a shutdown watch channel
//! - **Shutdown coordination** ([`shutdown`]) — grace period and cancellation tokens
//! - **Exit codes** ([`exit_code`]) — maps `SpineError` onto a process exit code
//! - **Bootstrap logging** ([`logger`]) — a minimal logger for messages before
//!   `AppConfig` (and therefore `spine::infrastructure::logging`) is available
//!
//! ## Usage
//!
//! ```no_run
//! use spine_bootstrap::{bootstrap_cli, result_to_exit_code};
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let cli = match bootstrap_cli() {
//!         Ok(cli) => cli,
//!         Err(e) => {
//!             eprintln!("argument error: {e}");
//!             return std::process::ExitCode::FAILURE;
//!         }
//!     };
//!     // wire spine's dispatcher/runner/scheduler from cli.config, dispatch
//!     // cli.command, then map the outcome with result_to_exit_code.
//!     let _ = cli;
//!     std::process::ExitCode::SUCCESS
//! }
//! ```

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{validate as validate_cli, Cli, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

use clap::Parser;
use spine_domain::error::SpineError;

/// Parses argv and validates it into a [`ValidatedCli`]. Clap handles
/// `--help`/`--version` itself and exits the process before this returns.
pub fn bootstrap_cli() -> Result<ValidatedCli, SpineError> {
    validate_cli(Cli::parse())
}
