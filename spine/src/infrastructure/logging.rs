// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging setup built on `tracing`/`tracing-subscriber`.
//!
//! [`init`] installs a global subscriber once per process; every
//! `spine-bootstrap` entry point calls it before touching the dispatcher,
//! workflow engine, or scheduler facade.

use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::LoggingConfig;

/// Installs the global `tracing` subscriber. `config.level` seeds the
/// default filter and is overridden by `RUST_LOG` when set; `config.json`
/// selects JSON-formatted output (production) over human-readable output
/// (development).
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    // A subscriber may already be installed (e.g. a prior call in the same
    // process, or a test harness); that isn't a startup failure.
    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {e}");
    }
}
