// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Configuration
//!
//! Resolves the CLI's `--config` flag against `SPINE_CONFIG_FILE` before
//! handing off to [`spine::infrastructure::config::AppConfig::load`], which
//! owns the defaults → file → environment precedence. Keeping that
//! precedence inside `spine` (not duplicated here) means a library caller
//! that skips the CLI entirely still gets the same resolution.

use std::path::Path;
use std::time::Duration;

use spine::infrastructure::config::AppConfig;
use spine_domain::error::SpineError;

use crate::shutdown::DEFAULT_GRACE_PERIOD_SECS;

/// Resolves the process [`AppConfig`], honoring an explicit `--config` path
/// over whatever `SPINE_CONFIG_FILE` was already set to.
pub fn resolve(config_path: Option<&Path>) -> Result<AppConfig, SpineError> {
    if let Some(path) = config_path {
        std::env::set_var("SPINE_CONFIG_FILE", path.to_string_lossy().to_string());
    }
    AppConfig::load()
}

/// Grace period `main` waits for in-flight work to finish after a shutdown
/// signal, read from `SPINE_SHUTDOWN_GRACE_SECS` (falls back to
/// [`DEFAULT_GRACE_PERIOD_SECS`]). Bootstrap-only: it governs process
/// teardown, not anything `AppConfig` describes.
pub fn shutdown_grace_period() -> Duration {
    let secs = std::env::var("SPINE_SHUTDOWN_GRACE_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_GRACE_PERIOD_SECS);
    Duration::from_secs(secs)
}
