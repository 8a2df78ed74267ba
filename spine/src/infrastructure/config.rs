// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Layered Configuration
//!
//! [`AppConfig`] is resolved in three layers, lowest to highest precedence:
//! built-in defaults, an optional config file (`SPINE_CONFIG_FILE`, default
//! `config/default.toml`), then environment variables prefixed `SPINE__`
//! with `__` as the nesting separator (e.g. `SPINE__DATABASE__POOL_SIZE`).

use serde::Deserialize;

use spine_domain::error::SpineError;

/// Database connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://spine.db".to_string(),
            pool_size: 10,
        }
    }
}

/// Scheduler facade polling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub poll_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
        }
    }
}

/// Structured logging settings, consumed by [`crate::infrastructure::logging::init`].
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Name of the [`spine_domain::dialect::Dialect`] registered in the
    /// [`crate::infrastructure::dialect::DialectRegistry`] to pair with
    /// `database.url` (`"sqlite"`, `"postgresql"`, `"mysql"`, `"db2"`,
    /// `"oracle"`).
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

fn default_dialect() -> String {
    "sqlite".to_string()
}

impl AppConfig {
    /// Loads configuration from built-in defaults, an optional file, and
    /// `SPINE__`-prefixed environment variables, in that order of
    /// increasing precedence.
    pub fn load() -> Result<Self, SpineError> {
        let file_path =
            std::env::var("SPINE_CONFIG_FILE").unwrap_or_else(|_| "config/default.toml".to_string());

        let builder = config::Config::builder()
            .set_default("database.url", "sqlite://spine.db")
            .map_err(config_err)?
            .set_default("database.pool_size", 10i64)
            .map_err(config_err)?
            .set_default("scheduler.poll_interval_seconds", 30i64)
            .map_err(config_err)?
            .set_default("logging.level", "info")
            .map_err(config_err)?
            .set_default("logging.json", false)
            .map_err(config_err)?
            .set_default("dialect", "sqlite")
            .map_err(config_err)?
            .add_source(config::File::with_name(&file_path).required(false))
            .add_source(config::Environment::with_prefix("SPINE").separator("__"));

        builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)
    }
}

fn config_err(e: config::ConfigError) -> SpineError {
    SpineError::config(format!("configuration error: {e}"))
}
