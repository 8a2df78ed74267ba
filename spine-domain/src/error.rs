// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! `SpineError` implements a closed failure taxonomy: Transient, Source,
//! Validation, Config, Auth, Pipeline, Orchestration, and Storage/Query
//! kinds. Every variant is retryable or not by construction, and
//! `category()` gives the open-ended category string used when an error is
//! recorded as an anomaly.
//!
//! The core never retries automatically — `is_retryable()` only informs a
//! higher-tier scheduler's backoff policy.

use std::collections::BTreeMap;
use thiserror::Error;

/// Broad error category, independent of the specific variant. Categories are
/// deliberately open (new variants can reuse an existing category).
pub type ErrorCategory = &'static str;

/// The closed failure taxonomy shared across every Spine component.
///
/// Each variant carries a human-readable message and an optional structured
/// `context` map for additional diagnostic fields (e.g. `partition_key`,
/// `calc_name`). Context is attached with [`SpineError::with_context`].
#[derive(Error, Debug, Clone)]
pub enum SpineError {
    #[error("transient error: {message}")]
    Transient {
        message: String,
        context: BTreeMap<String, String>,
    },

    #[error("source error: {message}")]
    Source {
        message: String,
        retryable: bool,
        context: BTreeMap<String, String>,
    },

    #[error("validation error: {message}")]
    Validation {
        message: String,
        context: BTreeMap<String, String>,
    },

    #[error("config error: {message}")]
    Config {
        message: String,
        context: BTreeMap<String, String>,
    },

    #[error("auth error: {message}")]
    Auth {
        message: String,
        context: BTreeMap<String, String>,
    },

    #[error("pipeline error: {message}")]
    Pipeline {
        message: String,
        context: BTreeMap<String, String>,
    },

    #[error("orchestration error: {message}")]
    Orchestration {
        message: String,
        retryable: bool,
        context: BTreeMap<String, String>,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        retryable: bool,
        context: BTreeMap<String, String>,
    },
}

/// Convenience alias used throughout the domain and application layers.
pub type SpineResult<T> = Result<T, SpineError>;

impl SpineError {
    /// Transient, always-retryable infrastructure failure (network, timeout,
    /// rate limit, DB connection loss).
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Upstream source failure. `retryable` should be `true` only for
    /// `Unavailable`-shaped causes, never for `NotFound`/`Parse`.
    pub fn source(message: impl Into<String>, retryable: bool) -> Self {
        Self::Source {
            message: message.into(),
            retryable,
            context: BTreeMap::new(),
        }
    }

    /// Bad data: schema or constraint violation. Never retryable.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Operator/config error: missing or invalid configuration. Never
    /// retryable.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Credential failure (authn/authz). Never retryable.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Pipeline misuse: unknown name, bad params. Never retryable.
    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Workflow/schedule internal error. Retryability is case-by-case.
    pub fn orchestration(message: impl Into<String>, retryable: bool) -> Self {
        Self::Orchestration {
            message: message.into(),
            retryable,
            context: BTreeMap::new(),
        }
    }

    /// Database fault (query or integrity). Integrity violations are never
    /// retryable; query faults sometimes are.
    pub fn storage(message: impl Into<String>, retryable: bool) -> Self {
        Self::Storage {
            message: message.into(),
            retryable,
            context: BTreeMap::new(),
        }
    }

    /// Attaches a context key/value, returning `self` for chaining.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            Self::Transient { context, .. }
            | Self::Source { context, .. }
            | Self::Validation { context, .. }
            | Self::Config { context, .. }
            | Self::Auth { context, .. }
            | Self::Pipeline { context, .. }
            | Self::Orchestration { context, .. }
            | Self::Storage { context, .. } => {
                context.insert(key.into(), value.into());
            }
        }
        self
    }

    /// Whether a higher-tier scheduler should consider retrying the
    /// operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            Self::Source { retryable, .. }
            | Self::Orchestration { retryable, .. }
            | Self::Storage { retryable, .. } => *retryable,
            Self::Validation { .. }
            | Self::Config { .. }
            | Self::Auth { .. }
            | Self::Pipeline { .. } => false,
        }
    }

    /// The open-ended category string, used as the `category` field when an
    /// error is surfaced as an anomaly.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transient { .. } => "TRANSIENT",
            Self::Source { .. } => "SOURCE",
            Self::Validation { .. } => "VALIDATION",
            Self::Config { .. } => "CONFIG",
            Self::Auth { .. } => "AUTH",
            Self::Pipeline { .. } => "PIPELINE",
            Self::Orchestration { .. } => "ORCHESTRATION",
            Self::Storage { .. } => "STORAGE",
        }
    }

    /// Structured context attached to this error, if any.
    pub fn context(&self) -> &BTreeMap<String, String> {
        match self {
            Self::Transient { context, .. }
            | Self::Source { context, .. }
            | Self::Validation { context, .. }
            | Self::Config { context, .. }
            | Self::Auth { context, .. }
            | Self::Pipeline { context, .. }
            | Self::Orchestration { context, .. }
            | Self::Storage { context, .. } => context,
        }
    }

    /// Serializes this error to a JSON object (message, category, retryable,
    /// context), for embedding in anomaly rows and event payloads.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.to_string(),
            "category": self.category(),
            "retryable": self.is_retryable(),
            "context": self.context(),
        })
    }
}

impl From<std::io::Error> for SpineError {
    fn from(err: std::io::Error) -> Self {
        SpineError::transient(err.to_string())
    }
}

impl From<serde_json::Error> for SpineError {
    fn from(err: serde_json::Error) -> Self {
        SpineError::validation(format!("serialization error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_retryable() {
        assert!(SpineError::transient("timeout").is_retryable());
    }

    #[test]
    fn validation_is_never_retryable() {
        assert!(!SpineError::validation("bad row").is_retryable());
    }

    #[test]
    fn source_retryability_is_explicit() {
        assert!(SpineError::source("upstream unavailable", true).is_retryable());
        assert!(!SpineError::source("not found", false).is_retryable());
    }

    #[test]
    fn to_json_round_trips_category_and_message() {
        let err = SpineError::config("missing database_url").with_context("key", "database_url");
        let json = err.to_json();
        assert_eq!(json["category"], "CONFIG");
        assert_eq!(json["retryable"], false);
        assert_eq!(json["context"]["key"], "database_url");
    }
}
