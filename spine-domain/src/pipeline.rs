// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline — Spec, Params, and the Unit-of-Work Trait
//!
//! A [`Pipeline`] declares a [`PipelineSpec`] (required/optional params,
//! per-param validators) and exposes one operation, `run`. The
//! [`crate::registry::Registry`] maps `name -> Pipeline factory`; the
//! factory, not the trait object, is what gets registered, since each
//! invocation needs a fresh pipeline instance bound to that invocation's
//! execution context.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SpineError;
use crate::ids::ExecutionId;

/// A single recognized parameter and how to validate it.
#[derive(Clone)]
pub struct ParamSpec {
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
    validator: Option<std::sync::Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>>,
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl ParamSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
            validator: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: Some(default),
            validator: None,
        }
    }

    #[must_use]
    pub fn with_validator(
        mut self,
        validator: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(std::sync::Arc::new(validator));
        self
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        match &self.validator {
            Some(v) => v(value),
            None => Ok(()),
        }
    }
}

/// A pipeline's recognized parameters. The Runner rejects unknown options
/// unless `allow_extra` is set.
#[derive(Debug, Clone, Default)]
pub struct PipelineSpec {
    pub params: Vec<ParamSpec>,
    pub allow_extra: bool,
    pub timeout_seconds: Option<u64>,
}

impl PipelineSpec {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self {
            params,
            allow_extra: false,
            timeout_seconds: None,
        }
    }

    #[must_use]
    pub fn allow_extra(mut self) -> Self {
        self.allow_extra = true;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Validates and normalizes `raw` params: applies defaults for missing
    /// optional params, rejects missing required params, rejects unknown
    /// keys unless `allow_extra`, and runs each param's validator.
    pub fn validate(&self, raw: &BTreeMap<String, Value>) -> Result<BTreeMap<String, Value>, SpineError> {
        let mut resolved = raw.clone();

        for spec in &self.params {
            match resolved.get(&spec.name) {
                Some(value) => {
                    spec.validate(value)
                        .map_err(|e| SpineError::validation(format!("param {}: {e}", spec.name)))?;
                }
                None => {
                    if spec.required {
                        return Err(SpineError::validation(format!("missing required param: {}", spec.name)));
                    }
                    if let Some(default) = &spec.default {
                        resolved.insert(spec.name.clone(), default.clone());
                    }
                }
            }
        }

        if !self.allow_extra {
            let known: std::collections::BTreeSet<&str> =
                self.params.iter().map(|p| p.name.as_str()).collect();
            if let Some(unknown) = resolved.keys().find(|k| !known.contains(k.as_str())) {
                return Err(SpineError::validation(format!("unknown param: {unknown}")));
            }
        }

        Ok(resolved)
    }
}

/// Terminal status of a pipeline invocation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineStatus {
    Completed,
    Failed,
    Skipped,
}

/// What a pipeline returns on completion.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PipelineResult {
    pub status: PipelineStatus,
    pub metrics: BTreeMap<String, Value>,
}

impl PipelineResult {
    pub fn completed(metrics: BTreeMap<String, Value>) -> Self {
        Self {
            status: PipelineStatus::Completed,
            metrics,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert("skip_reason".to_string(), Value::String(reason.into()));
        Self {
            status: PipelineStatus::Skipped,
            metrics,
        }
    }
}

/// Context handed to a pipeline invocation: its execution id plus whether
/// the invocation is a dry run (workflow validation/visualization mode).
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub execution_id: ExecutionId,
    pub dry_run: bool,
}

/// A parameter-validated unit of work.
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn spec(&self) -> PipelineSpec;

    /// Runs the pipeline against already-validated, normalized params. In a
    /// dry run, implementations must synthesize an OK result without
    /// performing side effects.
    async fn run(
        &self,
        params: &BTreeMap<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<PipelineResult, SpineError>;
}

/// A factory producing a fresh [`Pipeline`] instance, the type registered
/// under a name in the Pipeline Registry.
pub type PipelineFactory = std::sync::Arc<dyn Fn() -> Box<dyn Pipeline> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_fills_defaults_and_rejects_unknown() {
        let spec = PipelineSpec::new(vec![
            ParamSpec::required("partition_key"),
            ParamSpec::optional("force", json!(false)),
        ]);

        let mut raw = BTreeMap::new();
        raw.insert("partition_key".to_string(), json!("2025-12-26|OTC"));
        let resolved = spec.validate(&raw).unwrap();
        assert_eq!(resolved["force"], json!(false));

        raw.insert("bogus".to_string(), json!(1));
        assert!(spec.validate(&raw).is_err());
    }

    #[test]
    fn validate_rejects_missing_required() {
        let spec = PipelineSpec::new(vec![ParamSpec::required("partition_key")]);
        assert!(spec.validate(&BTreeMap::new()).is_err());
    }

    #[test]
    fn validate_runs_custom_validator() {
        let spec = PipelineSpec::new(vec![ParamSpec::required("tier").with_validator(|v| {
            if v == "OTC" || v == "NMS_TIER_1" {
                Ok(())
            } else {
                Err("unknown tier".to_string())
            }
        })]);
        let mut raw = BTreeMap::new();
        raw.insert("tier".to_string(), json!("BOGUS"));
        assert!(spec.validate(&raw).is_err());
    }
}
