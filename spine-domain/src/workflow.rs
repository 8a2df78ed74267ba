// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Workflow Engine Types — a Typed Step DAG
//!
//! A [`Workflow`] is an ordered list of [`Step`]s executed by
//! `spine::application::workflow_engine::WorkflowRunner`. [`WorkflowContext`]
//! is immutable-append: every `with_*` method returns a new context, so a
//! concurrent `Map` child can be handed a deep-frozen view of the parent
//! without risking a shared mutable borrow.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::ids::{PartitionKey, RunId};

/// What a step does when it fails.
#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OnError {
    Stop,
    Continue,
}

impl Default for OnError {
    fn default() -> Self {
        Self::Stop
    }
}

/// One node of the workflow DAG.
#[derive(Debug, Clone)]
pub enum Step {
    /// Dispatches a registered pipeline by name.
    Pipeline {
        name: String,
        pipeline_name: String,
        params: BTreeMap<String, Value>,
        on_error: OnError,
    },
    /// A pure, I/O-free function over the context: validation or routing.
    /// Lambdas always execute, even in a dry run.
    Lambda {
        name: String,
        config: BTreeMap<String, Value>,
        on_error: OnError,
    },
    /// Branches by a named predicate evaluated over the context, jumping to
    /// `then_step` or `else_step`. No backward jumps.
    Choice {
        name: String,
        predicate: String,
        then_step: String,
        else_step: String,
    },
    /// Delays execution by `duration_seconds` before the next step runs.
    Wait { name: String, duration_seconds: u64 },
    /// Fans a child workflow out over `items_path` (a context-resolvable
    /// list), up to `max_concurrency` at a time, fanning results back in
    /// under `outputs[step.name]`.
    Map {
        name: String,
        items_path: String,
        iterator_workflow: String,
        max_concurrency: usize,
    },
}

impl Step {
    pub fn name(&self) -> &str {
        match self {
            Step::Pipeline { name, .. }
            | Step::Lambda { name, .. }
            | Step::Choice { name, .. }
            | Step::Wait { name, .. }
            | Step::Map { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Step::Pipeline { .. } => "PIPELINE",
            Step::Lambda { .. } => "LAMBDA",
            Step::Choice { .. } => "CHOICE",
            Step::Wait { .. } => "WAIT",
            Step::Map { .. } => "MAP",
        }
    }
}

/// A named, ordered DAG of steps belonging to one domain.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    pub domain: String,
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, domain: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            steps,
        }
    }

    pub fn step_index(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name() == name)
    }
}

/// Immutable-append execution context. Every `with_*` method clones and
/// returns a new `WorkflowContext`; the receiver is left untouched, which is
/// what makes handing a context to a concurrent `Map` child safe.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub run_id: RunId,
    pub workflow_name: String,
    pub params: BTreeMap<String, Value>,
    pub outputs: BTreeMap<String, Value>,
    pub partition: Option<PartitionKey>,
    pub execution_id: Option<String>,
}

impl WorkflowContext {
    pub fn new(
        workflow_name: impl Into<String>,
        params: BTreeMap<String, Value>,
        partition: Option<PartitionKey>,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            workflow_name: workflow_name.into(),
            params,
            outputs: BTreeMap::new(),
            partition,
            execution_id: None,
        }
    }

    pub fn get_param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn get_output(&self, step_name: &str) -> Option<&Value> {
        self.outputs.get(step_name)
    }

    pub fn has_output(&self, step_name: &str) -> bool {
        self.outputs.contains_key(step_name)
    }

    /// Returns a new context with `step_name`'s output recorded.
    #[must_use]
    pub fn with_output(&self, step_name: impl Into<String>, output: Value) -> Self {
        let mut next = self.clone();
        next.outputs.insert(step_name.into(), output);
        next
    }

    /// Returns a new context with `key` set in `params` (a step's
    /// `context_updates` applied).
    #[must_use]
    pub fn with_param(&self, key: impl Into<String>, value: Value) -> Self {
        let mut next = self.clone();
        next.params.insert(key.into(), value);
        next
    }
}

/// Status of one step's execution.
#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Ok,
    Fail,
    Skip,
}

/// What a step returns after executing.
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    pub status: Option<StepStatus>,
    pub output: Option<Value>,
    pub context_updates: BTreeMap<String, Value>,
    pub quality: BTreeMap<String, Value>,
    pub error: Option<String>,
    pub category: Option<String>,
}

impl StepResult {
    pub fn ok(output: Value) -> Self {
        Self {
            status: Some(StepStatus::Ok),
            output: Some(output),
            ..Default::default()
        }
    }

    pub fn fail(error: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            status: Some(StepStatus::Fail),
            error: Some(error.into()),
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            status: Some(StepStatus::Skip),
            output: Some(Value::String(reason.into())),
            ..Default::default()
        }
    }

    pub fn status(&self) -> StepStatus {
        self.status.unwrap_or(StepStatus::Ok)
    }
}

/// A single recorded step invocation, the unit persisted to
/// `core_workflow_steps`.
#[derive(Debug, Clone)]
pub struct StepExecution {
    pub step_name: String,
    pub step_type: &'static str,
    pub step_order: usize,
    pub status: StepStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub error: Option<String>,
    pub retry_count: u32,
}

/// Terminal workflow status.
#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowStatus {
    Completed,
    Failed,
    Partial,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Partial => "PARTIAL",
        };
        write!(f, "{s}")
    }
}

/// The outcome of a full workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub run_id: RunId,
    pub status: WorkflowStatus,
    pub error_step: Option<String>,
    pub context: WorkflowContext,
    pub step_executions: Vec<StepExecution>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_output_does_not_mutate_original() {
        let ctx = WorkflowContext::new("wf", BTreeMap::new(), None);
        let next = ctx.with_output("ingest", json!({"rows": 10}));
        assert!(!ctx.has_output("ingest"));
        assert!(next.has_output("ingest"));
    }

    #[test]
    fn with_param_does_not_mutate_original() {
        let ctx = WorkflowContext::new("wf", BTreeMap::new(), None);
        let next = ctx.with_param("force", json!(true));
        assert!(ctx.get_param("force").is_none());
        assert_eq!(next.get_param("force"), Some(&json!(true)));
    }

    #[test]
    fn step_index_finds_named_step() {
        let wf = Workflow::new(
            "w",
            "d",
            vec![
                Step::Lambda { name: "validate".into(), config: BTreeMap::new(), on_error: OnError::Stop },
                Step::Wait { name: "cooldown".into(), duration_seconds: 1 },
            ],
        );
        assert_eq!(wf.step_index("cooldown"), Some(1));
        assert_eq!(wf.step_index("missing"), None);
    }
}
