// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Execution Bookkeeping
//!
//! `Execution` is the `core_executions` row shared by the Dispatcher/Runner,
//! the Workflow Engine, and the Scheduler facade. Lineage is tracked with
//! `parent_execution_id`/`batch_id`: a child execution inherits its
//! creator's `batch_id`, and records the creator as `parent_execution_id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::ExecutionId;

/// Lifecycle status of an `Execution`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelling,
    Cancelled,
    Skipped,
    DeadLettered,
}

/// Where an execution's trigger originated.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Manual,
    Scheduled { schedule_id: String, fire_time: chrono::DateTime<chrono::Utc> },
    Workflow { run_id: String, step_name: String },
}

/// One row of `core_executions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: ExecutionId,
    pub pipeline: String,
    pub params: Value,
    pub status: ExecutionStatus,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub parent_execution_id: Option<ExecutionId>,
    pub batch_id: Option<String>,
}

impl Execution {
    pub fn new(pipeline: impl Into<String>, params: Value, trigger: &TriggerSource) -> Self {
        let batch_id = match trigger {
            TriggerSource::Workflow { run_id, .. } => Some(run_id.clone()),
            _ => None,
        };
        Self {
            execution_id: ExecutionId::new(),
            pipeline: pipeline.into(),
            params,
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            parent_execution_id: None,
            batch_id,
        }
    }

    /// Derives a child execution that inherits this execution's `batch_id`
    /// and records this execution as its parent.
    pub fn child(&self, pipeline: impl Into<String>, params: Value) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            pipeline: pipeline.into(),
            params,
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            parent_execution_id: Some(self.execution_id),
            batch_id: self.batch_id.clone(),
        }
    }
}

/// One `core_execution_events` row: an observability breadcrumb recording a
/// status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub execution_id: ExecutionId,
    pub event_type: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_inherits_batch_id_and_records_parent() {
        let parent = Execution::new(
            "ingest",
            Value::Null,
            &TriggerSource::Workflow {
                run_id: "run-123".into(),
                step_name: "ingest".into(),
            },
        );
        let child = parent.child("normalize", Value::Null);
        assert_eq!(child.batch_id, Some("run-123".to_string()));
        assert_eq!(child.parent_execution_id, Some(parent.execution_id));
    }
}
