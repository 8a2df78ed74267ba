// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence for `core_executions`/`core_execution_events`, shared by the
//! Dispatcher, the Workflow Engine, and the Scheduler facade.

use serde_json::Value;
use std::sync::Arc;

use spine_domain::error::SpineError;
use spine_domain::execution::{Execution, ExecutionEvent, ExecutionStatus};
use spine_domain::ids::ExecutionId;
use spine_domain::repository::{Param, Repository, Row};

use super::row_ext::{get_opt_datetime, get_opt_str, get_str};

pub struct ExecutionRepository {
    repo: Arc<dyn Repository>,
}

fn status_str(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Pending => "PENDING",
        ExecutionStatus::Running => "RUNNING",
        ExecutionStatus::Completed => "COMPLETED",
        ExecutionStatus::Failed => "FAILED",
        ExecutionStatus::Cancelling => "CANCELLING",
        ExecutionStatus::Cancelled => "CANCELLED",
        ExecutionStatus::Skipped => "SKIPPED",
        ExecutionStatus::DeadLettered => "DEAD_LETTERED",
    }
}

fn status_of(raw: &str) -> Result<ExecutionStatus, SpineError> {
    Ok(match raw {
        "PENDING" => ExecutionStatus::Pending,
        "RUNNING" => ExecutionStatus::Running,
        "COMPLETED" => ExecutionStatus::Completed,
        "FAILED" => ExecutionStatus::Failed,
        "CANCELLING" => ExecutionStatus::Cancelling,
        "CANCELLED" => ExecutionStatus::Cancelled,
        "SKIPPED" => ExecutionStatus::Skipped,
        "DEAD_LETTERED" => ExecutionStatus::DeadLettered,
        other => return Err(SpineError::storage(format!("unknown execution status: {other}"), false)),
    })
}

impl ExecutionRepository {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn insert(&self, execution: &Execution) -> Result<(), SpineError> {
        let mut row = Row::new();
        row.insert("execution_id".to_string(), Value::String(execution.execution_id.to_string()));
        row.insert("pipeline".to_string(), Value::String(execution.pipeline.clone()));
        row.insert("params".to_string(), Value::String(execution.params.to_string()));
        row.insert("status".to_string(), Value::String(status_str(execution.status).to_string()));
        row.insert(
            "started_at".to_string(),
            execution.started_at.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null),
        );
        row.insert(
            "completed_at".to_string(),
            execution.completed_at.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null),
        );
        row.insert(
            "parent_execution_id".to_string(),
            execution.parent_execution_id.map(|id| Value::String(id.to_string())).unwrap_or(Value::Null),
        );
        row.insert(
            "batch_id".to_string(),
            execution.batch_id.clone().map(Value::String).unwrap_or(Value::Null),
        );
        self.repo.insert("core_executions", &row).await
    }

    /// Transitions `execution_id` to `status`, stamping `started_at`/
    /// `completed_at` as appropriate for the new status.
    pub async fn transition(&self, execution_id: &ExecutionId, status: ExecutionStatus) -> Result<(), SpineError> {
        let now = chrono::Utc::now().to_rfc3339();
        let affected = match status {
            ExecutionStatus::Running => {
                self.repo
                    .execute(
                        "UPDATE core_executions SET status = ?, started_at = ? WHERE execution_id = ?",
                        &[
                            Param::from(status_str(status).to_string()),
                            Param::from(now),
                            Param::from(execution_id.to_string()),
                        ],
                    )
                    .await?
            }
            ExecutionStatus::Completed
            | ExecutionStatus::Failed
            | ExecutionStatus::Cancelled
            | ExecutionStatus::Skipped
            | ExecutionStatus::DeadLettered => {
                self.repo
                    .execute(
                        "UPDATE core_executions SET status = ?, completed_at = ? WHERE execution_id = ?",
                        &[
                            Param::from(status_str(status).to_string()),
                            Param::from(now),
                            Param::from(execution_id.to_string()),
                        ],
                    )
                    .await?
            }
            ExecutionStatus::Pending | ExecutionStatus::Cancelling => {
                self.repo
                    .execute(
                        "UPDATE core_executions SET status = ? WHERE execution_id = ?",
                        &[Param::from(status_str(status).to_string()), Param::from(execution_id.to_string())],
                    )
                    .await?
            }
        };
        if affected == 0 {
            return Err(SpineError::storage(format!("unknown execution_id: {execution_id}"), false));
        }
        Ok(())
    }

    pub async fn get(&self, execution_id: &ExecutionId) -> Result<Option<Execution>, SpineError> {
        let row = self
            .repo
            .query_one(
                "SELECT * FROM core_executions WHERE execution_id = ?",
                &[Param::from(execution_id.to_string())],
            )
            .await?;
        row.as_ref().map(row_to_execution).transpose()
    }

    pub async fn record_event(&self, event: &ExecutionEvent) -> Result<(), SpineError> {
        let mut row = Row::new();
        row.insert("execution_id".to_string(), Value::String(event.execution_id.to_string()));
        row.insert("event_type".to_string(), Value::String(event.event_type.clone()));
        row.insert("timestamp".to_string(), Value::String(event.timestamp.to_rfc3339()));
        row.insert("data".to_string(), Value::String(event.data.to_string()));
        self.repo.insert("core_execution_events", &row).await
    }

    pub async fn events_for(&self, execution_id: &ExecutionId) -> Result<Vec<ExecutionEvent>, SpineError> {
        let rows = self
            .repo
            .query(
                "SELECT * FROM core_execution_events WHERE execution_id = ? ORDER BY id",
                &[Param::from(execution_id.to_string())],
            )
            .await?;
        rows.iter().map(row_to_event).collect()
    }
}

fn row_to_execution(row: &Row) -> Result<Execution, SpineError> {
    Ok(Execution {
        execution_id: ExecutionId::parse(&get_str(row, "execution_id")?)?,
        pipeline: get_str(row, "pipeline")?,
        params: row.get("params").cloned().unwrap_or(Value::Null),
        status: status_of(&get_str(row, "status")?)?,
        started_at: get_opt_datetime(row, "started_at"),
        completed_at: get_opt_datetime(row, "completed_at"),
        parent_execution_id: get_opt_str(row, "parent_execution_id")
            .map(|s| ExecutionId::parse(&s))
            .transpose()?,
        batch_id: get_opt_str(row, "batch_id"),
    })
}

fn row_to_event(row: &Row) -> Result<ExecutionEvent, SpineError> {
    Ok(ExecutionEvent {
        execution_id: ExecutionId::parse(&get_str(row, "execution_id")?)?,
        event_type: get_str(row, "event_type")?,
        timestamp: super::row_ext::get_datetime(row, "timestamp")?,
        data: row.get("data").cloned().unwrap_or(Value::Null),
    })
}
