// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence for `core_workflow_runs`/`core_workflow_steps`.
//!
//! `WorkflowResult`/`StepExecution` (`spine_domain::workflow`) are the
//! in-memory shapes the Workflow Engine builds up over one run; this module
//! is the durability layer the engine calls once the run completes.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use spine_domain::error::SpineError;
use spine_domain::ids::RunId;
use spine_domain::repository::{Param, Repository, Row};
use spine_domain::workflow::{StepExecution, StepStatus, WorkflowResult, WorkflowStatus};

use super::row_ext::{get_opt_str, get_str, get_u32};

pub struct WorkflowRepository {
    repo: Arc<dyn Repository>,
}

/// A `core_workflow_runs` row, as read back (the engine's live
/// `WorkflowContext` is not reconstructed from storage; only the summary
/// fields a caller needs to check a past run are).
#[derive(Debug, Clone)]
pub struct WorkflowRunRow {
    pub run_id: RunId,
    pub workflow_name: String,
    pub domain: String,
    pub status: WorkflowStatus,
    pub error_step: Option<String>,
    pub context: Value,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn workflow_status_str(status: WorkflowStatus) -> &'static str {
    match status {
        WorkflowStatus::Completed => "COMPLETED",
        WorkflowStatus::Failed => "FAILED",
        WorkflowStatus::Partial => "PARTIAL",
    }
}

fn workflow_status_of(raw: &str) -> Result<WorkflowStatus, SpineError> {
    Ok(match raw {
        "COMPLETED" => WorkflowStatus::Completed,
        "FAILED" => WorkflowStatus::Failed,
        "PARTIAL" => WorkflowStatus::Partial,
        other => return Err(SpineError::storage(format!("unknown workflow status: {other}"), false)),
    })
}

fn step_status_str(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Ok => "OK",
        StepStatus::Fail => "FAIL",
        StepStatus::Skip => "SKIP",
    }
}

impl WorkflowRepository {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Records a completed (or resumed) run: upserts the `core_workflow_runs`
    /// row and inserts a `core_workflow_steps` row for every step execution
    /// past `already_persisted_steps` — a fresh run passes `0`; a resumed run
    /// passes the count of steps it loaded via [`Self::steps_for`], so the
    /// steps a prior attempt already recorded are not duplicated.
    pub async fn record_run(
        &self,
        result: &WorkflowResult,
        domain: &str,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        already_persisted_steps: usize,
    ) -> Result<(), SpineError> {
        let context = json!({"params": result.context.params, "outputs": result.context.outputs});
        let affected = self
            .repo
            .execute(
                "UPDATE core_workflow_runs SET status = ?, error_step = ?, context = ?, completed_at = ? WHERE run_id = ?",
                &[
                    Param::from(workflow_status_str(result.status).to_string()),
                    Param::from(result.error_step.clone()),
                    Param::from(context.clone()),
                    Param::from(completed_at.to_rfc3339()),
                    Param::from(result.run_id.to_string()),
                ],
            )
            .await?;

        if affected == 0 {
            let mut run_row = Row::new();
            run_row.insert("run_id".to_string(), Value::String(result.run_id.to_string()));
            run_row.insert("workflow_name".to_string(), Value::String(result.context.workflow_name.clone()));
            run_row.insert("domain".to_string(), Value::String(domain.to_string()));
            run_row.insert("status".to_string(), Value::String(workflow_status_str(result.status).to_string()));
            run_row.insert(
                "error_step".to_string(),
                result.error_step.clone().map(Value::String).unwrap_or(Value::Null),
            );
            run_row.insert("context".to_string(), context);
            run_row.insert("started_at".to_string(), Value::String(started_at.to_rfc3339()));
            run_row.insert("completed_at".to_string(), Value::String(completed_at.to_rfc3339()));
            self.repo.insert("core_workflow_runs", &run_row).await?;
        }

        let step_rows: Vec<Row> = result
            .step_executions
            .iter()
            .skip(already_persisted_steps)
            .map(|s| step_execution_row(&result.run_id, s))
            .collect();
        if step_rows.is_empty() {
            return Ok(());
        }
        self.repo.insert_many("core_workflow_steps", &step_rows).await
    }

    pub async fn get_run(&self, run_id: &RunId) -> Result<Option<WorkflowRunRow>, SpineError> {
        let row = self
            .repo
            .query_one("SELECT * FROM core_workflow_runs WHERE run_id = ?", &[Param::from(run_id.to_string())])
            .await?;
        row.as_ref().map(row_to_run).transpose()
    }

    pub async fn steps_for(&self, run_id: &RunId) -> Result<Vec<StepExecution>, SpineError> {
        let rows = self
            .repo
            .query(
                "SELECT * FROM core_workflow_steps WHERE run_id = ? ORDER BY step_order",
                &[Param::from(run_id.to_string())],
            )
            .await?;
        rows.iter().map(row_to_step_execution).collect()
    }
}

fn step_execution_row(run_id: &RunId, step: &StepExecution) -> Row {
    let mut row = Row::new();
    row.insert("run_id".to_string(), Value::String(run_id.to_string()));
    row.insert("step_name".to_string(), Value::String(step.step_name.clone()));
    row.insert("step_type".to_string(), Value::String(step.step_type.to_string()));
    row.insert("step_order".to_string(), Value::from(step.step_order as i64));
    row.insert("status".to_string(), Value::String(step_status_str(step.status).to_string()));
    row.insert("started_at".to_string(), Value::String(step.started_at.to_rfc3339()));
    row.insert("completed_at".to_string(), Value::String(step.completed_at.to_rfc3339()));
    row.insert("error".to_string(), step.error.clone().map(Value::String).unwrap_or(Value::Null));
    row.insert("retry_count".to_string(), Value::from(step.retry_count as i64));
    row
}

fn row_to_run(row: &Row) -> Result<WorkflowRunRow, SpineError> {
    Ok(WorkflowRunRow {
        run_id: RunId::parse(&get_str(row, "run_id")?)?,
        workflow_name: get_str(row, "workflow_name")?,
        domain: get_str(row, "domain")?,
        status: workflow_status_of(&get_str(row, "status")?)?,
        error_step: get_opt_str(row, "error_step"),
        context: row.get("context").cloned().unwrap_or(Value::Null),
        started_at: super::row_ext::get_datetime(row, "started_at")?,
        completed_at: super::row_ext::get_opt_datetime(row, "completed_at"),
    })
}

fn row_to_step_execution(row: &Row) -> Result<StepExecution, SpineError> {
    let step_type = match get_str(row, "step_type")?.as_str() {
        "PIPELINE" => "PIPELINE",
        "LAMBDA" => "LAMBDA",
        "CHOICE" => "CHOICE",
        "WAIT" => "WAIT",
        "MAP" => "MAP",
        other => return Err(SpineError::storage(format!("unknown step_type: {other}"), false)),
    };
    let status = match get_str(row, "status")?.as_str() {
        "OK" => StepStatus::Ok,
        "FAIL" => StepStatus::Fail,
        "SKIP" => StepStatus::Skip,
        other => return Err(SpineError::storage(format!("unknown step status: {other}"), false)),
    };
    Ok(StepExecution {
        step_name: get_str(row, "step_name")?,
        step_type,
        step_order: get_u32(row, "step_order")? as usize,
        status,
        started_at: super::row_ext::get_datetime(row, "started_at")?,
        completed_at: super::row_ext::get_datetime(row, "completed_at")?,
        error: get_opt_str(row, "error"),
        retry_count: get_u32(row, "retry_count")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dialect::SqliteDialect;
    use crate::infrastructure::repositories::{schema, SqliteRepository};
    use spine_domain::workflow::WorkflowContext;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    async fn repo() -> (WorkflowRepository, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = schema::initialize_database(&db_url).await.unwrap();
        let r: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool, Arc::new(SqliteDialect)));
        (WorkflowRepository::new(r), temp)
    }

    #[tokio::test]
    async fn record_run_persists_run_and_steps() {
        let (repo, _temp) = repo().await;
        let ctx = WorkflowContext::new("ingest_then_aggregate", BTreeMap::new(), None);
        let now = chrono::Utc::now();
        let result = WorkflowResult {
            run_id: ctx.run_id,
            status: WorkflowStatus::Completed,
            error_step: None,
            context: ctx,
            step_executions: vec![StepExecution {
                step_name: "ingest".to_string(),
                step_type: "PIPELINE",
                step_order: 0,
                status: StepStatus::Ok,
                started_at: now,
                completed_at: now,
                error: None,
                retry_count: 0,
            }],
        };

        repo.record_run(&result, "finra.otc", now, now, 0).await.unwrap();

        let fetched = repo.get_run(&result.run_id).await.unwrap().unwrap();
        assert_eq!(fetched.status, WorkflowStatus::Completed);

        let steps = repo.steps_for(&result.run_id).await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_name, "ingest");
    }
}
