// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatcher — Pipeline Submission
//!
//! `Dispatcher::dispatch` allocates and persists an `Execution` row in
//! `PENDING`, validates params against the pipeline's spec, runs the
//! pipeline once, and records the terminal outcome. The core never retries
//! automatically — retry is a higher-tier Scheduler policy that inspects
//! `retryable` (see [`crate::application::scheduler::SchedulerFacade`]).
//! Every attempt — start, terminal failure, or success — is recorded as a
//! `core_execution_events` row.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use spine_domain::error::SpineError;
use spine_domain::execution::{Execution, ExecutionEvent, ExecutionStatus, TriggerSource};
use spine_domain::pipeline::{ExecutionContext, PipelineResult};

use crate::application::pipeline_registry::PipelineRegistry;
use crate::infrastructure::repositories::ExecutionRepository;

pub struct Dispatcher {
    registry: Arc<PipelineRegistry>,
    executions: Arc<ExecutionRepository>,
}

impl Dispatcher {
    pub fn new(registry: Arc<PipelineRegistry>, executions: Arc<ExecutionRepository>) -> Self {
        Self { registry, executions }
    }

    /// Submits a pipeline invocation: persists a `PENDING` Execution row
    /// first, then validates params, then runs to completion or terminal
    /// failure. A bad-params submission still leaves a full execution/event
    /// trail — it transitions to `FAILED` rather than returning with no
    /// record of the attempt.
    pub async fn dispatch(
        &self,
        pipeline_name: &str,
        raw_params: BTreeMap<String, Value>,
        trigger: TriggerSource,
        dry_run: bool,
    ) -> Result<PipelineResult, SpineError> {
        let pipeline = self.registry.create(pipeline_name)?;

        let execution = Execution::new(pipeline_name, Value::Object(raw_params.clone().into_iter().collect()), &trigger);
        self.executions.insert(&execution).await?;
        self.record_event(&execution, "STARTED", Value::Null).await?;

        let params = match pipeline.spec().validate(&raw_params) {
            Ok(params) => params,
            Err(err) => {
                self.executions.transition(&execution.execution_id, ExecutionStatus::Failed).await?;
                self.record_event(&execution, "FAILED", err.to_json()).await?;
                return Err(err);
            }
        };

        self.executions.transition(&execution.execution_id, ExecutionStatus::Running).await?;

        let ctx = ExecutionContext {
            execution_id: execution.execution_id,
            dry_run,
        };

        let outcome = match pipeline.spec().timeout_seconds {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), pipeline.run(&params, &ctx)).await {
                Ok(result) => result,
                Err(_) => Err(SpineError::transient(format!("pipeline {pipeline_name} exceeded its {secs}s timeout"))
                    .with_context("cause", "TimeoutError")),
            },
            None => pipeline.run(&params, &ctx).await,
        };

        match outcome {
            Ok(result) => {
                self.executions.transition(&execution.execution_id, ExecutionStatus::Completed).await?;
                self.record_event(&execution, "COMPLETED", serde_json::to_value(&result)?).await?;
                Ok(result)
            }
            Err(err) => {
                self.executions.transition(&execution.execution_id, ExecutionStatus::Failed).await?;
                self.record_event(&execution, "FAILED", err.to_json()).await?;
                Err(err)
            }
        }
    }

    async fn record_event(&self, execution: &Execution, event_type: &str, data: Value) -> Result<(), SpineError> {
        self.executions
            .record_event(&ExecutionEvent {
                execution_id: execution.execution_id,
                event_type: event_type.to_string(),
                timestamp: chrono::Utc::now(),
                data,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::infrastructure::dialect::SqliteDialect;
    use crate::infrastructure::repositories::{schema, SqliteRepository};
    use spine_domain::pipeline::{Pipeline, PipelineSpec};
    use spine_domain::repository::{Param, Repository};
    use tempfile::NamedTempFile;

    struct AlwaysFailsPipeline;

    #[async_trait]
    impl Pipeline for AlwaysFailsPipeline {
        fn spec(&self) -> PipelineSpec {
            PipelineSpec::default()
        }

        async fn run(&self, _params: &BTreeMap<String, Value>, _ctx: &ExecutionContext) -> Result<PipelineResult, SpineError> {
            Err(SpineError::validation("bad partition key"))
        }
    }

    struct RetryablePipeline;

    #[async_trait]
    impl Pipeline for RetryablePipeline {
        fn spec(&self) -> PipelineSpec {
            PipelineSpec::default()
        }

        async fn run(&self, _params: &BTreeMap<String, Value>, _ctx: &ExecutionContext) -> Result<PipelineResult, SpineError> {
            Err(SpineError::transient("upstream momentarily unavailable"))
        }
    }

    struct OversleepsPipeline;

    #[async_trait]
    impl Pipeline for OversleepsPipeline {
        fn spec(&self) -> PipelineSpec {
            PipelineSpec {
                params: Vec::new(),
                allow_extra: false,
                timeout_seconds: Some(1),
            }
        }

        async fn run(&self, _params: &BTreeMap<String, Value>, _ctx: &ExecutionContext) -> Result<PipelineResult, SpineError> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(PipelineResult::completed(BTreeMap::new()))
        }
    }

    struct RequiresParamPipeline;

    #[async_trait]
    impl Pipeline for RequiresParamPipeline {
        fn spec(&self) -> PipelineSpec {
            PipelineSpec {
                params: vec![spine_domain::pipeline::ParamSpec::required("partition_key")],
                allow_extra: false,
                timeout_seconds: None,
            }
        }

        async fn run(&self, _params: &BTreeMap<String, Value>, _ctx: &ExecutionContext) -> Result<PipelineResult, SpineError> {
            Ok(PipelineResult::completed(BTreeMap::new()))
        }
    }

    async fn dispatcher() -> (Dispatcher, Arc<dyn Repository>, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = schema::initialize_database(&db_url).await.unwrap();
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool, Arc::new(SqliteDialect)));
        let executions = Arc::new(ExecutionRepository::new(Arc::clone(&repo)));
        let registry = Arc::new(PipelineRegistry::new());
        let dispatcher = Dispatcher::new(registry, executions);
        (dispatcher, repo, temp)
    }

    #[tokio::test]
    async fn retryable_failure_fails_on_first_attempt() {
        // The core never retries automatically; a retryable error still
        // surfaces as a single FAILED execution, not a retry loop.
        let (dispatcher, _repo, _temp) = dispatcher().await;
        dispatcher.registry.register("retryable", Arc::new(|| Box::new(RetryablePipeline) as Box<_>)).unwrap();

        let err = dispatcher
            .dispatch("retryable", BTreeMap::new(), TriggerSource::Manual, false)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn non_retryable_failure_fails_fast() {
        let (dispatcher, _repo, _temp) = dispatcher().await;
        dispatcher
            .registry
            .register("always_fails", Arc::new(|| Box::new(AlwaysFailsPipeline) as Box<_>))
            .unwrap();

        let err = dispatcher
            .dispatch("always_fails", BTreeMap::new(), TriggerSource::Manual, false)
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn pipeline_exceeding_its_declared_timeout_fails_as_retryable() {
        let (dispatcher, _repo, _temp) = dispatcher().await;
        dispatcher
            .registry
            .register("oversleeps", Arc::new(|| Box::new(OversleepsPipeline) as Box<_>))
            .unwrap();

        let started = std::time::Instant::now();
        let err = dispatcher
            .dispatch("oversleeps", BTreeMap::new(), TriggerSource::Manual, false)
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        // The 1s declared timeout cuts the dispatch short well before the
        // pipeline's 5s sleep would otherwise complete.
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn bad_params_still_leaves_a_failed_execution_record() {
        let (dispatcher, repo, _temp) = dispatcher().await;
        dispatcher
            .registry
            .register("needs_param", Arc::new(|| Box::new(RequiresParamPipeline) as Box<_>))
            .unwrap();

        let err = dispatcher
            .dispatch("needs_param", BTreeMap::new(), TriggerSource::Manual, false)
            .await
            .unwrap_err();
        assert!(!err.is_retryable());

        // The Execution row was persisted (PENDING -> FAILED) before
        // validation ran, and a STARTED + FAILED event trail exists.
        let row = repo
            .query_one("SELECT * FROM core_executions WHERE pipeline = ?", &[Param::from("needs_param".to_string())])
            .await
            .unwrap()
            .expect("execution row exists despite validation failure");
        assert_eq!(row.get("status").and_then(Value::as_str), Some("FAILED"));

        let execution_id = row.get("execution_id").and_then(Value::as_str).unwrap().to_string();
        let events = repo
            .query(
                "SELECT * FROM core_execution_events WHERE execution_id = ? ORDER BY id",
                &[Param::from(execution_id)],
            )
            .await
            .unwrap();
        let event_types: Vec<&str> = events.iter().filter_map(|r| r.get("event_type").and_then(Value::as_str)).collect();
        assert!(event_types.contains(&"STARTED"));
        assert!(event_types.contains(&"FAILED"));
    }
}
