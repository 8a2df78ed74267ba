// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Composition root: resolves configuration, wires the SQLite repository,
//! pipeline registry, dispatcher, workflow engine and scheduler facade, then
//! dispatches the validated CLI command.

use std::sync::Arc;

use spine::application::dispatcher::Dispatcher;
use spine::application::pipeline_registry::PipelineRegistry;
use spine::application::scheduler::SchedulerFacade;
use spine::application::workflow_engine::{EngineRegistries, WorkflowRunner};
use spine::infrastructure::dialect::DialectRegistry;
use spine::infrastructure::repositories::{schema, ExecutionRepository, SqliteRepository, WorkflowRepository};
use spine_domain::execution::TriggerSource;
use spine_domain::repository::Repository;
use spine_domain::workflow::WorkflowContext;

use spine_bootstrap::cli::ValidatedCommand;
use spine_bootstrap::logger::BootstrapLogger;
use spine_bootstrap::{bootstrap_cli, config, logger, result_to_exit_code, signals, ExitCode};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let bootstrap_log = logger::ConsoleLogger::new();

    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("argument error: {err}");
            return ExitCode::ValidationError.into();
        }
    };

    let app_config = match config::resolve(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::ConfigError.into();
        }
    };

    spine::infrastructure::logging::init(&app_config.logging);
    bootstrap_log.info("configuration resolved, logging initialized");

    let result = run(cli.command, app_config).await;
    if let Err(ref err) = result {
        tracing::error!(error = %err, "command failed");
    }
    result_to_exit_code(&result).into()
}

async fn run(
    command: ValidatedCommand,
    app_config: spine::infrastructure::config::AppConfig,
) -> Result<(), spine_domain::error::SpineError> {
    use spine_domain::error::SpineError;

    let dialects = DialectRegistry::with_defaults();

    // Listing dialects needs nothing but the registry itself; every other
    // command needs a live pool, so only open it when required.
    if let ValidatedCommand::ListDialects = command {
        let mut names = dialects.list();
        names.sort();
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let dialect = dialects.get(&app_config.dialect)?;
    let pool = schema::initialize_database(&app_config.database.url)
        .await
        .map_err(|e| SpineError::storage(format!("opening database: {e}"), true))?;
    let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool, dialect));
    let executions = Arc::new(ExecutionRepository::new(Arc::clone(&repo)));
    let pipelines = Arc::new(PipelineRegistry::new());
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&pipelines), executions));
    let workflow_repo = Arc::new(WorkflowRepository::new(repo));

    match command {
        ValidatedCommand::ListDialects => unreachable!("handled above"),
        ValidatedCommand::Migrate => {
            tracing::info!("migrations applied");
            Ok(())
        }
        ValidatedCommand::ListPipelines => {
            let names = pipelines.list();
            if names.is_empty() {
                println!("(no pipelines registered in this process)");
            }
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        ValidatedCommand::Run { pipeline, params, dry_run } => {
            let result = dispatcher.dispatch(&pipeline, params, TriggerSource::Manual, dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
            Ok(())
        }
        ValidatedCommand::Workflow { workflow, params, dry_run } => {
            let registries = Arc::new(EngineRegistries::new());
            let workflow_def = registries.workflows.get(&workflow)?;
            let runner = WorkflowRunner::new(dispatcher, registries, workflow_repo);
            let ctx = WorkflowContext::new(workflow.clone(), params, None);
            let result = runner.run(&workflow_def, ctx, dry_run).await?;
            println!("{}: {}", result.run_id, result.status);
            Ok(())
        }
        ValidatedCommand::Serve => {
            let facade = Arc::new(SchedulerFacade::new(dispatcher, app_config.scheduler.clone()));
            let shutdown = signals::install();
            tracing::info!(poll_interval_seconds = app_config.scheduler.poll_interval_seconds, "scheduler facade serving");
            facade.run_until(shutdown).await;
            tracing::info!("scheduler facade stopped");
            Ok(())
        }
    }
}
