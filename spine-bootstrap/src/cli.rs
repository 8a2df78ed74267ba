// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface
//!
//! `clap` parses argv into [`Cli`]; [`validate`] then turns it into a
//! [`ValidatedCli`] with every name checked non-empty and every `--param`
//! deduplicated, the same parse-then-validate split the rest of the process
//! wiring follows for untrusted input.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use spine_domain::error::SpineError;

#[derive(Debug, Parser)]
#[command(name = "spine", version, about = "Spine execution substrate")]
pub struct Cli {
    /// Path to a config file; overrides SPINE_CONFIG_FILE for this run.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise the configured logging level to "debug" for this run.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dispatch a registered pipeline by name
    Run {
        pipeline: String,
        /// Pipeline parameter as key=value (value parsed as JSON, falling back to a string)
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, Value)>,
        /// Validate and wire the run without the pipeline's side effects
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a registered workflow by name
    Workflow {
        workflow: String,
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, Value)>,
        /// Validate and wire the run without the workflow's pipeline-step side effects
        #[arg(long)]
        dry_run: bool,
    },
    /// List the pipeline names registered in this process
    ListPipelines,
    /// List the SQL dialects available by name
    ListDialects,
    /// Apply pending database migrations and exit
    Migrate,
    /// Run the scheduler facade until a shutdown signal arrives
    Serve,
}

fn parse_key_val(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err("parameter key must not be empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// [`Cli`] after every name has been checked non-empty and `--param` entries
/// deduplicated into a map (last one wins).
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        pipeline: String,
        params: BTreeMap<String, Value>,
        dry_run: bool,
    },
    Workflow {
        workflow: String,
        params: BTreeMap<String, Value>,
        dry_run: bool,
    },
    ListPipelines,
    ListDialects,
    Migrate,
    Serve,
}

fn non_empty(name: &str, value: String) -> Result<String, SpineError> {
    if value.trim().is_empty() {
        return Err(SpineError::validation(format!("{name} must not be empty")));
    }
    Ok(value)
}

pub fn validate(cli: Cli) -> Result<ValidatedCli, SpineError> {
    let command = match cli.command {
        Commands::Run { pipeline, params, dry_run } => ValidatedCommand::Run {
            pipeline: non_empty("pipeline", pipeline)?,
            params: params.into_iter().collect(),
            dry_run,
        },
        Commands::Workflow { workflow, params, dry_run } => ValidatedCommand::Workflow {
            workflow: non_empty("workflow", workflow)?,
            params: params.into_iter().collect(),
            dry_run,
        },
        Commands::ListPipelines => ValidatedCommand::ListPipelines,
        Commands::ListDialects => ValidatedCommand::ListDialects,
        Commands::Migrate => ValidatedCommand::Migrate,
        Commands::Serve => ValidatedCommand::Serve,
    };

    Ok(ValidatedCli {
        command,
        config: cli.config,
        verbose: cli.verbose,
    })
}
