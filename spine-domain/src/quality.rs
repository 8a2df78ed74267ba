// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Quality Runner — Declarative Checks Over In-Memory Inputs
//!
//! A [`QualityCheck`] is a name, category, and a closure over an in-memory
//! context; [`QualityRunner::run_all`] evaluates every registered check and
//! records a [`QualityResult`] per check. A check function panicking or
//! returning an error never aborts the run — it is captured and recorded as
//! an `ERROR`-status result instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of a single quality check.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityStatus {
    Pass,
    Warn,
    Fail,
    /// The check function itself failed (panicked or returned `Err`); this
    /// is distinct from a deliberate `Fail` verdict.
    Error,
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// One recorded quality outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityResult {
    pub check_name: String,
    pub category: String,
    pub status: QualityStatus,
    pub message: String,
    pub actual: Option<f64>,
    pub expected: Option<f64>,
}

/// A single declarative check: a name, a category, and a pure function from
/// an in-memory context `C` to a [`QualityResult`] (minus `check_name`/
/// `category`, which the runner fills in).
pub struct QualityCheck<C> {
    pub name: String,
    pub category: String,
    check_fn: Box<dyn Fn(&C) -> CheckOutcome + Send + Sync>,
}

/// What a check function returns: a verdict plus the actual/expected values
/// used to compute it.
pub struct CheckOutcome {
    pub status: QualityStatus,
    pub message: String,
    pub actual: Option<f64>,
    pub expected: Option<f64>,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>, actual: f64, expected: f64) -> Self {
        Self {
            status: QualityStatus::Pass,
            message: message.into(),
            actual: Some(actual),
            expected: Some(expected),
        }
    }

    pub fn fail(message: impl Into<String>, actual: f64, expected: f64) -> Self {
        Self {
            status: QualityStatus::Fail,
            message: message.into(),
            actual: Some(actual),
            expected: Some(expected),
        }
    }

    pub fn warn(message: impl Into<String>, actual: f64, expected: f64) -> Self {
        Self {
            status: QualityStatus::Warn,
            message: message.into(),
            actual: Some(actual),
            expected: Some(expected),
        }
    }
}

impl<C> QualityCheck<C> {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        check_fn: impl Fn(&C) -> CheckOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            check_fn: Box::new(check_fn),
        }
    }
}

/// Runs a registered set of [`QualityCheck`]s against one in-memory context
/// and accumulates [`QualityResult`]s.
#[derive(Default)]
pub struct QualityRunner {
    results: Vec<QualityResult>,
}

impl QualityRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates every check in `checks` against `ctx`, recording a result
    /// for each. A check that panics is caught and recorded as `ERROR`
    /// rather than propagating.
    pub fn run_all<C>(&mut self, checks: &[QualityCheck<C>], ctx: &C) {
        for check in checks {
            let outcome = catch_unwind(AssertUnwindSafe(|| (check.check_fn)(ctx)));
            let result = match outcome {
                Ok(outcome) => QualityResult {
                    check_name: check.name.clone(),
                    category: check.category.clone(),
                    status: outcome.status,
                    message: outcome.message,
                    actual: outcome.actual,
                    expected: outcome.expected,
                },
                Err(_) => QualityResult {
                    check_name: check.name.clone(),
                    category: check.category.clone(),
                    status: QualityStatus::Error,
                    message: "quality check function panicked".to_string(),
                    actual: None,
                    expected: None,
                },
            };
            self.results.push(result);
        }
    }

    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| matches!(r.status, QualityStatus::Fail | QualityStatus::Error))
    }

    pub fn failures(&self) -> Vec<&QualityResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, QualityStatus::Fail | QualityStatus::Error))
            .collect()
    }

    pub fn results(&self) -> &[QualityResult] {
        &self.results
    }
}
