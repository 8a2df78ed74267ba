// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Repository — Vendor-Neutral Row/Dict Persistence
//!
//! `Repository` pairs a connection with a [`crate::dialect::Dialect`] and
//! exposes row/dict-level primitives. It never interprets the SQL it is
//! handed — upper layers build SQL only via dialect methods, then pass the
//! finished string plus bound parameters through `execute`/`query`.
//!
//! Rows come back as JSON objects rather than a vendor-specific row type,
//! so domain and application code never needs to know which driver
//! produced them.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::SpineError;

/// A single positional bind parameter. Kept intentionally small: the core
/// only ever binds primitives and JSON blobs, never vendor-specific types.
#[derive(Debug, Clone)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}
impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}
impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}
impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}
impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Json(v)
    }
}
impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Param::Null,
        }
    }
}

/// A fetched row, exposed as a JSON object keyed by column name.
pub type Row = Map<String, Value>;

/// Vendor-neutral persistence primitives. Implementations pair one logical
/// connection with one [`Dialect`]; transactions are scoped per-pipeline
/// invocation or per-workflow-step, never spanning a whole process.
#[async_trait]
pub trait Repository: Send + Sync {
    /// The paired dialect, exposed so upper layers can build SQL fragments
    /// (`repo.dialect().upsert(...)`).
    fn dialect(&self) -> &Arc<dyn Dialect>;

    /// Shorthand for `dialect().placeholders(n)`.
    fn ph(&self, n: usize) -> String {
        self.dialect().placeholders(n)
    }

    /// Executes a statement with no result rows, returning the affected row
    /// count.
    async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64, SpineError>;

    /// Executes a query, returning every matching row as a JSON object.
    async fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, SpineError>;

    /// Executes a query expected to return at most one row.
    async fn query_one(&self, sql: &str, params: &[Param]) -> Result<Option<Row>, SpineError>;

    /// Inserts a single row described as column → value.
    async fn insert(&self, table: &str, row: &Row) -> Result<(), SpineError>;

    /// Inserts many rows sharing the same column set, in one transaction.
    async fn insert_many(&self, table: &str, rows: &[Row]) -> Result<(), SpineError>;

    /// Commits the repository's current transaction, if one is open.
    async fn commit(&self) -> Result<(), SpineError>;

    /// Rolls back the repository's current transaction, if one is open.
    async fn rollback(&self) -> Result<(), SpineError>;
}
