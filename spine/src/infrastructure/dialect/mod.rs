// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dialect Registry
//!
//! Concrete [`Dialect`] implementations, one per supported backend, plus a
//! [`DialectRegistry`] so upper layers can ask for a dialect by name without
//! a compile-time dependency on any vendor driver. Only `sqlite` is ever
//! paired with a live connection (via `SqliteRepository`); the other four
//! are pure fragment emitters, useful for generating migration text or
//! validating cross-vendor SQL without installing that vendor's client.

mod db2;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;

pub use db2::Db2Dialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use spine_domain::dialect::Dialect;
use spine_domain::error::SpineError;
use spine_domain::registry::Registry;
use std::sync::Arc;

/// Name-keyed table of [`Dialect`] singletons, pre-populated with the five
/// supported backends.
#[derive(Debug)]
pub struct DialectRegistry {
    inner: Registry<Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// Builds a registry with all five built-in dialects already registered.
    pub fn with_defaults() -> Self {
        let inner = Registry::new();
        inner.register("sqlite", Arc::new(SqliteDialect) as Arc<dyn Dialect>).expect("unique default name");
        inner.register("postgresql", Arc::new(PostgresDialect) as Arc<dyn Dialect>).expect("unique default name");
        inner.register("mysql", Arc::new(MySqlDialect) as Arc<dyn Dialect>).expect("unique default name");
        inner.register("db2", Arc::new(Db2Dialect) as Arc<dyn Dialect>).expect("unique default name");
        inner.register("oracle", Arc::new(OracleDialect) as Arc<dyn Dialect>).expect("unique default name");
        Self { inner }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Dialect>, SpineError> {
        self.inner.get(name)
    }

    pub fn list(&self) -> Vec<String> {
        self.inner.list()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
