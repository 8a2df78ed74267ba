// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dialect — Vendor-Neutral SQL Fragment Emission
//!
//! A `Dialect` is a pure, side-effect-free capability set: given abstract SQL
//! needs (a placeholder, an upsert, a JSON patch), it returns the
//! vendor-correct fragment as a `String`. It never touches a connection —
//! that's the [`crate::repository::Repository`]'s job.
//!
//! Dialects are named singletons so upper layers can ask for one by backend
//! name (`"sqlite"`, `"postgresql"`, ...) without a compile-time dependency
//! on every vendor's driver.

use std::fmt;

/// A unit for [`Dialect::interval`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IntervalUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        };
        write!(f, "{s}")
    }
}

/// Direction for [`Dialect::interval`]: whether the offset is added to or
/// subtracted from `now()`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IntervalDirection {
    Add,
    Subtract,
}

/// The name a [`Dialect`] is registered under in a
/// [`crate::registry::Registry`]-shaped dialect table.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Stable backend name (`"sqlite"`, `"postgresql"`, `"mysql"`, `"db2"`,
    /// `"oracle"`).
    fn name(&self) -> &'static str;

    /// Positional placeholder for the 0-based parameter index `i`.
    fn placeholder(&self, i: usize) -> String;

    /// Comma-separated placeholders for `n` parameters starting at index 0.
    fn placeholders(&self, n: usize) -> String {
        (0..n)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// SQL expression for the current timestamp.
    fn now(&self) -> String;

    /// A complete SQL expression yielding `now() ± value unit`. The numeric
    /// value is baked into the SQL text, never bound as a parameter.
    fn interval(&self, direction: IntervalDirection, value: i64, unit: IntervalUnit) -> String;

    /// Vendor-equivalent of "insert; skip silently on conflict".
    fn insert_or_ignore(&self, table: &str, cols: &[&str]) -> String;

    /// "Insert; on conflict with `pk_cols`, update `update_cols`."
    fn upsert(&self, table: &str, cols: &[&str], pk_cols: &[&str], update_cols: &[&str]) -> String;

    /// Vendor JSON-patch expression setting `path` within `col` to `value`
    /// (a SQL expression, typically a placeholder).
    fn json_set(&self, col: &str, path: &str, value: &str) -> String;

    /// DDL fragment for an auto-incrementing identity column.
    fn auto_increment(&self) -> &'static str;

    fn boolean_true(&self) -> &'static str;
    fn boolean_false(&self) -> &'static str;

    /// Catalog query returning one row if `table` exists.
    fn table_exists_query(&self, table: &str) -> String;
}

#[cfg(test)]
pub(crate) mod test_support {
    //! A minimal reference dialect used only by domain-layer unit tests that
    //! need *some* `Dialect` without depending on the infrastructure crate.
    use super::*;

    #[derive(Debug)]
    pub struct TestDialect;

    impl Dialect for TestDialect {
        fn name(&self) -> &'static str {
            "test"
        }
        fn placeholder(&self, i: usize) -> String {
            format!("${}", i + 1)
        }
        fn now(&self) -> String {
            "CURRENT_TIMESTAMP".to_string()
        }
        fn interval(&self, direction: IntervalDirection, value: i64, unit: IntervalUnit) -> String {
            let op = match direction {
                IntervalDirection::Add => "+",
                IntervalDirection::Subtract => "-",
            };
            format!("{} {op} INTERVAL '{value} {unit}'", self.now())
        }
        fn insert_or_ignore(&self, table: &str, cols: &[&str]) -> String {
            format!(
                "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT DO NOTHING",
                cols.join(", "),
                self.placeholders(cols.len())
            )
        }
        fn upsert(&self, table: &str, cols: &[&str], pk_cols: &[&str], update_cols: &[&str]) -> String {
            let set_clause = update_cols
                .iter()
                .map(|c| format!("{c} = EXCLUDED.{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {set_clause}",
                cols.join(", "),
                self.placeholders(cols.len()),
                pk_cols.join(", ")
            )
        }
        fn json_set(&self, col: &str, path: &str, value: &str) -> String {
            format!("jsonb_set({col}, '{path}', {value})")
        }
        fn auto_increment(&self) -> &'static str {
            "SERIAL"
        }
        fn boolean_true(&self) -> &'static str {
            "TRUE"
        }
        fn boolean_false(&self) -> &'static str {
            "FALSE"
        }
        fn table_exists_query(&self, table: &str) -> String {
            format!(
                "SELECT 1 FROM information_schema.tables WHERE table_name = '{table}'"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TestDialect;
    use super::*;

    #[test]
    fn placeholders_joins_positional_markers() {
        let d = TestDialect;
        assert_eq!(d.placeholders(3), "$1, $2, $3");
    }

    #[test]
    fn upsert_sets_only_requested_columns() {
        let d = TestDialect;
        let sql = d.upsert("core_manifest", &["domain", "partition_key", "stage", "rank"], &["domain", "partition_key", "stage"], &["rank"]);
        assert!(sql.contains("ON CONFLICT (domain, partition_key, stage)"));
        assert!(sql.contains("rank = EXCLUDED.rank"));
        assert!(!sql.contains("domain = EXCLUDED.domain"));
    }
}
