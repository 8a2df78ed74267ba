// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite dialect: `?`-style positional placeholders, `json_set`, and the
//! dialect paired with the only live [`crate::infrastructure::repositories::SqliteRepository`].

use spine_domain::dialect::{Dialect, IntervalDirection, IntervalUnit};

#[derive(Debug)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _i: usize) -> String {
        "?".to_string()
    }

    fn now(&self) -> String {
        "CURRENT_TIMESTAMP".to_string()
    }

    fn interval(&self, direction: IntervalDirection, value: i64, unit: IntervalUnit) -> String {
        let signed = match direction {
            IntervalDirection::Add => value,
            IntervalDirection::Subtract => -value,
        };
        format!("datetime('now', '{signed} {unit}')")
    }

    fn insert_or_ignore(&self, table: &str, cols: &[&str]) -> String {
        format!(
            "INSERT OR IGNORE INTO {table} ({}) VALUES ({})",
            cols.join(", "),
            self.placeholders(cols.len())
        )
    }

    fn upsert(&self, table: &str, cols: &[&str], pk_cols: &[&str], update_cols: &[&str]) -> String {
        let set_clause = update_cols
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
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
        format!("json_set({col}, '{path}', {value})")
    }

    fn auto_increment(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn boolean_true(&self) -> &'static str {
        "1"
    }

    fn boolean_false(&self) -> &'static str {
        "0"
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '{table}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_plain_question_marks() {
        let d = SqliteDialect;
        assert_eq!(d.placeholders(3), "?, ?, ?");
    }

    #[test]
    fn interval_subtracts_with_negative_sign() {
        let d = SqliteDialect;
        assert_eq!(d.interval(IntervalDirection::Subtract, 7, IntervalUnit::Day), "datetime('now', '-7 day')");
    }
}
