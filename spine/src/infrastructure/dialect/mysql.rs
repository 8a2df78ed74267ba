// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! MySQL dialect: `?` placeholders, `INSERT ... ON DUPLICATE KEY UPDATE`
//! (MySQL lacks `ON CONFLICT`), `JSON_SET`.

use spine_domain::dialect::{Dialect, IntervalDirection, IntervalUnit};

#[derive(Debug)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn placeholder(&self, _i: usize) -> String {
        "?".to_string()
    }

    fn now(&self) -> String {
        "NOW()".to_string()
    }

    fn interval(&self, direction: IntervalDirection, value: i64, unit: IntervalUnit) -> String {
        let op = match direction {
            IntervalDirection::Add => "+",
            IntervalDirection::Subtract => "-",
        };
        format!("{} {op} INTERVAL {value} {unit}", self.now())
    }

    fn insert_or_ignore(&self, table: &str, cols: &[&str]) -> String {
        format!(
            "INSERT IGNORE INTO {table} ({}) VALUES ({})",
            cols.join(", "),
            self.placeholders(cols.len())
        )
    }

    fn upsert(&self, table: &str, cols: &[&str], _pk_cols: &[&str], update_cols: &[&str]) -> String {
        let set_clause = update_cols
            .iter()
            .map(|c| format!("{c} = VALUES({c})"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {table} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {set_clause}",
            cols.join(", "),
            self.placeholders(cols.len())
        )
    }

    fn json_set(&self, col: &str, path: &str, value: &str) -> String {
        format!("JSON_SET({col}, '$.{path}', {value})")
    }

    fn auto_increment(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn boolean_true(&self) -> &'static str {
        "TRUE"
    }

    fn boolean_false(&self) -> &'static str {
        "FALSE"
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!(
            "SELECT 1 FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = '{table}'"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_ignores_pk_cols_and_uses_values_function() {
        let d = MySqlDialect;
        let sql = d.upsert("core_manifest", &["domain", "rank"], &["domain"], &["rank"]);
        assert!(sql.contains("ON DUPLICATE KEY UPDATE rank = VALUES(rank)"));
    }
}
