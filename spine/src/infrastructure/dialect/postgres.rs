// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! PostgreSQL dialect: `$n` placeholders, native `jsonb_set`, `ON CONFLICT`.

use spine_domain::dialect::{Dialect, IntervalDirection, IntervalUnit};

#[derive(Debug)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn placeholder(&self, i: usize) -> String {
        format!("${}", i + 1)
    }

    fn now(&self) -> String {
        "now()".to_string()
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
        format!("jsonb_set({col}, '{{{path}}}', {value})")
    }

    fn auto_increment(&self) -> &'static str {
        "GENERATED ALWAYS AS IDENTITY"
    }

    fn boolean_true(&self) -> &'static str {
        "TRUE"
    }

    fn boolean_false(&self) -> &'static str {
        "FALSE"
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!("SELECT 1 FROM information_schema.tables WHERE table_name = '{table}'")
    }
}
