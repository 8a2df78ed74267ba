// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! IBM Db2 dialect: `?` placeholders, `MERGE` for upsert (Db2 has no
//! `ON CONFLICT`/`ON DUPLICATE KEY`), no native JSON function so `json_set`
//! is emitted as a documented no-op placeholder requiring an application-side
//! merge — Db2 JSON support varies too widely across editions to target one
//! function here.

use spine_domain::dialect::{Dialect, IntervalDirection, IntervalUnit};

#[derive(Debug)]
pub struct Db2Dialect;

impl Dialect for Db2Dialect {
    fn name(&self) -> &'static str {
        "db2"
    }

    fn placeholder(&self, _i: usize) -> String {
        "?".to_string()
    }

    fn now(&self) -> String {
        "CURRENT TIMESTAMP".to_string()
    }

    fn interval(&self, direction: IntervalDirection, value: i64, unit: IntervalUnit) -> String {
        let op = match direction {
            IntervalDirection::Add => "+",
            IntervalDirection::Subtract => "-",
        };
        format!("{} {op} {value} {unit}S", self.now())
    }

    fn insert_or_ignore(&self, table: &str, cols: &[&str]) -> String {
        format!(
            "MERGE INTO {table} AS t USING (VALUES ({})) AS s ({}) ON 1 = 0 WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
            self.placeholders(cols.len()),
            cols.join(", "),
            cols.join(", "),
            cols.iter().map(|c| format!("s.{c}")).collect::<Vec<_>>().join(", ")
        )
    }

    fn upsert(&self, table: &str, cols: &[&str], pk_cols: &[&str], update_cols: &[&str]) -> String {
        let on_clause = pk_cols.iter().map(|c| format!("t.{c} = s.{c}")).collect::<Vec<_>>().join(" AND ");
        let set_clause = update_cols.iter().map(|c| format!("t.{c} = s.{c}")).collect::<Vec<_>>().join(", ");
        format!(
            "MERGE INTO {table} AS t USING (VALUES ({})) AS s ({}) ON {on_clause} \
             WHEN MATCHED THEN UPDATE SET {set_clause} \
             WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
            self.placeholders(cols.len()),
            cols.join(", "),
            cols.join(", "),
            cols.iter().map(|c| format!("s.{c}")).collect::<Vec<_>>().join(", ")
        )
    }

    fn json_set(&self, col: &str, _path: &str, value: &str) -> String {
        // No single Db2 JSON function is portable across supported editions;
        // callers replace the whole column instead of patching a path.
        format!("{value} /* replaces {col} wholesale, Db2 has no portable JSON patch */")
    }

    fn auto_increment(&self) -> &'static str {
        "GENERATED ALWAYS AS IDENTITY"
    }

    fn boolean_true(&self) -> &'static str {
        "1"
    }

    fn boolean_false(&self) -> &'static str {
        "0"
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!("SELECT 1 FROM syscat.tables WHERE tabname = '{}'", table.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_emits_merge_statement() {
        let d = Db2Dialect;
        let sql = d.upsert("core_manifest", &["domain", "rank"], &["domain"], &["rank"]);
        assert!(sql.starts_with("MERGE INTO core_manifest"));
        assert!(sql.contains("WHEN MATCHED THEN UPDATE SET t.rank = s.rank"));
    }
}
