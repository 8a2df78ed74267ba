// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Oracle dialect: `:n` placeholders, `MERGE` for upsert, `JSON_MERGEPATCH`.

use spine_domain::dialect::{Dialect, IntervalDirection, IntervalUnit};

#[derive(Debug)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn placeholder(&self, i: usize) -> String {
        format!(":{}", i + 1)
    }

    fn now(&self) -> String {
        "SYSTIMESTAMP".to_string()
    }

    fn interval(&self, direction: IntervalDirection, value: i64, unit: IntervalUnit) -> String {
        let op = match direction {
            IntervalDirection::Add => "+",
            IntervalDirection::Subtract => "-",
        };
        format!("{} {op} INTERVAL '{value}' {unit}", self.now())
    }

    fn insert_or_ignore(&self, table: &str, cols: &[&str]) -> String {
        format!(
            "INSERT /*+ IGNORE_ROW_ON_DUPKEY_INDEX({table}) */ INTO {table} ({}) VALUES ({})",
            cols.join(", "),
            self.placeholders(cols.len())
        )
    }

    fn upsert(&self, table: &str, cols: &[&str], pk_cols: &[&str], update_cols: &[&str]) -> String {
        let on_clause = pk_cols.iter().map(|c| format!("t.{c} = s.{c}")).collect::<Vec<_>>().join(" AND ");
        let set_clause = update_cols.iter().map(|c| format!("t.{c} = s.{c}")).collect::<Vec<_>>().join(", ");
        format!(
            "MERGE INTO {table} t USING (SELECT {} FROM dual) s ON ({on_clause}) \
             WHEN MATCHED THEN UPDATE SET {set_clause} \
             WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
            cols.iter().zip(0..).map(|(c, i)| format!("{} AS {c}", self.placeholder(i))).collect::<Vec<_>>().join(", "),
            cols.join(", "),
            cols.iter().map(|c| format!("s.{c}")).collect::<Vec<_>>().join(", ")
        )
    }

    fn json_set(&self, col: &str, path: &str, value: &str) -> String {
        format!("JSON_MERGEPATCH({col}, '{{\"{path}\": ' || {value} || '}}')")
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
        format!("SELECT 1 FROM user_tables WHERE table_name = '{}'", table.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_use_colon_numbering() {
        let d = OracleDialect;
        assert_eq!(d.placeholder(0), ":1");
        assert_eq!(d.placeholder(2), ":3");
    }
}
