// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Repository` port, implemented against a `sqlx::SqlitePool`.
//!
//! Rows are decoded into JSON by column type: `INTEGER` to a JSON number,
//! `REAL` to a JSON number, `BLOB` to a hex-encoded string, and `TEXT` is
//! tried as JSON first (so a column written via [`Dialect::json_set`] or a
//! plain `serde_json::to_string` round-trips as structured data) and falls
//! back to a plain JSON string otherwise.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as SqlxRow, SqlitePool, TypeInfo, ValueRef};
use std::sync::Arc;

use spine_domain::dialect::Dialect;
use spine_domain::error::SpineError;
use spine_domain::repository::{Param, Repository, Row};

use super::sqlx_err_to_spine;

/// `Repository` bound to one SQLite connection pool and dialect.
///
/// `commit`/`rollback` are no-ops: every method here runs against the pool
/// directly (`insert_many` wraps its own statements in one transaction), so
/// there is never an open transaction spanning multiple calls for them to
/// act on.
pub struct SqliteRepository {
    pool: SqlitePool,
    dialect: Arc<dyn Dialect>,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool, dialect: Arc<dyn Dialect>) -> Self {
        Self { pool, dialect }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Converts a JSON value to the narrowest `Param` variant it fits: scalars
/// bind as their native SQLite type so exact-match lookups (`WHERE col = ?`)
/// work; only objects/arrays fall back to a JSON-text blob.
fn value_to_param(v: &Value) -> Param {
    match v {
        Value::Null => Param::Null,
        Value::Bool(b) => Param::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Param::Int(i)
            } else {
                Param::Float(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => Param::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => Param::Json(v.clone()),
    }
}

fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    params: &'q [Param],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for p in params {
        query = match p {
            Param::Null => query.bind(None::<String>),
            Param::Bool(b) => query.bind(*b),
            Param::Int(i) => query.bind(*i),
            Param::Float(f) => query.bind(*f),
            Param::Text(s) => query.bind(s.as_str()),
            Param::Json(v) => query.bind(v.to_string()),
        };
    }
    query
}

fn decode_column(row: &SqliteRow, idx: usize) -> Result<Value, SpineError> {
    let raw = row.try_get_raw(idx).map_err(sqlx_err_to_spine)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => {
            let v: i64 = row.try_get(idx).map_err(sqlx_err_to_spine)?;
            Ok(Value::from(v))
        }
        "REAL" => {
            let v: f64 = row.try_get(idx).map_err(sqlx_err_to_spine)?;
            Ok(serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null))
        }
        "BLOB" => {
            let v: Vec<u8> = row.try_get(idx).map_err(sqlx_err_to_spine)?;
            Ok(Value::String(hex::encode(v)))
        }
        _ => {
            let v: String = row.try_get(idx).map_err(sqlx_err_to_spine)?;
            Ok(serde_json::from_str(&v).unwrap_or(Value::String(v)))
        }
    }
}

fn row_to_json(row: &SqliteRow) -> Result<Row, SpineError> {
    let mut map = Row::new();
    for (idx, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), decode_column(row, idx)?);
    }
    Ok(map)
}

#[async_trait]
impl Repository for SqliteRepository {
    fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64, SpineError> {
        let query = bind_params(sqlx::query(sql), params);
        let result = query.execute(&self.pool).await.map_err(sqlx_err_to_spine)?;
        Ok(result.rows_affected())
    }

    async fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>, SpineError> {
        let query = bind_params(sqlx::query(sql), params);
        let rows = query.fetch_all(&self.pool).await.map_err(sqlx_err_to_spine)?;
        rows.iter().map(row_to_json).collect()
    }

    async fn query_one(&self, sql: &str, params: &[Param]) -> Result<Option<Row>, SpineError> {
        let query = bind_params(sqlx::query(sql), params);
        let row = query.fetch_optional(&self.pool).await.map_err(sqlx_err_to_spine)?;
        row.as_ref().map(row_to_json).transpose()
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<(), SpineError> {
        let cols: Vec<&str> = row.keys().map(String::as_str).collect();
        let params: Vec<Param> = cols.iter().map(|c| value_to_param(&row[*c])).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            cols.join(", "),
            self.ph(cols.len())
        );
        self.execute(&sql, &params).await.map(|_| ())
    }

    async fn insert_many(&self, table: &str, rows: &[Row]) -> Result<(), SpineError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(sqlx_err_to_spine)?;
        for row in rows {
            let cols: Vec<&str> = row.keys().map(String::as_str).collect();
            let params: Vec<Param> = cols.iter().map(|c| value_to_param(&row[*c])).collect();
            let sql = format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                cols.join(", "),
                self.ph(cols.len())
            );
            bind_params(sqlx::query(&sql), &params)
                .execute(&mut *tx)
                .await
                .map_err(sqlx_err_to_spine)?;
        }
        tx.commit().await.map_err(sqlx_err_to_spine)
    }

    async fn commit(&self) -> Result<(), SpineError> {
        Ok(())
    }

    async fn rollback(&self) -> Result<(), SpineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dialect::SqliteDialect;
    use crate::infrastructure::repositories::schema;
    use serde_json::json;
    use tempfile::NamedTempFile;

    async fn test_repo() -> (SqliteRepository, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = schema::initialize_database(&db_url).await.unwrap();
        (SqliteRepository::new(pool, Arc::new(SqliteDialect)), temp)
    }

    #[tokio::test]
    async fn insert_then_query_round_trips_json_and_scalars() {
        let (repo, _temp) = test_repo().await;
        let mut row = Row::new();
        row.insert("execution_id".to_string(), json!("01HF0000000000000000000000"));
        row.insert("pipeline".to_string(), json!("ingest_finra_otc"));
        row.insert("params".to_string(), json!({"partition_key": "2025-12-26|OTC"}));
        row.insert("status".to_string(), json!("PENDING"));
        row.insert("started_at".to_string(), Value::Null);
        row.insert("completed_at".to_string(), Value::Null);
        row.insert("parent_execution_id".to_string(), Value::Null);
        row.insert("batch_id".to_string(), Value::Null);
        repo.insert("core_executions", &row).await.unwrap();

        let rows = repo.query("SELECT * FROM core_executions", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["pipeline"], json!("ingest_finra_otc"));
        assert_eq!(rows[0]["params"]["partition_key"], json!("2025-12-26|OTC"));
        assert_eq!(rows[0]["started_at"], Value::Null);
    }

    #[tokio::test]
    async fn query_one_returns_none_on_no_match() {
        let (repo, _temp) = test_repo().await;
        let found = repo
            .query_one(
                "SELECT * FROM core_executions WHERE execution_id = ?",
                &[Param::from("missing")],
            )
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn insert_many_is_transactional() {
        let (repo, _temp) = test_repo().await;
        let mut row = Row::new();
        row.insert("anomaly_id".to_string(), json!("01HF0000000000000000000001"));
        row.insert("domain".to_string(), json!("finra.otc"));
        row.insert("stage".to_string(), json!("AGGREGATED"));
        row.insert("partition_key".to_string(), json!("2025-12-26|OTC"));
        row.insert("severity".to_string(), json!("ERROR"));
        row.insert("category".to_string(), json!("QUALITY_GATE"));
        row.insert("message".to_string(), json!("shares do not sum to one"));
        row.insert("detected_at".to_string(), json!("2025-12-26T00:00:00Z"));
        row.insert("metadata".to_string(), Value::Null);
        row.insert("resolved_at".to_string(), Value::Null);

        repo.insert_many("core_anomalies", std::slice::from_ref(&row)).await.unwrap();
        let rows = repo.query("SELECT * FROM core_anomalies", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
