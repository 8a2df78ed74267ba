// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `RejectSink` over `core_rejects`, the per-record validation failure log.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use spine_domain::error::SpineError;
use spine_domain::ids::PartitionKey;
use spine_domain::reject::{RejectRow, RejectSink};
use spine_domain::repository::{Param, Repository, Row};

use super::row_ext::{get_datetime, get_opt_str, get_str};

pub struct SqliteRejectSink {
    repo: Arc<dyn Repository>,
}

impl SqliteRejectSink {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}

fn row_to_reject_row(row: &Row) -> Result<RejectRow, SpineError> {
    Ok(RejectRow {
        stage: get_str(row, "stage")?,
        reason_code: get_str(row, "reason_code")?,
        reason_detail: get_str(row, "reason_detail")?,
        raw_data: row.get("raw_data").cloned().unwrap_or(Value::Null),
        partition_key: PartitionKey::new(get_str(row, "partition_key")?)?,
        execution_id: get_opt_str(row, "execution_id"),
        batch_id: get_opt_str(row, "batch_id"),
        captured_at: get_datetime(row, "captured_at")?,
    })
}

#[async_trait]
impl RejectSink for SqliteRejectSink {
    async fn record(&self, row: RejectRow) -> Result<(), SpineError> {
        let mut out = Row::new();
        out.insert("stage".to_string(), Value::String(row.stage));
        out.insert("reason_code".to_string(), Value::String(row.reason_code));
        out.insert("reason_detail".to_string(), Value::String(row.reason_detail));
        out.insert("raw_data".to_string(), row.raw_data);
        out.insert("partition_key".to_string(), Value::String(row.partition_key.as_str().to_string()));
        out.insert("execution_id".to_string(), row.execution_id.map(Value::String).unwrap_or(Value::Null));
        out.insert("batch_id".to_string(), row.batch_id.map(Value::String).unwrap_or(Value::Null));
        out.insert("captured_at".to_string(), Value::String(row.captured_at.to_rfc3339()));
        self.repo.insert("core_rejects", &out).await
    }

    async fn for_partition(&self, partition_key: &PartitionKey) -> Result<Vec<RejectRow>, SpineError> {
        let sql = "SELECT * FROM core_rejects WHERE partition_key = ? ORDER BY captured_at DESC";
        let rows = self
            .repo
            .query(sql, &[Param::from(partition_key.as_str().to_string())])
            .await?;
        rows.iter().map(row_to_reject_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dialect::SqliteDialect;
    use crate::infrastructure::repositories::{schema, SqliteRepository};
    use serde_json::json;
    use tempfile::NamedTempFile;

    async fn sink() -> (SqliteRejectSink, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = schema::initialize_database(&db_url).await.unwrap();
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool, Arc::new(SqliteDialect)));
        (SqliteRejectSink::new(repo), temp)
    }

    #[tokio::test]
    async fn record_and_count_for_partition() {
        let (sink, _temp) = sink().await;
        let partition = PartitionKey::new("2025-12-26|OTC").unwrap();
        sink.record(RejectRow {
            stage: "NORMALIZED".to_string(),
            reason_code: "MISSING_FIELD".to_string(),
            reason_detail: "price is null".to_string(),
            raw_data: json!({"symbol": "AAPL"}),
            partition_key: partition.clone(),
            execution_id: None,
            batch_id: None,
            captured_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

        assert_eq!(sink.count_for_partition(&partition).await.unwrap(), 1);
        let rows = sink.for_partition(&partition).await.unwrap();
        assert_eq!(rows[0].raw_data["symbol"], json!("AAPL"));
    }
}
