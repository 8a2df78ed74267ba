// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `AnomalySink` over `core_anomalies`. Anomalies are append-only plus
//! resolution — `record` always inserts, `resolve` only ever sets
//! `resolved_at`, never deletes a row.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use spine_domain::anomaly::{AnomalyRow, AnomalySink, Category, Severity};
use spine_domain::error::SpineError;
use spine_domain::ids::{AnomalyId, PartitionKey};
use spine_domain::repository::{Param, Repository};

use super::row_ext::{get_datetime, get_opt_datetime, get_str};

pub struct SqliteAnomalySink {
    repo: Arc<dyn Repository>,
}

impl SqliteAnomalySink {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}

fn severity_of(raw: &str) -> Result<Severity, SpineError> {
    match raw {
        "DEBUG" => Ok(Severity::Debug),
        "INFO" => Ok(Severity::Info),
        "WARN" => Ok(Severity::Warn),
        "ERROR" => Ok(Severity::Error),
        "CRITICAL" => Ok(Severity::Critical),
        other => Err(SpineError::storage(format!("unknown severity in core_anomalies: {other}"), false)),
    }
}

fn row_to_anomaly_row(row: &spine_domain::repository::Row) -> Result<AnomalyRow, SpineError> {
    Ok(AnomalyRow {
        anomaly_id: AnomalyId::parse(&get_str(row, "anomaly_id")?)?,
        domain: get_str(row, "domain")?,
        stage: get_str(row, "stage")?,
        partition_key: PartitionKey::new(get_str(row, "partition_key")?)?,
        severity: severity_of(&get_str(row, "severity")?)?,
        category: get_str(row, "category")?,
        message: get_str(row, "message")?,
        detected_at: get_datetime(row, "detected_at")?,
        metadata: row.get("metadata").cloned().filter(|v| !v.is_null()),
        resolved_at: get_opt_datetime(row, "resolved_at"),
    })
}

#[async_trait]
impl AnomalySink for SqliteAnomalySink {
    async fn record(
        &self,
        domain: &str,
        stage: &str,
        partition_key: &PartitionKey,
        severity: Severity,
        category: Category,
        message: &str,
        metadata: Option<Value>,
    ) -> Result<AnomalyId, SpineError> {
        let anomaly_id = AnomalyId::new();
        let mut row = spine_domain::repository::Row::new();
        row.insert("anomaly_id".to_string(), Value::String(anomaly_id.to_string()));
        row.insert("domain".to_string(), Value::String(domain.to_string()));
        row.insert("stage".to_string(), Value::String(stage.to_string()));
        row.insert("partition_key".to_string(), Value::String(partition_key.as_str().to_string()));
        row.insert("severity".to_string(), Value::String(severity.to_string()));
        row.insert("category".to_string(), Value::String(category));
        row.insert("message".to_string(), Value::String(message.to_string()));
        row.insert("detected_at".to_string(), Value::String(chrono::Utc::now().to_rfc3339()));
        row.insert("metadata".to_string(), metadata.unwrap_or(Value::Null));
        row.insert("resolved_at".to_string(), Value::Null);
        self.repo.insert("core_anomalies", &row).await?;
        Ok(anomaly_id)
    }

    async fn resolve(&self, anomaly_id: &AnomalyId) -> Result<(), SpineError> {
        let affected = self
            .repo
            .execute(
                "UPDATE core_anomalies SET resolved_at = ? WHERE anomaly_id = ?",
                &[Param::from(chrono::Utc::now().to_rfc3339()), Param::from(anomaly_id.to_string())],
            )
            .await?;
        if affected == 0 {
            return Err(SpineError::storage(format!("unknown anomaly_id: {anomaly_id}"), false));
        }
        Ok(())
    }

    async fn for_partition(
        &self,
        domain: &str,
        stage: &str,
        partition_key: &PartitionKey,
    ) -> Result<Vec<AnomalyRow>, SpineError> {
        let sql = "SELECT * FROM core_anomalies WHERE domain = ? AND stage = ? AND partition_key = ? \
                    ORDER BY detected_at";
        let params = vec![
            Param::from(domain.to_string()),
            Param::from(stage.to_string()),
            Param::from(partition_key.as_str().to_string()),
        ];
        let rows = self.repo.query(sql, &params).await?;
        rows.iter().map(row_to_anomaly_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dialect::SqliteDialect;
    use crate::infrastructure::repositories::{schema, SqliteRepository};
    use spine_domain::anomaly::CATEGORY_QUALITY_GATE;
    use tempfile::NamedTempFile;

    async fn sink() -> (SqliteAnomalySink, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = schema::initialize_database(&db_url).await.unwrap();
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool, Arc::new(SqliteDialect)));
        (SqliteAnomalySink::new(repo), temp)
    }

    #[tokio::test]
    async fn record_then_resolve_marks_inactive() {
        let (sink, _temp) = sink().await;
        let partition = PartitionKey::new("2025-12-26|OTC").unwrap();
        let id = sink
            .record(
                "finra.otc",
                "AGGREGATED",
                &partition,
                Severity::Error,
                CATEGORY_QUALITY_GATE.to_string(),
                "shares do not sum to one",
                None,
            )
            .await
            .unwrap();

        let active = sink
            .active_in_scope("finra.otc", "AGGREGATED", &partition, Severity::Warn)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        sink.resolve(&id).await.unwrap();
        let active = sink
            .active_in_scope("finra.otc", "AGGREGATED", &partition, Severity::Warn)
            .await
            .unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn resolving_unknown_id_is_an_error() {
        let (sink, _temp) = sink().await;
        assert!(sink.resolve(&AnomalyId::new()).await.is_err());
    }
}
