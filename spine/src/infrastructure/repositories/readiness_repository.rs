// /////////////////////////////////////////////////////////////////////////////
// Spine
// Copyright (c) 2026 Spine Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence for `core_data_readiness`, the one-glance downstream gate a
//! caller checks instead of re-deriving readiness from the manifest and
//! anomaly tables itself.

use serde_json::Value;
use std::sync::Arc;

use spine_domain::error::SpineError;
use spine_domain::ids::PartitionKey;
use spine_domain::readiness::DataReadiness;
use spine_domain::repository::{Param, Repository};

use super::row_ext::{get_datetime, get_str};

const COLS: &[&str] = &["domain", "stage", "partition_key", "is_ready", "blocking_issues", "checked_at"];
const PK_COLS: &[&str] = &["domain", "stage", "partition_key"];
const UPDATE_COLS: &[&str] = &["is_ready", "blocking_issues", "checked_at"];

pub struct ReadinessRepository {
    repo: Arc<dyn Repository>,
}

impl ReadinessRepository {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Upserts the `(domain, stage, partition_key)` readiness row.
    pub async fn record(&self, readiness: &DataReadiness) -> Result<(), SpineError> {
        let sql = self.repo.dialect().upsert("core_data_readiness", COLS, PK_COLS, UPDATE_COLS);
        let params = vec![
            Param::from(readiness.domain.clone()),
            Param::from(readiness.stage.clone()),
            Param::from(readiness.partition_key.as_str().to_string()),
            Param::from(readiness.is_ready),
            Param::Json(Value::Array(readiness.blocking_issues.iter().cloned().map(Value::String).collect())),
            Param::from(readiness.checked_at.to_rfc3339()),
        ];
        self.repo.execute(&sql, &params).await.map(|_| ())
    }

    pub async fn get(&self, domain: &str, stage: &str, partition_key: &PartitionKey) -> Result<Option<DataReadiness>, SpineError> {
        let row = self
            .repo
            .query_one(
                "SELECT * FROM core_data_readiness WHERE domain = ? AND stage = ? AND partition_key = ?",
                &[
                    Param::from(domain.to_string()),
                    Param::from(stage.to_string()),
                    Param::from(partition_key.as_str().to_string()),
                ],
            )
            .await?;
        row.as_ref().map(row_to_readiness).transpose()
    }
}

fn row_to_readiness(row: &spine_domain::repository::Row) -> Result<DataReadiness, SpineError> {
    let blocking_issues = match row.get("blocking_issues").cloned().unwrap_or(Value::Null) {
        Value::Array(items) => items.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        Value::String(s) => serde_json::from_str(&s).unwrap_or_default(),
        _ => Vec::new(),
    };
    Ok(DataReadiness {
        domain: get_str(row, "domain")?,
        stage: get_str(row, "stage")?,
        partition_key: PartitionKey::new(get_str(row, "partition_key")?)?,
        is_ready: row.get("is_ready").and_then(Value::as_i64).map(|v| v != 0).unwrap_or(false),
        blocking_issues,
        checked_at: get_datetime(row, "checked_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dialect::SqliteDialect;
    use crate::infrastructure::repositories::{schema, SqliteRepository};
    use tempfile::NamedTempFile;

    async fn repo() -> (ReadinessRepository, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = schema::initialize_database(&db_url).await.unwrap();
        let r: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool, Arc::new(SqliteDialect)));
        (ReadinessRepository::new(r), temp)
    }

    #[tokio::test]
    async fn record_then_get_round_trips() {
        let (repo, _temp) = repo().await;
        let partition = PartitionKey::new("2025-12-26|OTC").unwrap();
        let readiness = DataReadiness::compute("finra.otc", "AGGREGATED", &partition, true, &[]);
        repo.record(&readiness).await.unwrap();

        let fetched = repo.get("finra.otc", "AGGREGATED", &partition).await.unwrap().unwrap();
        assert!(fetched.is_ready);
        assert!(fetched.blocking_issues.is_empty());
    }

    #[tokio::test]
    async fn record_is_idempotent_and_updates_in_place() {
        let (repo, _temp) = repo().await;
        let partition = PartitionKey::new("2025-12-26|OTC").unwrap();
        let not_ready = DataReadiness::compute("finra.otc", "AGGREGATED", &partition, false, &[]);
        repo.record(&not_ready).await.unwrap();
        let ready = DataReadiness::compute("finra.otc", "AGGREGATED", &partition, true, &[]);
        repo.record(&ready).await.unwrap();

        let fetched = repo.get("finra.otc", "AGGREGATED", &partition).await.unwrap().unwrap();
        assert!(fetched.is_ready);
    }
}
